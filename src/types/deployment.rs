// ABOUTME: Deployment kind and host operating system enums.
// ABOUTME: Both round-trip through the strings stored in container labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Where the DataLab instance talks to: a purely local kernel or a cloud
/// gateway VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Deployment {
    #[default]
    Local,
    Cloud,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown deployment kind: {0} (expected Local or Cloud)")]
pub struct ParseDeploymentError(pub String);

impl Deployment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Deployment::Local => "Local",
            Deployment::Cloud => "Cloud",
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Deployment {
    type Err = ParseDeploymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Deployment::Local),
            "cloud" => Ok(Deployment::Cloud),
            _ => Err(ParseDeploymentError(s.to_string())),
        }
    }
}

/// Host operating system family, as far as runtime path syntax cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    Windows,
    Other,
}

impl HostOs {
    /// The OS this binary was built for.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => HostOs::Linux,
            "windows" => HostOs::Windows,
            _ => HostOs::Other,
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOs::Linux => write!(f, "Linux"),
            HostOs::Windows => write!(f, "Windows"),
            HostOs::Other => write!(f, "{}", std::env::consts::OS),
        }
    }
}
