// ABOUTME: Configuration types and parsing for launcher.yml.
// ABOUTME: Handles YAML parsing, file discovery, defaults, and home expansion.

use crate::error::{Error, Result};
use crate::runtime::{RuntimeConfig, RuntimeType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "launcher.yml";
pub const CONFIG_FILENAME_ALT: &str = "launcher.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".datalab/launcher.yml";
pub const USER_CONFIG_DIR: &str = "datalab-launcher";

/// Launcher settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root of the per-container content and shared notebooks directories.
    #[serde(deserialize_with = "deserialize_path")]
    pub local_drive: PathBuf,

    /// Shared directory holding the most recent recipe.
    #[serde(deserialize_with = "deserialize_path")]
    pub latest_dockerfile: PathBuf,

    /// Directory holding the last recipe that was built on this machine.
    #[serde(
        default = "default_local_dockerfile",
        deserialize_with = "deserialize_path"
    )]
    pub local_dockerfile: PathBuf,

    /// Metadata store file.
    #[serde(
        default = "default_containers_log",
        deserialize_with = "deserialize_path"
    )]
    pub containers_log: PathBuf,

    #[serde(default)]
    pub drives: Vec<DriveDescriptor>,

    #[serde(default = "default_client_timeout", with = "humantime_serde")]
    pub docker_client_timeout: Duration,

    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    #[serde(default = "default_local_port")]
    pub local_port: u16,

    /// Seconds to wait before handing out a container's address.
    #[serde(default = "default_opening_countdown")]
    pub opening_countdown: u32,

    #[serde(default)]
    pub runtime: Option<RuntimeType>,

    #[serde(default)]
    pub socket: Option<String>,

    #[serde(
        default = "default_log_file",
        deserialize_with = "deserialize_path"
    )]
    pub log_file: PathBuf,
}

/// A host directory exposed to every container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DriveDescriptor {
    #[serde(alias = "Path", deserialize_with = "deserialize_path")]
    pub path: PathBuf,
    #[serde(alias = "Mountpoint")]
    pub mountpoint: String,
    #[serde(alias = "Access", default)]
    pub access: Access,
}

/// Mount mode of a bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Ro,
    Rw,
}

impl Access {
    pub fn is_read_only(self) -> bool {
        self == Access::Ro
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Ro => write!(f, "ro"),
            Access::Rw => write!(f, "rw"),
        }
    }
}

fn default_local_dockerfile() -> PathBuf {
    PathBuf::from("dockerfile")
}

fn default_containers_log() -> PathBuf {
    PathBuf::from("containers.json")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("launcher.log")
}

fn default_client_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_local_port() -> u16 {
    8081
}

fn default_opening_countdown() -> u32 {
    3
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("loaded settings from {}", path.display());
        Self::from_yaml(&content)
    }

    /// Find and load the settings file.
    ///
    /// An explicit path must exist. Otherwise `dir` is searched for
    /// `launcher.yml`, `launcher.yaml` and `.datalab/launcher.yml`, then the
    /// user config directory.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            return Self::load(path);
        }

        let mut candidates = vec![
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];
        if let Some(user_dir) = dirs::config_dir() {
            candidates.push(user_dir.join(USER_CONFIG_DIR).join(CONFIG_FILENAME));
        }

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        if self.local_port == 0 {
            return Err(Error::InvalidConfig("local_port must be non-zero".into()));
        }
        for drive in &self.drives {
            if !drive.mountpoint.starts_with('/') {
                return Err(Error::InvalidConfig(format!(
                    "drive mountpoint must be absolute: {}",
                    drive.mountpoint
                )));
            }
        }
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            runtime: self.runtime,
            socket: self.socket.clone(),
        }
    }

    /// Path of the shared recipe.
    pub fn latest_recipe(&self) -> PathBuf {
        self.latest_dockerfile.join(crate::image::RECIPE_FILE)
    }

    /// Path of the locally cached recipe.
    pub fn local_recipe(&self) -> PathBuf {
        self.local_dockerfile.join(crate::image::RECIPE_FILE)
    }
}

/// Write a settings template into `dir`.
pub fn init_config(dir: &Path, local_drive: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let local_drive = local_drive.unwrap_or("~/datalab");
    std::fs::write(&config_path, template_yaml(local_drive))?;

    Ok(config_path)
}

fn template_yaml(local_drive: &str) -> String {
    format!(
        r#"local_drive: {local_drive}
latest_dockerfile: /mnt/shared/datalab/
local_dockerfile: {local_drive}/dockerfile/
containers_log: {local_drive}/containers.json
docker_client_timeout: 120s
stop_timeout: 10s
local_port: 8081
drives: []
#  - path: /mnt/shared/data
#    mountpoint: /content/datalab/shared
#    access: ro
"#
    )
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

fn deserialize_path<'de, D>(deserializer: D) -> std::result::Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.trim().is_empty() {
        return Err(serde::de::Error::custom("path cannot be empty"));
    }
    Ok(expand_home(&s))
}
