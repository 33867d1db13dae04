// ABOUTME: Image reference parsing for build tags and recipe base images.
// ABOUTME: Understands name, name:tag and registry/name:tag forms.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: {0}")]
    InvalidChar(char),

    #[error("image reference has an empty {0}")]
    EmptyComponent(&'static str),
}

/// A `[registry/]name[:tag]` image reference.
///
/// An untagged reference is normalised to `:latest`, matching how the
/// runtime resolves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: String,
}

impl ImageRef {
    /// Build a reference from already-valid parts.
    pub fn new(registry: Option<&str>, name: &str, tag: &str) -> Self {
        Self {
            registry: registry.map(str::to_string),
            name: name.to_string(),
            tag: tag.to_string(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(c) = input
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '/' | ':' | '.' | '-' | '_'))
        {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        // A colon after the last slash separates the tag; an earlier one is a
        // registry port.
        let last_slash = input.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (path, tag) = match input[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&input[..split], &input[split + 1..])
            }
            None => (input, "latest"),
        };
        if tag.is_empty() {
            return Err(ParseImageRefError::EmptyComponent("tag"));
        }

        let (registry, name) = match path.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), rest)
            }
            _ => (None, path),
        };
        if name.is_empty() {
            return Err(ParseImageRefError::EmptyComponent("name"));
        }

        Ok(Self {
            registry,
            name: name.to_string(),
            tag: tag.to_string(),
        })
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}:{}", self.name, self.tag)
    }
}

impl std::str::FromStr for ImageRef {
    type Err = ParseImageRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
