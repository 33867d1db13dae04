// ABOUTME: Validated container names and the random name generator.
// ABOUTME: Names follow the runtime's [a-zA-Z0-9][a-zA-Z0-9_.-]* rule.

use rand::seq::IndexedRandom;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerNameError {
    #[error("container name cannot be empty")]
    Empty,

    #[error("container name must start with a letter or digit")]
    BadFirstChar,

    #[error("invalid character in container name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn new(value: &str) -> Result<Self, ContainerNameError> {
        let mut chars = value.chars();
        let first = chars.next().ok_or(ContainerNameError::Empty)?;
        if !first.is_ascii_alphanumeric() {
            return Err(ContainerNameError::BadFirstChar);
        }
        if let Some(c) = chars.find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-'))
        {
            return Err(ContainerNameError::InvalidChar(c));
        }
        Ok(Self(value.to_string()))
    }

    /// Generate an `adjective_noun` name.
    ///
    /// Uniqueness is not checked here; the runtime rejects duplicates.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quiet");
        let noun = NOUNS.choose(&mut rng).copied().unwrap_or("lake");
        Self(format!("{adjective}_{noun}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContainerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

const ADJECTIVES: &[&str] = &[
    "autumn", "hidden", "bitter", "misty", "silent", "empty", "dry", "dark", "summer", "icy",
    "delicate", "quiet", "white", "cool", "spring", "winter", "patient", "twilight", "dawn",
    "crimson", "wispy", "weathered", "blue", "billowing", "broken", "cold", "damp", "falling",
    "frosty", "green", "long", "late", "lingering", "bold", "little", "morning", "muddy", "old",
    "red", "rough", "still", "small", "sparkling", "shy", "wandering", "withered", "wild",
    "black", "young", "holy", "solitary", "fragrant", "aged", "snowy", "proud", "floral",
    "restless", "divine", "polished", "ancient", "purple", "lively", "nameless",
];

const NOUNS: &[&str] = &[
    "waterfall", "river", "breeze", "moon", "rain", "wind", "sea", "morning", "snow", "lake",
    "sunset", "pine", "shadow", "leaf", "dawn", "glitter", "forest", "hill", "cloud", "meadow",
    "sun", "glade", "bird", "brook", "butterfly", "bush", "dew", "dust", "field", "fire",
    "flower", "firefly", "feather", "grass", "haze", "mountain", "night", "pond", "darkness",
    "snowflake", "silence", "sound", "sky", "shape", "surf", "thunder", "violet", "water",
    "wildflower", "wave", "resonance", "wood", "dream", "cherry", "tree", "fog", "frost",
    "voice", "paper", "frog", "smoke", "star",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_runtime_style_names() {
        assert!(ContainerName::new("quiet_lake").is_ok());
        assert!(ContainerName::new("lab-2.0").is_ok());
        assert!(ContainerName::new("7seas").is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        assert_eq!(ContainerName::new(""), Err(ContainerNameError::Empty));
        assert_eq!(
            ContainerName::new("_hidden"),
            Err(ContainerNameError::BadFirstChar)
        );
        assert_eq!(
            ContainerName::new("my lab"),
            Err(ContainerNameError::InvalidChar(' '))
        );
    }

    #[test]
    fn generated_names_are_two_words_joined_by_underscore() {
        for _ in 0..50 {
            let name = ContainerName::generate();
            let parts: Vec<&str> = name.as_str().split('_').collect();
            assert_eq!(parts.len(), 2, "unexpected name {name}");
            assert!(ContainerName::new(name.as_str()).is_ok());
        }
    }
}
