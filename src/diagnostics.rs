// ABOUTME: Diagnostics accumulator for non-fatal warnings during startup checks.
// ABOUTME: Collects warnings that don't stop the launcher but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during startup.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// The shared recipe or some drives cannot be reached.
    pub fn drives(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Drives,
            message: message.into(),
        }
    }

    /// A recipe source failed and the next one was used.
    pub fn fallback(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Fallback,
            message: message.into(),
        }
    }

    /// A newer shared recipe exists.
    pub fn update_available(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UpdateAvailable,
            message: message.into(),
        }
    }
}

/// Categories of startup warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// Shared drives are only partly available.
    Drives,
    /// An image recipe tier failed.
    Fallback,
    /// The cached recipe is behind the shared one.
    UpdateAvailable,
}
