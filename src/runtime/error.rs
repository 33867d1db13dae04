// ABOUTME: Runtime error types with SNAFU pattern.
// ABOUTME: Unifies detection and connection errors into "runtime unavailable".

use snafu::Snafu;

use super::detection::DetectionError;
use super::traits::RuntimeInfoError;

/// The runtime could not be reached. Fatal at startup.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("runtime connection failed: {source}"))]
    Connection { source: RuntimeInfoError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// No container runtime found on the system.
    NoRuntimeFound,
    /// A socket was found but no client could be built for it.
    BadSocket,
    /// The daemon behind the socket did not answer.
    Unreachable,
}

impl RuntimeErrorKind {
    /// What the user can do about it.
    pub fn hint(self) -> &'static str {
        match self {
            RuntimeErrorKind::NoRuntimeFound => {
                "install Docker or Podman, or set `socket` in launcher.yml"
            }
            RuntimeErrorKind::BadSocket => "check the `socket` setting in launcher.yml",
            RuntimeErrorKind::Unreachable => "start the Docker or Podman daemon and retry",
        }
    }
}

impl RuntimeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Detection { .. } => RuntimeErrorKind::NoRuntimeFound,
            RuntimeError::Connection { source } => match source {
                RuntimeInfoError::Client(_) => RuntimeErrorKind::BadSocket,
                RuntimeInfoError::Unreachable(_) => RuntimeErrorKind::Unreachable,
            },
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

impl From<RuntimeInfoError> for RuntimeError {
    fn from(source: RuntimeInfoError) -> Self {
        RuntimeError::Connection { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classifies_sources() {
        let err = RuntimeError::from(DetectionError::NoRuntimeFound);
        assert_eq!(err.kind(), RuntimeErrorKind::NoRuntimeFound);

        let err = RuntimeError::from(RuntimeInfoError::Unreachable("refused".into()));
        assert_eq!(err.kind(), RuntimeErrorKind::Unreachable);
        assert!(err.to_string().contains("refused"));

        let err = RuntimeError::from(RuntimeInfoError::Client("bad path".into()));
        assert_eq!(err.kind(), RuntimeErrorKind::BadSocket);
        assert!(err.kind().hint().contains("socket"));
    }
}
