// ABOUTME: Reachability capability of a runtime: ping and version info.
// ABOUTME: A failed ping is what makes the runtime count as unavailable.

use super::sealed::Sealed;
use super::shared_types::RuntimeMetadata;
use async_trait::async_trait;

#[async_trait]
pub trait RuntimeInfo: Sealed + Send + Sync {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError>;

    async fn ping(&self) -> Result<(), RuntimeInfoError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeInfoError {
    /// No client could be built for the socket.
    #[error("cannot open runtime socket: {0}")]
    Client(String),

    /// The socket exists but the daemon did not answer.
    #[error("runtime not answering: {0}")]
    Unreachable(String),
}
