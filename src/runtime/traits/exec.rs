// ABOUTME: Exec capability of a runtime: run a command inside a running container.
// ABOUTME: Used to read a container's live environment.

use super::sealed::Sealed;
use super::shared_types::{ExecConfig, ExecResult};
use crate::types::{ContainerId, ExecId};
use async_trait::async_trait;

#[async_trait]
pub trait ExecOps: Sealed + Send + Sync {
    /// Create, start and wait. The exit code is returned, not judged.
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError> {
        let exec_id = self.exec_create(container, config).await?;
        self.exec_start(&exec_id).await
    }

    async fn exec_create(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError>;

    /// Runs attached and collects output until the command exits.
    async fn exec_start(&self, exec_id: &ExecId) -> Result<ExecResult, ExecError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("container not running: {0}")]
    ContainerNotRunning(String),

    #[error("exec instance vanished: {0}")]
    ExecNotFound(String),

    #[error("command exited with code {0}")]
    NonZeroExit(i64),

    #[error("exec output stream broke: {0}")]
    Failed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
