// ABOUTME: Container capability of a runtime: the calls behind every lifecycle transition.
// ABOUTME: Also the list filter and summary row the inspector builds handles from.

use super::sealed::Sealed;
use super::shared_types::{ContainerConfig, ContainerInfo, ContainerState};
use crate::types::ContainerId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError>;

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// The runtime kills the container once `grace` has passed.
    async fn stop_container(&self, id: &ContainerId, grace: Duration)
    -> Result<(), ContainerError>;

    /// `force` also removes a running container.
    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError>;

    /// `id` may also be a container name.
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError>;

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;
}

/// Server-side list filter. Every label pair must match.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    pub labels: HashMap<String, String>,
    /// Substring match on the container name.
    pub name: Option<String>,
    /// Include containers that are not running.
    pub all: bool,
}

impl ContainerFilters {
    /// Every container, running or not, carrying `key=value`.
    pub fn labelled(key: &str, value: &str) -> Self {
        Self {
            labels: HashMap::from([(key.to_string(), value.to_string())]),
            name: None,
            all: true,
        }
    }
}

/// One row of a container listing.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    /// Runtime status line, e.g. "Up 2 hours".
    pub status: String,
    pub labels: HashMap<String, String>,
}

impl ContainerSummary {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("no such container: {0}")]
    NotFound(String),

    #[error("container name already in use: {0}")]
    NameInUse(String),

    #[error("container already in the requested state: {0}")]
    Unchanged(String),

    #[error("container is running: {0}")]
    Running(String),

    #[error("image missing, build it first: {0}")]
    ImageMissing(String),

    #[error("runtime rejected container config: {0}")]
    Rejected(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
