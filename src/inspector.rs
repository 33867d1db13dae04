// ABOUTME: Read-only queries against the runtime for managed DataLab containers.
// ABOUTME: Listing by marker label, state re-reads, exec inside, image presence.

use crate::runtime::{
    ContainerError, ContainerFilters, ContainerState, ContainerSummary, ExecConfig, ExecError,
    FullRuntime, ImageError,
};
use crate::store::UNKNOWN;
use crate::types::{ContainerId, ImageRef};
use std::collections::HashMap;

pub const IMAGE_LABEL: &str = "dll_image";
pub const IMAGE_MARKER: &str = "datalab";
pub const VERSION_LABEL: &str = "dll_version";
pub const DEPLOYMENT_LABEL: &str = "dll_deployment";
pub const ADDRESS_LABEL: &str = "dll_address";
pub const MACHINE_INFO_LABEL: &str = "dll_machine_info";

/// Tag of the one image the launcher runs.
pub const IMAGE_TAG: &str = "dll_datalab:latest";

pub fn image_ref() -> ImageRef {
    ImageRef::new(None, "dll_datalab", "latest")
}

/// A managed container as last seen by the runtime.
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    pub id: ContainerId,
    pub name: String,
    pub state: ContainerState,
    labels: HashMap<String, String>,
}

impl ContainerHandle {
    pub fn new(
        id: ContainerId,
        name: impl Into<String>,
        state: ContainerState,
        labels: HashMap<String, String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            state,
            labels,
        }
    }

    /// Label value, or `"-"` when the label is missing.
    pub fn label(&self, key: &str) -> &str {
        self.labels.get(key).map(String::as_str).unwrap_or(UNKNOWN)
    }

    pub fn version(&self) -> &str {
        self.label(VERSION_LABEL)
    }

    pub fn deployment(&self) -> &str {
        self.label(DEPLOYMENT_LABEL)
    }

    pub fn address(&self) -> &str {
        self.label(ADDRESS_LABEL)
    }

    pub fn machine_info(&self) -> &str {
        self.label(MACHINE_INFO_LABEL)
    }

    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }
}

impl From<ContainerSummary> for ContainerHandle {
    fn from(summary: ContainerSummary) -> Self {
        Self::new(summary.id, summary.name, summary.state, summary.labels)
    }
}

pub fn is_managed(labels: &HashMap<String, String>) -> bool {
    labels.get(IMAGE_LABEL).map(String::as_str) == Some(IMAGE_MARKER)
}

/// Runtime queries. Nothing is cached; every call goes to the runtime.
pub struct Inspector<'a, R: ?Sized> {
    runtime: &'a R,
}

impl<'a, R: FullRuntime + ?Sized> Inspector<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// All managed containers, stopped ones included.
    pub async fn list_managed(&self) -> Result<Vec<ContainerHandle>, ContainerError> {
        let filters = ContainerFilters::labelled(IMAGE_LABEL, IMAGE_MARKER);

        let containers = self.runtime.list_containers(&filters).await?;
        let total = containers.len();

        // Runtimes differ in how strictly they apply label filters.
        let managed: Vec<ContainerHandle> = containers
            .into_iter()
            .filter(|c| is_managed(&c.labels))
            .map(ContainerHandle::from)
            .collect();

        tracing::debug!("{} of {} listed containers are managed", managed.len(), total);
        Ok(managed)
    }

    /// Managed container with exactly this name.
    pub async fn find(&self, name: &str) -> Result<Option<ContainerHandle>, ContainerError> {
        Ok(self
            .list_managed()
            .await?
            .into_iter()
            .find(|h| h.name == name))
    }

    /// Re-inspect a container's state.
    pub async fn state(&self, handle: &ContainerHandle) -> Result<ContainerState, ContainerError> {
        let info = self.runtime.inspect_container(&handle.id).await?;
        Ok(info.state)
    }

    /// Run a command with a TTY inside a running container and return its output.
    pub async fn exec_inside(
        &self,
        handle: &ContainerHandle,
        cmd: &[&str],
    ) -> Result<String, ExecError> {
        let state = self.state(handle).await.map_err(|e| match e {
            ContainerError::NotFound(m) => ExecError::ContainerNotFound(m),
            other => ExecError::Runtime(other.to_string()),
        })?;
        if state != ContainerState::Running {
            return Err(ExecError::ContainerNotRunning(handle.name.clone()));
        }

        let config = ExecConfig {
            cmd: cmd.iter().map(|s| s.to_string()).collect(),
            tty: true,
            ..Default::default()
        };

        let result = self.runtime.exec(&handle.id, &config).await?;
        if !result.success() {
            return Err(ExecError::NonZeroExit(result.exit_code));
        }
        Ok(result.stdout_lossy())
    }

    /// Whether `dll_datalab:latest` is present locally.
    pub async fn image_loaded(&self) -> Result<bool, ImageError> {
        self.runtime.image_exists(&image_ref()).await
    }
}
