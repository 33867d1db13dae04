// ABOUTME: In-memory runtime used by unit tests.
// ABOUTME: Records calls and can be told to fail specific operations.

use super::traits::sealed::Sealed;
use super::traits::{
    BuildConfig, BuildContext, ContainerConfig, ContainerError, ContainerFilters, ContainerInfo,
    ContainerOps, ContainerState, ContainerSummary, ExecConfig, ExecError, ExecOps, ExecResult,
    ImageError, ImageOps, RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
};
use crate::types::{ContainerId, ExecId, ImageRef};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) struct FakeContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    pub labels: HashMap<String, String>,
    /// What `printenv` prints inside the container.
    pub env_output: String,
}

#[derive(Debug, Default)]
struct FakeState {
    containers: Vec<FakeContainer>,
    images: HashSet<String>,
    builds: Vec<(BuildConfig, Vec<u8>)>,
    created: Vec<ContainerConfig>,
    pending_execs: HashMap<String, String>,
    fail_start: bool,
    fail_stop: bool,
    fail_remove: bool,
    fail_create: bool,
    fail_next_builds: usize,
    unreachable: bool,
    next_id: u32,
}

#[derive(Debug, Default)]
pub(crate) struct FakeRuntime {
    state: Mutex<FakeState>,
}

pub(crate) fn datalab_labels(version: &str) -> HashMap<String, String> {
    HashMap::from([
        ("dll_image".to_string(), "datalab".to_string()),
        ("dll_version".to_string(), version.to_string()),
        ("dll_deployment".to_string(), "Local".to_string()),
    ])
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_container(
        &self,
        name: &str,
        state: ContainerState,
        labels: HashMap<String, String>,
        project: &str,
    ) -> ContainerId {
        let mut s = self.state.lock();
        s.next_id += 1;
        let id = format!("fake{:04}", s.next_id);
        s.containers.push(FakeContainer {
            id: id.clone(),
            name: name.to_string(),
            image: "dll_datalab:latest".to_string(),
            state,
            labels,
            env_output: format!("HOSTNAME=abc\r\nPROJECT_ID={}\r\nHOME=/root\r\n", project),
        });
        ContainerId::new(id)
    }

    pub fn add_image(&self, reference: &str) {
        self.state.lock().images.insert(reference.to_string());
    }

    pub fn container(&self, name: &str) -> Option<FakeContainer> {
        self.state
            .lock()
            .containers
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    pub fn builds(&self) -> Vec<(BuildConfig, Vec<u8>)> {
        self.state.lock().builds.clone()
    }

    pub fn created(&self) -> Vec<ContainerConfig> {
        self.state.lock().created.clone()
    }

    pub fn fail_start(&self) {
        self.state.lock().fail_start = true;
    }

    pub fn fail_stop(&self) {
        self.state.lock().fail_stop = true;
    }

    pub fn fail_remove(&self) {
        self.state.lock().fail_remove = true;
    }

    pub fn fail_create(&self) {
        self.state.lock().fail_create = true;
    }

    pub fn fail_next_builds(&self, count: usize) {
        self.state.lock().fail_next_builds = count;
    }

    pub fn set_unreachable(&self) {
        self.state.lock().unreachable = true;
    }

    fn find_mut<'a>(s: &'a mut FakeState, id: &ContainerId) -> Option<&'a mut FakeContainer> {
        s.containers
            .iter_mut()
            .find(|c| c.id == id.as_str() || c.name == id.as_str())
    }
}

impl Sealed for FakeRuntime {}

#[async_trait]
impl RuntimeInfo for FakeRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        self.ping().await?;
        Ok(RuntimeMetadata {
            name: "Fake".to_string(),
            version: "0.0.0".to_string(),
            api_version: "1.0".to_string(),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        if self.state.lock().unreachable {
            return Err(RuntimeInfoError::Unreachable(
                "fake runtime unreachable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ImageOps for FakeRuntime {
    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        Ok(self.state.lock().images.contains(&reference.to_string()))
    }

    async fn build_image(
        &self,
        config: &BuildConfig,
        context: BuildContext,
    ) -> Result<(), ImageError> {
        let mut s = self.state.lock();
        s.builds.push((config.clone(), context.into_bytes()));
        if s.fail_next_builds > 0 {
            s.fail_next_builds -= 1;
            return Err(ImageError::BuildFailed("simulated failure".to_string()));
        }
        s.images.insert(config.tag.to_string());
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let mut s = self.state.lock();
        if s.fail_create {
            return Err(ContainerError::Runtime("simulated failure".to_string()));
        }
        if s.containers.iter().any(|c| c.name == config.name) {
            return Err(ContainerError::NameInUse(config.name.clone()));
        }
        if !s.images.contains(&config.image.to_string()) {
            return Err(ContainerError::ImageMissing(config.image.to_string()));
        }
        s.created.push(config.clone());
        s.next_id += 1;
        let id = format!("fake{:04}", s.next_id);

        // Image labels come first, container labels override them.
        let mut labels = datalab_labels("fake");
        labels.extend(config.labels.clone());
        let env_output = config
            .env
            .iter()
            .map(|(k, v)| format!("{}={}\r\n", k, v))
            .collect();

        s.containers.push(FakeContainer {
            id: id.clone(),
            name: config.name.clone(),
            image: config.image.to_string(),
            state: ContainerState::Created,
            labels,
            env_output,
        });
        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let mut s = self.state.lock();
        if s.fail_start {
            return Err(ContainerError::Runtime("simulated failure".to_string()));
        }
        let container = Self::find_mut(&mut s, id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        container.state = ContainerState::Running;
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _grace: Duration,
    ) -> Result<(), ContainerError> {
        let mut s = self.state.lock();
        if s.fail_stop {
            return Err(ContainerError::Runtime("simulated failure".to_string()));
        }
        let container = Self::find_mut(&mut s, id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        container.state = ContainerState::Exited;
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let mut s = self.state.lock();
        if s.fail_remove {
            return Err(ContainerError::Runtime("simulated failure".to_string()));
        }
        let pos = s
            .containers
            .iter()
            .position(|c| c.id == id.as_str() || c.name == id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        if s.containers[pos].state == ContainerState::Running && !force {
            return Err(ContainerError::Running(id.to_string()));
        }
        s.containers.remove(pos);
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let mut s = self.state.lock();
        let c = Self::find_mut(&mut s, id)
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        Ok(ContainerInfo {
            id: ContainerId::new(c.id.clone()),
            name: c.name.clone(),
            image: c.image.clone(),
            state: c.state,
            labels: c.labels.clone(),
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let s = self.state.lock();
        if s.unreachable {
            return Err(ContainerError::Runtime("fake runtime unreachable".to_string()));
        }
        Ok(s.containers
            .iter()
            .filter(|c| filters.all || c.state == ContainerState::Running)
            .filter(|c| {
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.labels.get(k) == Some(v))
            })
            .filter(|c| filters.name.as_ref().is_none_or(|n| c.name.contains(n)))
            .map(|c| ContainerSummary {
                id: ContainerId::new(c.id.clone()),
                name: c.name.clone(),
                image: c.image.clone(),
                state: c.state,
                status: c.state.display_text().to_string(),
                labels: c.labels.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl ExecOps for FakeRuntime {
    async fn exec_create(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError> {
        let mut s = self.state.lock();
        let c = Self::find_mut(&mut s, container)
            .ok_or_else(|| ExecError::ContainerNotFound(container.to_string()))?;
        if c.state != ContainerState::Running {
            return Err(ExecError::ContainerNotRunning(container.to_string()));
        }
        let output = if config.cmd.iter().any(|a| a.contains("printenv")) {
            c.env_output.clone()
        } else {
            String::new()
        };
        s.next_id += 1;
        let exec_id = format!("exec{:04}", s.next_id);
        s.pending_execs.insert(exec_id.clone(), output);
        Ok(ExecId::new(exec_id))
    }

    async fn exec_start(&self, exec_id: &ExecId) -> Result<ExecResult, ExecError> {
        let output = self
            .state
            .lock()
            .pending_execs
            .remove(exec_id.as_str())
            .ok_or_else(|| ExecError::ExecNotFound(exec_id.to_string()))?;
        Ok(ExecResult {
            exit_code: 0,
            stdout: output.into_bytes(),
            stderr: Vec::new(),
        })
    }
}
