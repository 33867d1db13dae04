// ABOUTME: Container lifecycle transitions: create, start, stop, remove.
// ABOUTME: Each wraps one runtime call with logging and a classified error.

use crate::config::DriveDescriptor;
use crate::inspector::{
    ADDRESS_LABEL, ContainerHandle, DEPLOYMENT_LABEL, Inspector, MACHINE_INFO_LABEL, image_ref,
};
use crate::paths::{self, build_bind_set};
use crate::runtime::{ContainerConfig, ContainerError, ContainerState, FullRuntime, PortMapping};
use crate::store::{MetadataStore, StoreError, UNKNOWN};
use crate::types::{ContainerName, ContainerNameError, Deployment, HostOs};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONTAINER_PORT: u16 = 8080;
pub const DEFAULT_LOCAL_PORT: u16 = 8081;
pub const ENTRYPOINT: &str = "/datalab/run.sh";
pub const GUEST_SETTINGS: &str = r#"{"startuppath":"/tree/datalab/workspace"}"#;

/// A failed lifecycle transition, naming the operation and container.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("failed to start container {name}: {source}")]
    Start {
        name: String,
        source: ContainerError,
    },

    #[error("failed to stop container {name}: {source}")]
    Stop {
        name: String,
        source: ContainerError,
    },

    #[error("failed to remove container {name}: {source}")]
    Remove {
        name: String,
        source: ContainerError,
    },

    #[error("failed to create container {name}: {source}")]
    Create {
        name: String,
        source: ContainerError,
    },

    #[error("container {name} is a Cloud deployment but has no gateway")]
    MissingGateway { name: String },

    #[error("invalid container name {name:?}: {source}")]
    InvalidName {
        name: String,
        source: ContainerNameError,
    },

    #[error("failed to prepare {path} for container {name}: {source}")]
    Prepare {
        name: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parameters of a new container.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    /// Requested name; empty means generate one.
    pub name: String,
    pub project_id: String,
    pub deployment: Deployment,
    pub gateway: Option<String>,
    pub local_drive: PathBuf,
    pub drives: Vec<DriveDescriptor>,
    pub local_port: u16,
}

impl CreateRequest {
    pub fn new(name: impl Into<String>, project_id: impl Into<String>, local_drive: &Path) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            deployment: Deployment::Local,
            gateway: None,
            local_drive: local_drive.to_path_buf(),
            drives: Vec::new(),
            local_port: DEFAULT_LOCAL_PORT,
        }
    }

    /// The gateway, if one was given and is not blank.
    pub fn gateway(&self) -> Option<&str> {
        self.gateway.as_deref().map(str::trim).filter(|g| !g.is_empty())
    }
}

/// Drives state transitions of managed containers.
pub struct Lifecycle<'a, R: ?Sized> {
    runtime: &'a R,
    store: &'a Mutex<MetadataStore>,
    stop_timeout: Duration,
    host_os: HostOs,
}

impl<'a, R: FullRuntime + ?Sized> Lifecycle<'a, R> {
    pub fn new(
        runtime: &'a R,
        store: &'a Mutex<MetadataStore>,
        stop_timeout: Duration,
        host_os: HostOs,
    ) -> Self {
        Self {
            runtime,
            store,
            stop_timeout,
            host_os,
        }
    }

    /// Start a container. Its state is re-read afterwards either way.
    pub async fn start(&self, handle: &mut ContainerHandle) -> Result<(), LifecycleError> {
        tracing::info!("starting container {}", handle.name);
        let result = self.runtime.start_container(&handle.id).await;
        self.refresh(handle).await;

        match result {
            Ok(()) => {
                tracing::info!("container {} is {}", handle.name, handle.state);
                Ok(())
            }
            Err(source) => {
                tracing::error!("failed to start container {}: {}", handle.name, source);
                Err(LifecycleError::Start {
                    name: handle.name.clone(),
                    source,
                })
            }
        }
    }

    /// Stop a container. Its state is re-read afterwards either way.
    pub async fn stop(&self, handle: &mut ContainerHandle) -> Result<(), LifecycleError> {
        tracing::info!(
            "stopping container {} (timeout {:?})",
            handle.name,
            self.stop_timeout
        );
        let result = self
            .runtime
            .stop_container(&handle.id, self.stop_timeout)
            .await;
        self.refresh(handle).await;

        match result {
            Ok(()) => {
                tracing::info!("container {} is {}", handle.name, handle.state);
                Ok(())
            }
            Err(source) => {
                tracing::error!("failed to stop container {}: {}", handle.name, source);
                Err(LifecycleError::Stop {
                    name: handle.name.clone(),
                    source,
                })
            }
        }
    }

    /// Remove a container and forget its metadata.
    ///
    /// The record stays when the runtime refuses the removal.
    pub async fn remove(&self, handle: &ContainerHandle) -> Result<(), LifecycleError> {
        tracing::info!("removing container {}", handle.name);
        if let Err(source) = self.runtime.remove_container(&handle.id, false).await {
            tracing::error!("failed to remove container {}: {}", handle.name, source);
            return Err(LifecycleError::Remove {
                name: handle.name.clone(),
                source,
            });
        }

        self.store.lock().remove(&handle.name)?;
        tracing::info!("container {} removed", handle.name);
        Ok(())
    }

    /// Create a container.
    ///
    /// Directories made before a runtime failure are left in place.
    pub async fn create(&self, request: &CreateRequest) -> Result<ContainerHandle, LifecycleError> {
        let name = if request.name.trim().is_empty() {
            let generated = ContainerName::generate();
            tracing::info!("no name given, using {}", generated);
            generated
        } else {
            ContainerName::new(&request.name).map_err(|source| LifecycleError::InvalidName {
                name: request.name.clone(),
                source,
            })?
        };
        let name = name.as_str();

        if request.deployment == Deployment::Cloud && request.gateway().is_none() {
            return Err(LifecycleError::MissingGateway {
                name: name.to_string(),
            });
        }

        let content = paths::content_dir(&request.local_drive, name);
        let notebooks = paths::notebooks_dir(&request.local_drive);
        for dir in [&content, &notebooks] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| LifecycleError::Prepare {
                    name: name.to_string(),
                    path: dir.clone(),
                    source,
                })?;
        }

        let binds = build_bind_set(&content, &notebooks, &request.drives, self.host_os);
        tracing::debug!("binds for {}: {:?}", name, binds);

        let config = container_config(name, request, paths::to_mounts(&binds));

        tracing::info!("creating container {}", name);
        let id = self.runtime.create_container(&config).await.map_err(|source| {
            tracing::error!("failed to create container {}: {}", name, source);
            LifecycleError::Create {
                name: name.to_string(),
                source,
            }
        })?;

        write_guest_settings(&content)
            .await
            .map_err(|(path, source)| LifecycleError::Prepare {
                name: name.to_string(),
                path,
                source,
            })?;

        self.store.lock().seed(name, &request.project_id)?;

        let mut handle =
            ContainerHandle::new(id, name, ContainerState::Created, HashMap::new());
        match self.runtime.inspect_container(&handle.id).await {
            Ok(info) => {
                handle = ContainerHandle::new(info.id, info.name, info.state, info.labels);
            }
            Err(e) => tracing::warn!("could not inspect new container {}: {}", name, e),
        }

        tracing::info!("container {} created", name);
        Ok(handle)
    }

    async fn refresh(&self, handle: &mut ContainerHandle) {
        match Inspector::new(self.runtime).state(handle).await {
            Ok(state) => handle.state = state,
            Err(e) => tracing::warn!("could not re-read state of {}: {}", handle.name, e),
        }
    }
}

fn container_config(
    name: &str,
    request: &CreateRequest,
    volumes: Vec<crate::runtime::VolumeMount>,
) -> ContainerConfig {
    let mut env = HashMap::from([
        ("PROJECT_ID".to_string(), request.project_id.clone()),
        ("DATALAB_ENV".to_string(), "local".to_string()),
    ]);
    if let (Deployment::Cloud, Some(gateway)) = (request.deployment, request.gateway()) {
        env.insert("GATEWAY_VM".to_string(), gateway.to_string());
    }

    let labels = HashMap::from([
        (
            ADDRESS_LABEL.to_string(),
            format!("http://localhost:{}/", request.local_port),
        ),
        (
            DEPLOYMENT_LABEL.to_string(),
            request.deployment.as_str().to_string(),
        ),
        (
            MACHINE_INFO_LABEL.to_string(),
            request.gateway().unwrap_or(UNKNOWN).to_string(),
        ),
    ]);

    ContainerConfig {
        name: name.to_string(),
        image: image_ref(),
        env,
        labels,
        ports: vec![PortMapping {
            host_port: request.local_port,
            container_port: CONTAINER_PORT,
            host_ip: Some("127.0.0.1".to_string()),
        }],
        volumes,
        entrypoint: Some(vec![ENTRYPOINT.to_string()]),
        tty: true,
        open_stdin: true,
    }
}

async fn write_guest_settings(content: &Path) -> Result<(), (PathBuf, std::io::Error)> {
    let config_dir = content.join(".config");
    tokio::fs::create_dir_all(&config_dir)
        .await
        .map_err(|e| (config_dir.clone(), e))?;
    let path = config_dir.join("settings.json");
    tokio::fs::write(&path, GUEST_SETTINGS)
        .await
        .map_err(|e| (path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::IMAGE_TAG;
    use crate::runtime::fake::{FakeRuntime, datalab_labels};

    struct Fixture {
        runtime: FakeRuntime,
        store: Mutex<MetadataStore>,
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = MetadataStore::load(dir.path().join("containers.json")).unwrap();
            let runtime = FakeRuntime::new();
            runtime.add_image(IMAGE_TAG);
            Self {
                runtime,
                store: Mutex::new(store),
                dir,
            }
        }

        fn lifecycle(&self) -> Lifecycle<'_, FakeRuntime> {
            Lifecycle::new(
                &self.runtime,
                &self.store,
                Duration::from_secs(1),
                HostOs::Linux,
            )
        }

        async fn handle(&self, name: &str) -> ContainerHandle {
            Inspector::new(&self.runtime)
                .find(name)
                .await
                .unwrap()
                .unwrap()
        }
    }

    #[tokio::test]
    async fn create_with_empty_name_generates_one_and_seeds_store() {
        let fx = Fixture::new();
        let request = CreateRequest::new("", "proj1", fx.dir.path());
        let handle = fx.lifecycle().create(&request).await.unwrap();

        assert!(!handle.name.is_empty());
        assert!(paths::content_dir(fx.dir.path(), &handle.name).is_dir());
        assert!(paths::notebooks_dir(fx.dir.path()).is_dir());

        let store = fx.store.lock();
        let record = store.get(&handle.name).unwrap();
        assert_eq!(record.project_id.as_deref(), Some("proj1"));
        assert_eq!(record.user.as_deref(), Some("-"));
    }

    #[tokio::test]
    async fn create_writes_guest_settings() {
        let fx = Fixture::new();
        let request = CreateRequest::new("nb", "p", fx.dir.path());
        fx.lifecycle().create(&request).await.unwrap();

        let settings = paths::content_dir(fx.dir.path(), "nb").join(".config/settings.json");
        assert_eq!(std::fs::read_to_string(settings).unwrap(), GUEST_SETTINGS);
    }

    #[tokio::test]
    async fn create_configures_local_container() {
        let fx = Fixture::new();
        let mut request = CreateRequest::new("nb", "p", fx.dir.path());
        request.local_port = 9000;
        fx.lifecycle().create(&request).await.unwrap();

        let config = &fx.runtime.created()[0];
        assert_eq!(config.image.to_string(), IMAGE_TAG);
        assert_eq!(config.env["PROJECT_ID"], "p");
        assert_eq!(config.env["DATALAB_ENV"], "local");
        assert!(!config.env.contains_key("GATEWAY_VM"));
        assert_eq!(config.labels[ADDRESS_LABEL], "http://localhost:9000/");
        assert_eq!(config.labels[DEPLOYMENT_LABEL], "Local");
        assert_eq!(config.labels[MACHINE_INFO_LABEL], "-");
        assert_eq!(config.ports[0].host_port, 9000);
        assert_eq!(config.ports[0].container_port, 8080);
        assert_eq!(config.ports[0].host_ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.entrypoint, Some(vec![ENTRYPOINT.to_string()]));
        assert!(config.tty && config.open_stdin);
        assert_eq!(config.volumes.len(), 2);
    }

    #[tokio::test]
    async fn cloud_container_gets_gateway() {
        let fx = Fixture::new();
        let mut request = CreateRequest::new("cl", "p", fx.dir.path());
        request.deployment = Deployment::Cloud;
        request.gateway = Some("gw-1".to_string());
        fx.lifecycle().create(&request).await.unwrap();

        let config = &fx.runtime.created()[0];
        assert_eq!(config.env["GATEWAY_VM"], "gw-1");
        assert_eq!(config.labels[MACHINE_INFO_LABEL], "gw-1");
        assert_eq!(config.labels[DEPLOYMENT_LABEL], "Cloud");
    }

    #[tokio::test]
    async fn invalid_name_is_rejected_before_touching_disk() {
        let fx = Fixture::new();
        let request = CreateRequest::new("bad name!", "p", fx.dir.path());
        let err = fx.lifecycle().create(&request).await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidName { .. }));
        assert!(!paths::notebooks_dir(fx.dir.path()).exists());
    }

    #[tokio::test]
    async fn runtime_rejection_is_create_error_and_keeps_directories() {
        let fx = Fixture::new();
        fx.runtime.fail_create();
        let request = CreateRequest::new("nb", "p", fx.dir.path());
        let err = fx.lifecycle().create(&request).await.unwrap_err();

        assert!(matches!(err, LifecycleError::Create { .. }));
        assert!(paths::content_dir(fx.dir.path(), "nb").is_dir());
        assert!(fx.store.lock().get("nb").is_none());
    }

    #[tokio::test]
    async fn start_and_stop_refresh_state() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("s", ContainerState::Exited, datalab_labels("1"), "p");
        let mut handle = fx.handle("s").await;

        fx.lifecycle().start(&mut handle).await.unwrap();
        assert_eq!(handle.state, ContainerState::Running);

        fx.lifecycle().stop(&mut handle).await.unwrap();
        assert_eq!(handle.state, ContainerState::Exited);
    }

    #[tokio::test]
    async fn failed_start_names_container() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("s", ContainerState::Exited, datalab_labels("1"), "p");
        fx.runtime.fail_start();
        let mut handle = fx.handle("s").await;

        let err = fx.lifecycle().start(&mut handle).await.unwrap_err();
        assert!(err.to_string().contains("start container s"));
        assert_eq!(handle.state, ContainerState::Exited);
    }

    #[tokio::test]
    async fn failed_stop_names_container_and_rereads_state() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("s", ContainerState::Running, datalab_labels("1"), "p");
        fx.runtime.fail_stop();
        let mut handle = fx.handle("s").await;
        handle.state = ContainerState::Exited;

        let err = fx.lifecycle().stop(&mut handle).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Stop { ref name, .. } if name == "s"));
        assert!(err.to_string().contains("stop container s"));
        assert_eq!(handle.state, ContainerState::Running);
    }

    #[tokio::test]
    async fn cloud_container_without_gateway_is_rejected() {
        let fx = Fixture::new();
        for gateway in [None, Some("  ".to_string())] {
            let mut request = CreateRequest::new("cl", "p", fx.dir.path());
            request.deployment = Deployment::Cloud;
            request.gateway = gateway;
            let err = fx.lifecycle().create(&request).await.unwrap_err();
            assert!(matches!(err, LifecycleError::MissingGateway { .. }));
        }
        assert!(fx.runtime.created().is_empty());
        assert!(!paths::content_dir(fx.dir.path(), "cl").exists());
    }

    #[tokio::test]
    async fn remove_failure_keeps_record() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("r", ContainerState::Exited, datalab_labels("1"), "p");
        fx.store.lock().seed("r", "p").unwrap();
        fx.runtime.fail_remove();
        let handle = fx.handle("r").await;

        let err = fx.lifecycle().remove(&handle).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Remove { .. }));
        assert!(fx.store.lock().get("r").is_some());
    }

    #[tokio::test]
    async fn remove_success_deletes_record() {
        let fx = Fixture::new();
        fx.runtime
            .add_container("r", ContainerState::Exited, datalab_labels("1"), "p");
        fx.store.lock().seed("r", "p").unwrap();
        let handle = fx.handle("r").await;

        fx.lifecycle().remove(&handle).await.unwrap();
        assert!(fx.store.lock().get("r").is_none());
        assert!(fx.runtime.container("r").is_none());
    }
}
