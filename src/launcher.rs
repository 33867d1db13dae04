// ABOUTME: Launcher context: runtime client, settings, host OS and metadata store.
// ABOUTME: Built once and lent to every component; front ends call only this.

use crate::config::Settings;
use crate::controls::{self, Controls, FormInput};
use crate::error::{Error, Result};
use crate::image::ImagePipeline;
use crate::inspector::{ContainerHandle, Inspector};
use crate::lifecycle::{CreateRequest, Lifecycle};
use crate::reconcile::{ContainerView, Reconciler};
use crate::runtime::{self, BollardRuntime, FullRuntime};
use crate::store::{MetadataStore, StoreError};
use crate::types::{Deployment, HostOs};
use parking_lot::Mutex;

/// Everything the core needs, owned in one place.
///
/// The store sits behind a mutex that is only held for synchronous reads and
/// writes, never across an `.await`.
pub struct Launcher<R> {
    runtime: R,
    settings: Settings,
    host_os: HostOs,
    store: Mutex<MetadataStore>,
}

impl Launcher<BollardRuntime> {
    /// Detect the local runtime, connect with the configured timeout and ping it.
    pub async fn connect(settings: Settings) -> Result<Self> {
        let runtime = runtime::connect_local(
            Some(&settings.runtime_config()),
            settings.docker_client_timeout,
        )
        .await?;
        tracing::info!("connected to {}", runtime.runtime_type());
        Ok(Self::new(runtime, settings)?)
    }
}

impl<R: FullRuntime> Launcher<R> {
    /// Wrap an existing runtime client. Loads the metadata store.
    pub fn new(runtime: R, settings: Settings) -> std::result::Result<Self, StoreError> {
        let store = MetadataStore::load(&settings.containers_log)?;
        tracing::debug!(
            "loaded {} metadata records from {}",
            store.len(),
            store.path().display()
        );
        Ok(Self {
            runtime,
            settings,
            host_os: HostOs::current(),
            store: Mutex::new(store),
        })
    }

    /// Override the host OS used for path translation.
    pub fn with_host_os(mut self, host_os: HostOs) -> Self {
        self.host_os = host_os;
        self
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn host_os(&self) -> HostOs {
        self.host_os
    }

    pub fn store(&self) -> &Mutex<MetadataStore> {
        &self.store
    }

    pub fn inspector(&self) -> Inspector<'_, R> {
        Inspector::new(&self.runtime)
    }

    pub fn reconciler(&self) -> Reconciler<'_, R> {
        Reconciler::new(&self.runtime, &self.store, &self.settings.local_drive)
    }

    pub fn lifecycle(&self) -> Lifecycle<'_, R> {
        Lifecycle::new(
            &self.runtime,
            &self.store,
            self.settings.stop_timeout,
            self.host_os,
        )
    }

    pub fn images(&self) -> ImagePipeline<'_, R> {
        ImagePipeline::new(
            &self.runtime,
            &self.settings.latest_dockerfile,
            &self.settings.local_dockerfile,
        )
    }

    /// The container list, reconciled against the store.
    pub async fn list(&self) -> Result<Vec<ContainerView>> {
        Ok(self.reconciler().list_all().await?)
    }

    /// The managed container with this name.
    pub async fn find(&self, name: &str) -> Result<ContainerHandle> {
        self.inspector()
            .find(name)
            .await?
            .ok_or_else(|| Error::NoSuchContainer(name.to_string()))
    }

    pub async fn start(&self, name: &str) -> Result<ContainerHandle> {
        let mut handle = self.find(name).await?;
        self.lifecycle().start(&mut handle).await?;
        Ok(handle)
    }

    pub async fn stop(&self, name: &str) -> Result<ContainerHandle> {
        let mut handle = self.find(name).await?;
        self.lifecycle().stop(&mut handle).await?;
        Ok(handle)
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        let handle = self.find(name).await?;
        self.lifecycle().remove(&handle).await?;
        Ok(())
    }

    /// A create request filled in from the settings.
    pub fn create_request(
        &self,
        name: &str,
        project_id: &str,
        deployment: Deployment,
        gateway: Option<&str>,
    ) -> CreateRequest {
        CreateRequest {
            name: name.trim().replace(' ', "_"),
            project_id: project_id.to_string(),
            deployment,
            gateway: gateway.map(str::to_string),
            local_drive: self.settings.local_drive.clone(),
            drives: self.settings.drives.clone(),
            local_port: self.settings.local_port,
        }
    }

    pub async fn create(&self, request: &CreateRequest) -> Result<ContainerHandle> {
        Ok(self.lifecycle().create(request).await?)
    }

    /// Address of a running container.
    pub async fn address(&self, name: &str) -> Result<String> {
        let handle = self.find(name).await?;
        if !handle.is_running() {
            return Err(Error::NotRunning(name.to_string()));
        }
        Ok(handle.address().to_string())
    }

    /// Rebuild the image from the shared recipe.
    pub async fn update_image(&self) -> Result<String> {
        Ok(self.images().update_image().await?)
    }

    /// Controls offered for the given form input.
    pub async fn controls(&self, input: &FormInput) -> Result<Controls> {
        let containers = self.list().await?;
        Ok(controls::evaluate(input, &containers))
    }
}
