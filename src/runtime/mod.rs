// ABOUTME: Container runtime access for Docker and Podman.
// ABOUTME: Capability traits, the bollard implementation, and local detection.

mod bollard;
mod detection;
mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use detection::{DetectionError, detect_local};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::{
    BuildConfig, BuildContext, ContainerConfig, ContainerError, ContainerFilters, ContainerInfo,
    ContainerOps, ContainerState, ContainerSummary, ExecConfig, ExecError, ExecOps, ExecResult,
    FullRuntime, ImageError, ImageOps, PortMapping, RuntimeInfo as RuntimeInfoTrait,
    RuntimeInfoError, RuntimeMetadata, VolumeMount,
};
pub use types::{RuntimeConfig, RuntimeEndpoint, RuntimeType};

/// Detect and connect to the local runtime, then ping it.
pub async fn connect_local(
    config: Option<&RuntimeConfig>,
    timeout: std::time::Duration,
) -> Result<BollardRuntime, RuntimeError> {
    use traits::RuntimeInfo;

    let endpoint = detect_local(config)?;
    tracing::debug!(
        "connecting to {} at {} (timeout {:?})",
        endpoint.runtime_type,
        endpoint.socket_path,
        timeout
    );
    let runtime = BollardRuntime::connect(&endpoint, timeout)?;
    runtime.ping().await?;
    Ok(runtime)
}
