// ABOUTME: Application-wide error types for the launcher.
// ABOUTME: Uses thiserror to wrap each component's error enum.

use crate::image::BuildError;
use crate::lifecycle::LifecycleError;
use crate::reconcile::ReconcileError;
use crate::runtime::{ContainerError, RuntimeError};
use crate::startup::StartupError;
use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no DataLab container named {0}")]
    NoSuchContainer(String),

    #[error("container {0} is not running")]
    NotRunning(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("container runtime unavailable: {0}")]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("image build failed: {0}")]
    Build(#[from] BuildError),

    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
