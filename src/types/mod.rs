// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Container names, image references, deployment and host kinds.

mod container_name;
mod deployment;
mod id;
mod image_ref;

pub use container_name::{ContainerName, ContainerNameError};
pub use deployment::{Deployment, HostOs, ParseDeploymentError};
pub use id::{ContainerId, ExecId, Id};
pub use image_ref::{ImageRef, ParseImageRefError};
