// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ContainerOps, ExecOps, ImageOps, RuntimeInfo and FullRuntime.

mod container;
mod exec;
mod image;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use exec::{ExecError, ExecOps};
pub use image::{ImageError, ImageOps};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// Every capability the launcher needs from a runtime.
pub trait FullRuntime: ContainerOps + ExecOps + ImageOps + RuntimeInfo {}

impl<T: ContainerOps + ExecOps + ImageOps + RuntimeInfo> FullRuntime for T {}
