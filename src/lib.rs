// ABOUTME: Library root for datalab-launcher - exposes the lifecycle engine.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod controls;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod inspector;
pub mod launcher;
pub mod lifecycle;
pub mod output;
pub mod paths;
pub mod reconcile;
pub mod runtime;
pub mod startup;
pub mod store;
pub mod types;

pub use launcher::Launcher;
