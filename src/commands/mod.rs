// ABOUTME: Command module aggregator for the launcher CLI.
// ABOUTME: Re-exports container, image and controls command handlers.

mod containers;
mod controls;
mod image;
mod runtime_connection;

pub use containers::{Transition, create, list, open, transition};
pub use controls::controls;
pub use image::{check, update};
