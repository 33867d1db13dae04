// ABOUTME: Sealed trait pattern for runtime capability traits.
// ABOUTME: Only runtimes defined inside this crate may implement them.

/// Sealed trait to prevent external implementations.
///
/// New capability methods can be added without breaking downstream code,
/// since nothing outside the crate can implement the traits.
pub trait Sealed {}
