//! Build metadata.

/// Crate version, embedded at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
