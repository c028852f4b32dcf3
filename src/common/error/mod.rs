//! Unified error types for runspan.
//!
//! This module provides a unified error type that encompasses package,
//! configuration and editing errors, presenting a consistent API to users.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
