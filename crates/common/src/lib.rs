//! Common utilities for sdswap
//!
//! This crate provides ambient functionality shared by the workspace
//! binaries: logging setup, the common error type and a bounded retry policy.

pub mod error;
pub mod logging;
pub mod retry;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use retry::RetryPolicy;
