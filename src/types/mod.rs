//! Core types for the lease core.
//!
//! This module provides foundational types used throughout the system:
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for observability and hierarchy
//!   acquisition

mod config;
mod errors;

pub use config::{Config, HierarchyConfig, ObservabilityConfig};
pub use errors::{Error, Result};
