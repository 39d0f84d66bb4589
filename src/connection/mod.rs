//! MongoDB connection management and diagnostic operations.
//!
//! This module provides:
//! - `ConnectionManager`: Tokio runtime owner and connection helpers
//! - `ops`: profiler lookups, explain, and the blocking diagnosis entry points

pub mod manager;
pub mod ops;

pub use manager::ConnectionManager;
