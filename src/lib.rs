//! Replay slow MongoDB operations recorded by the database profiler, explain
//! them again, and turn the resulting plan into tuning recommendations.

pub mod bson;
pub mod config;
pub mod connection;
pub mod diagnosis;
pub mod error;
pub mod helpers;
pub mod models;
pub mod report;

pub use diagnosis::{DiagnoseOptions, DiagnosticEngine};
pub use error::{Error, Result};
pub use models::DiagnosticResponse;
