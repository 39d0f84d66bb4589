//! Database operations split into focused modules.

pub mod diagnose;
pub mod explain;
pub mod profile;
