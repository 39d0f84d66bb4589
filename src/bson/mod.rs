//! BSON helpers for reading loosely-typed profiler and explain documents.

mod formatter;
mod reader;

pub use formatter::*;
pub use reader::*;
