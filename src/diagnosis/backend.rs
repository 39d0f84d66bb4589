//! Seams between the diagnostic engine and the storage engine.

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::Result;

/// Read-only access to a database's profiling log.
#[async_trait]
pub trait ProfileBackend: Send + Sync {
    /// Return up to `limit` profiler entries matching `filter`, newest first.
    async fn find_profiled(
        &self,
        database: &str,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<Document>>;
}

/// Access to the storage engine's explain capability.
#[async_trait]
pub trait PlanBackend: Send + Sync {
    /// Run `{ explain: command, verbosity }` against `database`.
    async fn explain(&self, database: &str, command: Document, verbosity: &str)
    -> Result<Document>;
}
