//! Profiling log queries.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Client;
use mongodb::bson::{Document, doc};

use crate::diagnosis::ProfileBackend;
use crate::error::Result;

/// Collection the server writes profiled operations to.
pub const PROFILE_COLLECTION: &str = "system.profile";

#[async_trait]
impl ProfileBackend for Client {
    async fn find_profiled(
        &self,
        database: &str,
        filter: Document,
        limit: i64,
    ) -> Result<Vec<Document>> {
        let coll = self.database(database).collection::<Document>(PROFILE_COLLECTION);
        let cursor = coll.find(filter).sort(doc! { "ts": -1 }).limit(limit).await?;
        let entries: Vec<Document> = cursor.try_collect().await?;
        Ok(entries)
    }
}
