//! Explain command execution.

use async_trait::async_trait;
use mongodb::Client;
use mongodb::bson::{Document, doc};

use crate::diagnosis::PlanBackend;
use crate::error::Result;

#[async_trait]
impl PlanBackend for Client {
    /// Run explain for an already rendered inner command.
    async fn explain(
        &self,
        database: &str,
        command: Document,
        verbosity: &str,
    ) -> Result<Document> {
        let db = self.database(database);
        let command = doc! {
            "explain": command,
            "verbosity": verbosity,
        };
        let explain = db.run_command(command).await?;
        Ok(explain)
    }
}
