//! Core ConnectionManager struct and basic connection methods.

use std::time::Duration;

use mongodb::Client;
use mongodb::bson::doc;
use tokio::runtime::Runtime;

use crate::error::{Error, Result};

/// Owns the Tokio runtime used to drive MongoDB operations from blocking code
pub struct ConnectionManager {
    /// Tokio runtime for MongoDB async operations
    pub(crate) runtime: Runtime,
}

impl ConnectionManager {
    /// Create a new connection manager
    pub fn new() -> Result<Self> {
        let runtime = Runtime::new()?;
        Ok(Self { runtime })
    }

    /// Connect with a timeout (runs in Tokio runtime)
    pub fn connect_with_timeout(&self, uri: &str, timeout: Duration) -> Result<Client> {
        self.runtime.block_on(async {
            let fut = async {
                let client = Client::with_uri_str(uri).await?;
                client.database("admin").run_command(doc! { "ping": 1 }).await?;
                Ok::<Client, mongodb::error::Error>(client)
            };

            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result.map_err(Error::from),
                Err(_) => Err(Error::Timeout("Connection timed out".to_string())),
            }
        })
    }

    /// Current profiling level and slow threshold of a database (runs in Tokio runtime)
    pub fn profiling_status(&self, client: &Client, database: &str) -> Result<(i32, i32)> {
        let client = client.clone();
        let database = database.to_string();
        self.runtime.block_on(async {
            let status = client.database(&database).run_command(doc! { "profile": -1 }).await?;
            let level = crate::bson::read_i64(&status, "was").unwrap_or(0) as i32;
            let slow_ms = crate::bson::read_i64(&status, "slowms").unwrap_or(100) as i32;
            Ok((level, slow_ms))
        })
    }
}
