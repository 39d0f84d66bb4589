//! MongoDB harness for the diagnosis integration tests.
//!
//! The first test in a binary starts a MongoDB 7.0 container that then serves
//! every other test in that binary. Tests never share data: each
//! [`ProfiledStore`] lives in its own database whose profiler records every
//! operation, which is what the engine later reads back from `system.profile`.

pub mod fixtures;

use std::sync::OnceLock;
use std::sync::mpsc;
use std::time::Duration;

use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Client, Collection, Database};
use slowmango::diagnosis::{DiagnoseOptions, DiagnosticEngine};
use slowmango::models::DiagnosticResponse;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;

static MONGO_URI: OnceLock<String> = OnceLock::new();
static CONTAINER_ID: OnceLock<String> = OnceLock::new();

unsafe extern "C" {
    fn atexit(f: extern "C" fn()) -> i32;
}

extern "C" fn remove_container() {
    if let Some(id) = CONTAINER_ID.get() {
        let _ = std::process::Command::new("docker")
            .args(["rm", "-f", id])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
    }
}

/// URI of the per-binary container, starting it on first use.
///
/// The container handle is parked on its own thread and runtime because each
/// `#[tokio::test]` runtime is torn down when its test returns.
fn mongo_uri() -> &'static str {
    MONGO_URI.get_or_init(|| {
        let (tx, rx) = mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("container runtime");
            rt.block_on(async move {
                let container = Mongo::default()
                    .with_tag("7.0")
                    .start()
                    .await
                    .expect("Failed to start MongoDB container");
                let _ = CONTAINER_ID.set(container.id().to_string());
                unsafe {
                    atexit(remove_container);
                }

                let host = container.get_host().await.expect("container host");
                let port = container.get_host_port_ipv4(27017).await.expect("mapped port");
                let uri = format!("mongodb://{host}:{port}");
                wait_for_ping(&uri).await;
                tx.send(uri).expect("hand off URI");

                std::future::pending::<()>().await;
            });
        });
        rx.recv().expect("container URI")
    })
}

async fn wait_for_ping(uri: &str) {
    let client = Client::with_uri_str(uri).await.expect("ping client");
    for _ in 0..50 {
        if client.database("admin").run_command(doc! { "ping": 1 }).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("MongoDB at {uri} never answered ping");
}

/// A private database with seeded orders and the profiler at level 2.
pub struct ProfiledStore {
    pub client: Client,
    pub database: String,
}

impl ProfiledStore {
    pub const ORDERS: &'static str = "orders";

    /// Seed `count` orders (every `pending_every`-th one pending), then turn on
    /// profiling so the inserts stay out of the log.
    pub async fn seeded(count: usize, pending_every: usize) -> Self {
        let client = Client::with_uri_str(mongo_uri()).await.expect("client");
        let id = uuid::Uuid::new_v4().simple().to_string();
        let store = Self { client, database: format!("profiled_{}", &id[..8]) };

        store
            .orders()
            .insert_many(fixtures::orders(count, pending_every))
            .await
            .expect("Failed to seed orders");
        store
            .db()
            .run_command(doc! { "profile": 2, "slowms": 0 })
            .await
            .expect("Failed to enable profiling");
        store
    }

    pub fn db(&self) -> Database {
        self.client.database(&self.database)
    }

    pub fn orders(&self) -> Collection<Document> {
        self.db().collection(Self::ORDERS)
    }

    /// Namespace the profiler records for the orders collection.
    pub fn orders_namespace(&self) -> String {
        format!("{}.{}", self.database, Self::ORDERS)
    }

    /// Run `find({status: "pending"})` tagged with `comment`, draining the cursor.
    pub async fn find_pending(&self, comment: &str) -> Vec<Document> {
        self.orders()
            .find(doc! { "status": "pending" })
            .comment(Bson::from(comment))
            .await
            .expect("Failed to find")
            .try_collect()
            .await
            .expect("Failed to drain cursor")
    }

    /// Run `pipeline` on the orders tagged with `comment`, draining the cursor.
    pub async fn aggregate(&self, pipeline: Vec<Document>, comment: &str) -> Vec<Document> {
        self.orders()
            .aggregate(pipeline)
            .comment(Bson::from(comment))
            .await
            .expect("Failed to aggregate")
            .try_collect()
            .await
            .expect("Failed to drain cursor")
    }

    pub async fn stop_profiling(&self) {
        self.db().run_command(doc! { "profile": 0 }).await.expect("Failed to stop profiling");
    }

    /// Diagnose `operation_id` against this database's profiling log.
    pub async fn diagnose(&self, operation_id: &str) -> slowmango::Result<DiagnosticResponse> {
        DiagnosticEngine::new(&self.client, &self.client, DiagnoseOptions::default())
            .diagnose(&self.database, operation_id)
            .await
    }
}
