//! Blocking diagnosis entry points for callers without their own runtime.

use futures::future::{AbortRegistration, Abortable};
use mongodb::Client;

use crate::connection::ConnectionManager;
use crate::diagnosis::{DiagnoseOptions, DiagnosticEngine};
use crate::error::{Error, Result};
use crate::models::DiagnosticResponse;

impl ConnectionManager {
    /// Diagnose a profiled operation (runs in Tokio runtime)
    pub fn diagnose_operation(
        &self,
        client: &Client,
        database: &str,
        operation_id: &str,
        options: DiagnoseOptions,
    ) -> Result<DiagnosticResponse> {
        self.runtime.block_on(async {
            DiagnosticEngine::new(client, client, options).diagnose(database, operation_id).await
        })
    }

    /// Diagnose a profiled operation with abort support (runs in Tokio runtime).
    ///
    /// Aborting drops the in-flight lookup or explain; nothing is written, so
    /// there is nothing to roll back.
    pub fn diagnose_operation_abortable(
        &self,
        client: &Client,
        database: &str,
        operation_id: &str,
        options: DiagnoseOptions,
        abort_registration: AbortRegistration,
    ) -> Result<DiagnosticResponse> {
        self.runtime.block_on(async {
            let engine = DiagnosticEngine::new(client, client, options);
            let fut = engine.diagnose(database, operation_id);
            match Abortable::new(fut, abort_registration).await {
                Ok(result) => result,
                Err(_aborted) => {
                    log::info!("Diagnosis of {operation_id} aborted");
                    Err(Error::Aborted)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::AbortHandle;

    #[test]
    fn aborted_diagnosis_reports_aborted() {
        let manager = ConnectionManager::new().unwrap();
        let _guard = manager.runtime.enter();
        let client = manager
            .runtime
            .block_on(Client::with_uri_str("mongodb://localhost:27017"))
            .unwrap();

        let (handle, registration) = AbortHandle::new_pair();
        handle.abort();
        let result = manager.diagnose_operation_abortable(
            &client,
            "shop",
            "slow-orders",
            DiagnoseOptions::default(),
            registration,
        );
        assert!(matches!(result, Err(Error::Aborted)));
    }
}
