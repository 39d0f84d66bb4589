//! Explain execution against the storage engine.

use std::time::Duration;

use crate::diagnosis::backend::PlanBackend;
use crate::diagnosis::namespace::Namespace;
use crate::diagnosis::plan::{ExplainPlan, parse_explain};
use crate::diagnosis::reconstruct::ExplainRequest;
use crate::error::{Error, Result};

/// Verbosity that reports per-stage counters without running rejected plans.
pub const DEFAULT_VERBOSITY: &str = "executionStats";

/// Explain `request` on `namespace` and parse the returned stage tree.
///
/// Timeouts surface as [`Error::Timeout`]; every other failure, including
/// output without a stage tree, is wrapped in [`Error::ExplainExecution`].
pub async fn execute_plan(
    backend: &dyn PlanBackend,
    namespace: &Namespace,
    request: &ExplainRequest,
    verbosity: &str,
    timeout: Duration,
) -> Result<ExplainPlan> {
    let command = request.to_command(&namespace.collection);
    log::debug!(
        "Explaining {} on {namespace} with verbosity {verbosity}",
        request.operation_type().label()
    );

    let fut = backend.explain(&namespace.database, command, verbosity);
    let explain = match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(Error::explain)?,
        Err(_) => {
            return Err(Error::Timeout(format!(
                "explain on {namespace} did not finish within {} ms",
                timeout.as_millis()
            )));
        }
    };

    parse_explain(&explain).map_err(Error::explain)
}
