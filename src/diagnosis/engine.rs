//! Orchestrates locate → reconstruct → explain → extract → recommend.

use std::time::Duration;

use crate::diagnosis::backend::{PlanBackend, ProfileBackend};
use crate::diagnosis::executor::{DEFAULT_VERBOSITY, execute_plan};
use crate::diagnosis::extract::extract;
use crate::diagnosis::locator::locate_operation;
use crate::diagnosis::namespace::Namespace;
use crate::diagnosis::recommend::{RuleConfig, RuleContext, recommend};
use crate::diagnosis::reconstruct::ExplainRequest;
use crate::error::{Error, Result};
use crate::models::{Diagnostic, DiagnosticResponse, DiagnosticStage, OperationContext};

pub const DEFAULT_EXPLAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnoseOptions {
    pub explain_timeout: Duration,
    pub verbosity: String,
    pub rules: RuleConfig,
}

impl Default for DiagnoseOptions {
    fn default() -> Self {
        Self {
            explain_timeout: DEFAULT_EXPLAIN_TIMEOUT,
            verbosity: DEFAULT_VERBOSITY.to_string(),
            rules: RuleConfig::default(),
        }
    }
}

/// Stateless diagnostic pipeline over a profiling log and an explain backend.
pub struct DiagnosticEngine<'a> {
    profiles: &'a dyn ProfileBackend,
    plans: &'a dyn PlanBackend,
    options: DiagnoseOptions,
}

impl<'a> DiagnosticEngine<'a> {
    pub fn new(
        profiles: &'a dyn ProfileBackend,
        plans: &'a dyn PlanBackend,
        options: DiagnoseOptions,
    ) -> Self {
        Self { profiles, plans, options }
    }

    /// Diagnose the operation identified by `operation_id` in the profiling
    /// log of `database`.
    ///
    /// Lookup and namespace failures are returned as errors. Anything that
    /// goes wrong afterwards yields a response with `success: false` that
    /// still carries the operation context.
    pub async fn diagnose(&self, database: &str, operation_id: &str) -> Result<DiagnosticResponse> {
        let operation = locate_operation(self.profiles, database, operation_id).await?;
        let namespace = Namespace::parse(&operation.namespace)?;

        let mut response = DiagnosticResponse {
            success: false,
            stage: DiagnosticStage::Located,
            operation: OperationContext {
                id: operation.id.clone(),
                timestamp: operation.timestamp,
                namespace: operation.namespace.clone(),
                database: namespace.database.clone(),
                collection: namespace.collection.clone(),
                operation_type: operation.operation_type,
                command: operation.command.clone(),
                metrics: operation.metrics.clone(),
                plan_summary: operation.plan_summary.clone(),
                client: operation.client.clone(),
                user: operation.user.clone(),
            },
            diagnostic: None,
            error: None,
        };

        let request = match ExplainRequest::reconstruct(&operation) {
            Ok(request) => request,
            Err(err) => return degrade(response, err),
        };
        response.operation.command = request.to_command(&namespace.collection);
        response.stage = DiagnosticStage::Reconstructed;

        let plan = match execute_plan(
            self.plans,
            &namespace,
            &request,
            &self.options.verbosity,
            self.options.explain_timeout,
        )
        .await
        {
            Ok(plan) => plan,
            Err(err) => return degrade(response, err),
        };
        response.stage = DiagnosticStage::Executed;

        let extracted = extract(&plan);
        response.stage = DiagnosticStage::Extracted;
        log::debug!(
            "Extracted {} stages for {} (efficiency {}%, full scan: {})",
            extracted.stages.len(),
            operation.id,
            extracted.performance.efficiency,
            extracted.performance.is_full_scan
        );

        let recommendations = recommend(&RuleContext {
            performance: &extracted.performance,
            request: &request,
            config: self.options.rules,
        });
        response.stage = DiagnosticStage::Recommended;
        response.success = true;
        response.diagnostic = Some(Diagnostic {
            performance: extracted.performance,
            stages: extracted.stages,
            recommendations,
        });
        Ok(response)
    }
}

fn degrade(mut response: DiagnosticResponse, err: Error) -> Result<DiagnosticResponse> {
    if !err.is_recoverable() {
        return Err(err);
    }
    log::warn!(
        "Partial diagnostic for {} after {:?}: {err}",
        response.operation.id,
        response.stage
    );
    response.success = false;
    response.diagnostic = None;
    response.error = Some(err.to_string());
    Ok(response)
}
