//! Human-readable and JSON rendering of diagnostic responses.

use std::fmt::Write as _;

use crate::bson::{document_to_compact_extjson_string, truncate_for_preview};
use crate::error::Result;
use crate::helpers::{format_millis, format_number, format_optional_number};
use crate::models::{Diagnostic, DiagnosticResponse, OperationContext};

const COMMAND_PREVIEW_LEN: usize = 160;

/// Output format for rendered responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

pub fn render(response: &DiagnosticResponse, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(response)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(response)?),
    }
}

pub fn render_text(response: &DiagnosticResponse) -> String {
    let mut out = String::new();
    write_operation(&mut out, &response.operation);

    match (&response.diagnostic, &response.error) {
        (Some(diagnostic), _) => write_diagnostic(&mut out, diagnostic),
        (None, error) => {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Diagnosis incomplete (stopped after {:?}): {}",
                response.stage,
                error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    out
}

fn write_operation(out: &mut String, op: &OperationContext) {
    let _ = writeln!(out, "Operation {} ({})", op.id, op.operation_type.label());
    let _ = writeln!(out, "  namespace:  {}", op.namespace);
    if let Some(ts) = op.timestamp {
        let _ = writeln!(out, "  logged at:  {}", ts.to_rfc3339());
    }
    let _ = writeln!(
        out,
        "  observed:   {} | docs examined {} | keys examined {} | returned {}",
        format_millis(op.metrics.millis),
        format_optional_number(op.metrics.docs_examined),
        format_optional_number(op.metrics.keys_examined),
        format_optional_number(op.metrics.docs_returned),
    );
    if let Some(plan) = &op.plan_summary {
        let _ = writeln!(out, "  plan then:  {plan}");
    }
    let command = document_to_compact_extjson_string(&op.command);
    let _ = writeln!(out, "  command:    {}", truncate_for_preview(&command, COMMAND_PREVIEW_LEN));
}

fn write_diagnostic(out: &mut String, diagnostic: &Diagnostic) {
    let perf = &diagnostic.performance;
    let _ = writeln!(out);
    let _ = writeln!(out, "Plan now");
    let _ = writeln!(
        out,
        "  {} | docs examined {} | keys examined {} | returned {} | efficiency {}%",
        format_millis(perf.execution_time_ms),
        format_number(perf.total_docs_examined),
        format_number(perf.total_keys_examined),
        format_number(perf.total_docs_returned),
        perf.efficiency,
    );
    let indexes = if perf.indexes_used.is_empty() {
        "none".to_string()
    } else {
        perf.indexes_used.join(", ")
    };
    let _ = writeln!(
        out,
        "  indexes: {indexes}{}{}",
        if perf.is_full_scan { " | FULL COLLECTION SCAN" } else { "" },
        if perf.is_covered { " | covered" } else { "" },
    );

    let _ = writeln!(out);
    let _ = writeln!(out, "Stages");
    for stage in &diagnostic.stages {
        let mut line = format!("  {}{}", "  ".repeat(stage.depth), stage.stage);
        if let Some(index) = &stage.index_name {
            let _ = write!(line, " [{index}]");
        }
        if let Some(docs) = stage.docs_examined {
            let _ = write!(line, " docs={}", format_number(docs));
        }
        if let Some(keys) = stage.keys_examined {
            let _ = write!(line, " keys={}", format_number(keys));
        }
        if let Some(returned) = stage.n_returned {
            let _ = write!(line, " out={}", format_number(returned));
        }
        let _ = writeln!(out, "{line}");
    }

    let _ = writeln!(out);
    if diagnostic.recommendations.is_empty() {
        let _ = writeln!(out, "No recommendations.");
        return;
    }
    let _ = writeln!(out, "Recommendations");
    for rec in &diagnostic.recommendations {
        let _ = writeln!(out, "  [{}] {}", rec.priority.label(), rec.message);
        let _ = writeln!(out, "         {}", rec.reason);
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use super::*;
    use crate::models::{
        DiagnosticStage, FlatStage, ObservedMetrics, OperationType, Performance, Priority,
        Recommendation, RecommendationKind,
    };

    fn context() -> OperationContext {
        OperationContext {
            id: "checkout-slow".to_string(),
            timestamp: None,
            namespace: "shop.orders".to_string(),
            database: "shop".to_string(),
            collection: "orders".to_string(),
            operation_type: OperationType::Find,
            command: doc! { "find": "orders", "filter": { "status": "pending" } },
            metrics: ObservedMetrics {
                millis: Some(420),
                keys_examined: Some(0),
                docs_examined: Some(50_000),
                docs_returned: Some(3),
            },
            plan_summary: Some("COLLSCAN".to_string()),
            client: None,
            user: None,
        }
    }

    #[test]
    fn text_report_lists_stages_and_recommendations() {
        let response = DiagnosticResponse {
            success: true,
            stage: DiagnosticStage::Recommended,
            operation: context(),
            diagnostic: Some(Diagnostic {
                performance: Performance {
                    execution_time_ms: Some(38),
                    total_docs_examined: 50_000,
                    total_docs_returned: 3,
                    is_full_scan: true,
                    ..Performance::default()
                },
                stages: vec![FlatStage { stage: "COLLSCAN".to_string(), ..FlatStage::default() }],
                recommendations: vec![Recommendation {
                    kind: RecommendationKind::MissingIndex,
                    priority: Priority::High,
                    message: "Create an index on {\"status\":1}".to_string(),
                    reason: "scan".to_string(),
                    suggested_index: Some(doc! { "status": 1 }),
                }],
            }),
            error: None,
        };

        let text = render_text(&response);
        assert!(text.contains("Operation checkout-slow (find)"));
        assert!(text.contains("docs examined 50,000"));
        assert!(text.contains("FULL COLLECTION SCAN"));
        assert!(text.contains("  COLLSCAN"));
        assert!(text.contains("[high] Create an index on {\"status\":1}"));
    }

    #[test]
    fn partial_report_shows_error() {
        let response = DiagnosticResponse {
            success: false,
            stage: DiagnosticStage::Reconstructed,
            operation: context(),
            diagnostic: None,
            error: Some("Explain failed: ns does not exist".to_string()),
        };
        let text = render_text(&response);
        assert!(text.contains("stopped after Reconstructed"));
        assert!(text.contains("ns does not exist"));

        let json = render(&response, ReportFormat::Json).expect("json");
        assert!(json.contains("\"success\": false"));
    }
}
