// Diagnostic output types (ephemeral, never persisted)

use chrono::{DateTime, Utc};
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

use super::operation::{ObservedMetrics, OperationType};

/// Normalized performance block extracted from a stage tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub execution_time_ms: Option<u64>,
    pub total_keys_examined: u64,
    pub total_docs_examined: u64,
    pub total_docs_returned: u64,
    pub indexes_used: Vec<String>,
    pub is_full_scan: bool,
    pub efficiency: u8,
    pub has_blocking_sort: bool,
    pub is_covered: bool,
}

impl Performance {
    /// Unrounded returned/examined percentage, when both counters are positive.
    pub fn exact_efficiency(&self) -> Option<f64> {
        if self.total_docs_examined == 0 || self.total_docs_returned == 0 {
            return None;
        }
        Some(100.0 * self.total_docs_returned as f64 / self.total_docs_examined as f64)
    }
}

/// One entry of the pre-order flattened stage list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatStage {
    pub stage: String,
    pub depth: usize,
    pub n_returned: Option<u64>,
    pub docs_examined: Option<u64>,
    pub keys_examined: Option<u64>,
    pub works: Option<u64>,
    pub advanced: Option<u64>,
    pub is_eof: Option<bool>,
    pub execution_time_ms: Option<u64>,
    pub index_name: Option<String>,
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    MissingIndex,
    SortIndex,
    LowEfficiency,
    BlockingSort,
}

/// A tuning suggestion emitted by the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub message: String,
    pub reason: String,
    pub suggested_index: Option<Document>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub performance: Performance,
    pub stages: Vec<FlatStage>,
    pub recommendations: Vec<Recommendation>,
}

/// Pipeline position reached while assembling a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStage {
    Located,
    Reconstructed,
    Executed,
    Extracted,
    Recommended,
}

/// Identity of the diagnosed operation, kept even when diagnosis fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationContext {
    pub id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub namespace: String,
    pub database: String,
    pub collection: String,
    pub operation_type: OperationType,
    pub command: Document,
    pub metrics: ObservedMetrics,
    pub plan_summary: Option<String>,
    pub client: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResponse {
    pub success: bool,
    pub stage: DiagnosticStage,
    pub operation: OperationContext,
    pub diagnostic: Option<Diagnostic>,
    pub error: Option<String>,
}

impl DiagnosticResponse {
    pub fn is_partial(&self) -> bool {
        !self.success
    }
}
