//! Tuning rules evaluated over an extracted plan and its request.
//!
//! Rules are independent: each one looks at the same context and may or may
//! not emit a recommendation. Output order is declaration order.

use mongodb::bson::{Bson, Document};

use crate::bson::document_to_compact_extjson_string;
use crate::diagnosis::reconstruct::ExplainRequest;
use crate::models::{Performance, Priority, Recommendation, RecommendationKind};

pub const DEFAULT_LOW_EFFICIENCY_PERCENT: f64 = 10.0;

/// Rule engine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleConfig {
    /// Threshold compared against the rounded `Performance::efficiency`, so a
    /// plan at 9.6% counts as 10% and passes the default. The recommendation
    /// message still reports the unrounded ratio.
    pub low_efficiency_percent: f64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self { low_efficiency_percent: DEFAULT_LOW_EFFICIENCY_PERCENT }
    }
}

/// Inputs shared by every rule.
pub struct RuleContext<'a> {
    pub performance: &'a Performance,
    pub request: &'a ExplainRequest,
    pub config: RuleConfig,
}

impl RuleContext<'_> {
    fn filter_fields(&self) -> Vec<String> {
        self.request.filter().map(filter_fields).unwrap_or_default()
    }

    fn sort(&self) -> Option<&Document> {
        self.request.sort().filter(|sort| !sort.is_empty())
    }
}

type Rule = fn(&RuleContext) -> Option<Recommendation>;

const RULES: &[Rule] = &[missing_index, sort_index, low_efficiency, blocking_sort];

/// Evaluate every rule in order.
pub fn recommend(ctx: &RuleContext) -> Vec<Recommendation> {
    RULES.iter().filter_map(|rule| rule(ctx)).collect()
}

/// Fields a query predicate constrains: top-level keys that are not
/// operators, plus the fields of each `$and` conjunct, first-seen order.
pub fn filter_fields(filter: &Document) -> Vec<String> {
    let mut fields = Vec::new();
    collect_fields(filter, &mut fields);
    fields
}

fn collect_fields(filter: &Document, out: &mut Vec<String>) {
    for (key, value) in filter {
        if key == "$and" {
            if let Bson::Array(clauses) = value {
                for clause in clauses.iter().filter_map(Bson::as_document) {
                    collect_fields(clause, out);
                }
            }
            continue;
        }
        if key.starts_with('$') || out.contains(key) {
            continue;
        }
        out.push(key.clone());
    }
}

fn ascending_index(fields: &[String]) -> Document {
    let mut index = Document::new();
    for field in fields {
        index.insert(field.clone(), 1);
    }
    index
}

/// Filter fields ascending, then sort keys; a sort key replaces the
/// direction of a filter field with the same name.
fn sort_supporting_index(fields: &[String], sort: &Document) -> Document {
    let mut index = ascending_index(fields);
    for (field, direction) in sort {
        index.insert(field.clone(), direction.clone());
    }
    index
}

fn missing_index(ctx: &RuleContext) -> Option<Recommendation> {
    if !ctx.performance.is_full_scan {
        return None;
    }
    let fields = ctx.filter_fields();
    if fields.is_empty() {
        return None;
    }
    let index = ascending_index(&fields);
    Some(Recommendation {
        kind: RecommendationKind::MissingIndex,
        priority: Priority::High,
        message: format!("Create an index on {}", document_to_compact_extjson_string(&index)),
        reason: format!(
            "The plan scanned the whole collection while filtering on {}.",
            fields.join(", ")
        ),
        suggested_index: Some(index),
    })
}

fn sort_index(ctx: &RuleContext) -> Option<Recommendation> {
    if !ctx.performance.is_full_scan {
        return None;
    }
    let sort = ctx.sort()?;
    let index = sort_supporting_index(&ctx.filter_fields(), sort);
    Some(Recommendation {
        kind: RecommendationKind::SortIndex,
        priority: Priority::Medium,
        message: format!(
            "Create an index on {} to serve both the filter and the sort",
            document_to_compact_extjson_string(&index)
        ),
        reason: "Results were sorted after a full collection scan; an index whose key order \
                 matches the sort avoids the scan and the in-memory sort."
            .to_string(),
        suggested_index: Some(index),
    })
}

fn low_efficiency(ctx: &RuleContext) -> Option<Recommendation> {
    let exact = ctx.performance.exact_efficiency()?;
    if f64::from(ctx.performance.efficiency) >= ctx.config.low_efficiency_percent {
        return None;
    }
    Some(Recommendation {
        kind: RecommendationKind::LowEfficiency,
        priority: Priority::Medium,
        message: format!("Only {exact:.1}% of examined documents were returned"),
        reason: format!(
            "{} documents were examined to return {}; a more selective index would \
             examine fewer.",
            ctx.performance.total_docs_examined, ctx.performance.total_docs_returned
        ),
        suggested_index: None,
    })
}

fn blocking_sort(ctx: &RuleContext) -> Option<Recommendation> {
    if ctx.performance.is_full_scan || !ctx.performance.has_blocking_sort {
        return None;
    }
    let sort = ctx.sort()?;
    let index = sort_supporting_index(&ctx.filter_fields(), sort);
    Some(Recommendation {
        kind: RecommendationKind::BlockingSort,
        priority: Priority::Low,
        message: format!(
            "Extend the index to {} so results come back already sorted",
            document_to_compact_extjson_string(&index)
        ),
        reason: "The plan used an index but still ran a blocking SORT stage in memory."
            .to_string(),
        suggested_index: Some(index),
    })
}
