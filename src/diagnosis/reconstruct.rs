//! Rebuild an explainable request from a profiler entry's logged command.
//!
//! Logged command shapes differ between server versions, so every branch
//! accepts a list of aliases and takes the first one holding a document.
//! Only aggregations fail hard: without a pipeline there is nothing to explain.

use mongodb::bson::{Bson, Document, doc};

use crate::bson::{first_document, first_i64};
use crate::error::{Error, Result};
use crate::models::{OperationType, ProfiledOperation};

const FIND_FILTER_ALIASES: &[&str] = &["filter", "query", "$query"];
const FIND_SORT_ALIASES: &[&str] = &["sort", "$orderby", "orderby"];
const UPDATE_FILTER_ALIASES: &[&str] = &["q", "filter", "query"];
const UPDATE_SPEC_ALIASES: &[&str] = &["u", "update"];
const DELETE_FILTER_ALIASES: &[&str] = &["q", "filter", "query"];
const COUNT_FILTER_ALIASES: &[&str] = &["query", "filter"];
const UNKNOWN_FILTER_ALIASES: &[&str] = &["filter", "query"];

/// A request that can be handed to the explain command.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplainRequest {
    Find { filter: Document, sort: Option<Document>, limit: Option<i64>, skip: Option<i64> },
    Update { filter: Document, update: Bson },
    Delete { filter: Document },
    Count { filter: Document },
    Aggregate { pipeline: Vec<Document> },
    Unknown { filter: Document },
}

impl ExplainRequest {
    /// Reconstruct the request for a profiled operation.
    pub fn reconstruct(operation: &ProfiledOperation) -> Result<Self> {
        let command = &operation.command;
        let request = match operation.operation_type {
            OperationType::Find => reconstruct_find(command),
            OperationType::Update => ExplainRequest::Update {
                filter: filter_or_empty(command, UPDATE_FILTER_ALIASES),
                update: update_spec(command),
            },
            OperationType::Delete => {
                ExplainRequest::Delete { filter: filter_or_empty(command, DELETE_FILTER_ALIASES) }
            }
            OperationType::Count => {
                ExplainRequest::Count { filter: filter_or_empty(command, COUNT_FILTER_ALIASES) }
            }
            OperationType::Aggregate => {
                ExplainRequest::Aggregate { pipeline: aggregate_pipeline(command)? }
            }
            OperationType::Unknown => {
                ExplainRequest::Unknown { filter: filter_or_empty(command, UNKNOWN_FILTER_ALIASES) }
            }
        };
        Ok(request)
    }

    pub fn operation_type(&self) -> OperationType {
        match self {
            ExplainRequest::Find { .. } => OperationType::Find,
            ExplainRequest::Update { .. } => OperationType::Update,
            ExplainRequest::Delete { .. } => OperationType::Delete,
            ExplainRequest::Count { .. } => OperationType::Count,
            ExplainRequest::Aggregate { .. } => OperationType::Aggregate,
            ExplainRequest::Unknown { .. } => OperationType::Unknown,
        }
    }

    /// The predicate of the request; aggregations report their leading `$match`.
    pub fn filter(&self) -> Option<&Document> {
        match self {
            ExplainRequest::Find { filter, .. }
            | ExplainRequest::Update { filter, .. }
            | ExplainRequest::Delete { filter }
            | ExplainRequest::Count { filter }
            | ExplainRequest::Unknown { filter } => Some(filter),
            ExplainRequest::Aggregate { pipeline } => {
                pipeline.first().and_then(|stage| stage.get_document("$match").ok())
            }
        }
    }

    /// The sort specification; aggregations report a `$sort` that directly
    /// follows the leading `$match` (or leads the pipeline).
    pub fn sort(&self) -> Option<&Document> {
        match self {
            ExplainRequest::Find { sort, .. } => sort.as_ref(),
            ExplainRequest::Aggregate { pipeline } => {
                let offset = usize::from(self.filter().is_some());
                pipeline
                    .get(offset)
                    .and_then(|stage| stage.get_document("$sort").ok())
                    .filter(|sort| !sort.is_empty())
            }
            _ => None,
        }
    }

    /// Render the inner command for `collection`. Writes are wrapped in their
    /// batch form; the explain command never applies them.
    pub fn to_command(&self, collection: &str) -> Document {
        match self {
            ExplainRequest::Find { filter, sort, limit, skip } => {
                let mut cmd = doc! { "find": collection, "filter": filter.clone() };
                if let Some(sort) = sort {
                    cmd.insert("sort", sort.clone());
                }
                if let Some(limit) = limit {
                    cmd.insert("limit", *limit);
                }
                if let Some(skip) = skip {
                    cmd.insert("skip", *skip);
                }
                cmd
            }
            ExplainRequest::Update { filter, update } => doc! {
                "update": collection,
                "updates": [{ "q": filter.clone(), "u": update.clone() }],
            },
            ExplainRequest::Delete { filter } => doc! {
                "delete": collection,
                "deletes": [{ "q": filter.clone(), "limit": 0 }],
            },
            ExplainRequest::Count { filter } => {
                doc! { "count": collection, "query": filter.clone() }
            }
            ExplainRequest::Aggregate { pipeline } => doc! {
                "aggregate": collection,
                "pipeline": pipeline.clone(),
                "cursor": {},
            },
            ExplainRequest::Unknown { filter } => {
                doc! { "find": collection, "filter": filter.clone() }
            }
        }
    }
}

fn filter_or_empty(command: &Document, aliases: &[&str]) -> Document {
    first_document(command, aliases).cloned().unwrap_or_default()
}

fn reconstruct_find(command: &Document) -> ExplainRequest {
    let mut filter = filter_or_empty(command, FIND_FILTER_ALIASES);
    let mut sort = first_document(command, FIND_SORT_ALIASES).cloned();

    // Legacy OP_QUERY wrapper: { $query: {...}, $orderby: {...} }
    if let Ok(inner) = filter.get_document("$query") {
        let inner = inner.clone();
        if sort.is_none() {
            sort = first_document(&filter, &["$orderby", "orderby"]).cloned();
        }
        filter = inner;
    }

    // negative ntoreturn means "single batch of |n|"; i64::MIN has no magnitude
    let limit =
        first_i64(command, &["limit", "ntoreturn"]).and_then(i64::checked_abs).filter(|n| *n > 0);
    let skip = first_i64(command, &["skip", "ntoskip"]).filter(|n| *n > 0);

    ExplainRequest::Find { filter, sort: sort.filter(|sort| !sort.is_empty()), limit, skip }
}

fn update_spec(command: &Document) -> Bson {
    UPDATE_SPEC_ALIASES
        .iter()
        .find_map(|key| match command.get(key) {
            Some(value @ (Bson::Document(_) | Bson::Array(_))) => Some(value.clone()),
            _ => None,
        })
        .unwrap_or_else(|| Bson::Document(Document::new()))
}

fn aggregate_pipeline(command: &Document) -> Result<Vec<Document>> {
    let Some(Bson::Array(stages)) = command.get("pipeline") else {
        return Err(Error::UnsupportedAggregation(
            "logged command carries no pipeline array".to_string(),
        ));
    };

    let mut pipeline = Vec::with_capacity(stages.len());
    for (idx, stage) in stages.iter().enumerate() {
        let Some(stage) = stage.as_document() else {
            return Err(Error::UnsupportedAggregation(format!(
                "pipeline stage {} is not a document",
                idx + 1
            )));
        };
        pipeline.push(stage.clone());
    }

    if pipeline.is_empty() {
        return Err(Error::UnsupportedAggregation("pipeline is empty".to_string()));
    }
    Ok(pipeline)
}
