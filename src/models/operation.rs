// Profiled operation records read from `system.profile`

use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::bson::{bson_to_identifier, first_document, first_u64, read_str};

/// Operation type tag of a profiled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Find,
    Update,
    Delete,
    Count,
    Aggregate,
    Unknown,
}

impl OperationType {
    /// Classify a profiler entry from its `op` tag and, for generic
    /// `command` entries, the name of the logged command.
    pub fn from_profile(op: &str, command: &Document) -> Self {
        match op.to_ascii_lowercase().as_str() {
            "query" | "find" => OperationType::Find,
            "update" => OperationType::Update,
            "remove" | "delete" => OperationType::Delete,
            "count" => OperationType::Count,
            "aggregate" => OperationType::Aggregate,
            "command" => command
                .keys()
                .next()
                .map(|name| Self::from_command(name, command))
                .unwrap_or(OperationType::Unknown),
            _ => OperationType::Unknown,
        }
    }

    fn from_command(name: &str, command: &Document) -> Self {
        match name {
            "find" => OperationType::Find,
            // findAndModify with `remove: true` deletes the matched document
            "findAndModify" | "findandmodify" if command.get_bool("remove").unwrap_or(false) => {
                OperationType::Delete
            }
            "update" | "findAndModify" | "findandmodify" => OperationType::Update,
            "delete" => OperationType::Delete,
            "count" => OperationType::Count,
            "aggregate" => OperationType::Aggregate,
            _ => OperationType::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OperationType::Find => "find",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
            OperationType::Count => "count",
            OperationType::Aggregate => "aggregate",
            OperationType::Unknown => "unknown",
        }
    }
}

/// Metrics the profiler observed when the operation originally ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedMetrics {
    pub millis: Option<u64>,
    pub keys_examined: Option<u64>,
    pub docs_examined: Option<u64>,
    pub docs_returned: Option<u64>,
}

/// An immutable historical operation record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfiledOperation {
    pub id: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub operation_type: OperationType,
    pub namespace: String,
    pub command: Document,
    pub metrics: ObservedMetrics,
    pub client: Option<String>,
    pub user: Option<String>,
    pub plan_summary: Option<String>,
}

impl ProfiledOperation {
    /// Build a record from a raw profiler document. `lookup_key` is used as the
    /// identifier when the entry carries neither `_id` nor a comment.
    pub fn from_profile_document(doc: &Document, lookup_key: &str) -> Self {
        let command = first_document(doc, &["command", "query"]).cloned().unwrap_or_default();
        let op = read_str(doc, "op").unwrap_or_default();
        let operation_type = OperationType::from_profile(op, &command);

        let id = doc
            .get("_id")
            .and_then(bson_to_identifier)
            .or_else(|| command.get("comment").and_then(bson_to_identifier))
            .unwrap_or_else(|| lookup_key.to_string());

        let timestamp = match doc.get("ts") {
            Some(Bson::DateTime(ts)) => {
                DateTime::<Utc>::from_timestamp_millis(ts.timestamp_millis())
            }
            _ => None,
        };

        let metrics = ObservedMetrics {
            millis: first_u64(doc, &["millis"]),
            keys_examined: first_u64(doc, &["keysExamined", "nscanned"]),
            docs_examined: first_u64(doc, &["docsExamined", "nscannedObjects"]),
            docs_returned: first_u64(doc, &["nreturned", "nReturned"]),
        };

        Self {
            id,
            timestamp,
            operation_type,
            namespace: read_str(doc, "ns").unwrap_or_default().to_string(),
            command,
            metrics,
            client: read_str(doc, "client").map(ToString::to_string),
            user: read_str(doc, "user").map(ToString::to_string),
            plan_summary: read_str(doc, "planSummary").map(ToString::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{DateTime as BsonDateTime, doc, oid::ObjectId};

    use super::*;

    #[test]
    fn parses_modern_find_profile_entry() {
        let oid = ObjectId::new();
        let entry = doc! {
            "_id": oid,
            "op": "query",
            "ns": "shop.orders",
            "command": { "find": "orders", "filter": { "status": "pending" } },
            "millis": 420,
            "keysExamined": 0,
            "docsExamined": 50000,
            "nreturned": 3,
            "planSummary": "COLLSCAN",
            "client": "10.0.0.4",
            "user": "app@admin",
            "ts": BsonDateTime::from_millis(1_700_000_000_000),
        };

        let op = ProfiledOperation::from_profile_document(&entry, "ignored");
        assert_eq!(op.id, oid.to_hex());
        assert_eq!(op.operation_type, OperationType::Find);
        assert_eq!(op.namespace, "shop.orders");
        assert_eq!(op.metrics.millis, Some(420));
        assert_eq!(op.metrics.docs_examined, Some(50000));
        assert_eq!(op.metrics.docs_returned, Some(3));
        assert_eq!(op.plan_summary.as_deref(), Some("COLLSCAN"));
        assert_eq!(op.timestamp.map(|ts| ts.timestamp_millis()), Some(1_700_000_000_000));
    }

    #[test]
    fn command_entries_dispatch_on_command_name() {
        let aggregate = doc! { "aggregate": "orders", "pipeline": [] };
        assert_eq!(OperationType::from_profile("command", &aggregate), OperationType::Aggregate);
        let count = doc! { "count": "orders", "query": {} };
        assert_eq!(OperationType::from_profile("command", &count), OperationType::Count);
        let other = doc! { "listIndexes": "orders" };
        assert_eq!(OperationType::from_profile("command", &other), OperationType::Unknown);
        assert_eq!(OperationType::from_profile("getmore", &other), OperationType::Unknown);
        assert_eq!(OperationType::from_profile("remove", &other), OperationType::Delete);

        let modify =
            doc! { "findAndModify": "orders", "query": {}, "update": { "$inc": { "n": 1 } } };
        assert_eq!(OperationType::from_profile("command", &modify), OperationType::Update);
        let removal = doc! { "findAndModify": "orders", "query": {}, "remove": true };
        assert_eq!(OperationType::from_profile("command", &removal), OperationType::Delete);
    }

    #[test]
    fn falls_back_to_comment_then_lookup_key_for_identifier() {
        let entry =
            doc! { "op": "update", "ns": "a.b", "command": { "q": {}, "comment": "nightly" } };
        assert_eq!(ProfiledOperation::from_profile_document(&entry, "x").id, "nightly");

        let entry = doc! { "op": "update", "ns": "a.b", "command": { "q": {} } };
        assert_eq!(ProfiledOperation::from_profile_document(&entry, "x").id, "x");
    }

    #[test]
    fn legacy_entries_use_query_and_nscanned() {
        let entry = doc! {
            "op": "query",
            "ns": "a.b",
            "query": { "$query": { "x": 1 } },
            "nscanned": 10,
            "nscannedObjects": 12,
        };
        let op = ProfiledOperation::from_profile_document(&entry, "x");
        assert_eq!(op.command, doc! { "$query": { "x": 1 } });
        assert_eq!(op.metrics.keys_examined, Some(10));
        assert_eq!(op.metrics.docs_examined, Some(12));
    }
}
