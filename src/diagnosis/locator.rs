//! Historical operation lookup against `system.profile`.

use mongodb::bson::{Document, doc, oid::ObjectId};

use crate::diagnosis::backend::ProfileBackend;
use crate::error::{Error, Result};
use crate::models::ProfiledOperation;

/// One way of matching an operator-supplied identifier to a profiler entry.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupStrategy {
    /// Exact `_id` match; only offered when the key is a valid ObjectId.
    ObjectIdExact(ObjectId),
    /// Literal `_id` string or a comment attached to the logged command.
    LiteralOrComment(String),
}

impl LookupStrategy {
    /// Strategies for `key`, in the order they should be tried.
    pub fn plan(key: &str) -> Vec<LookupStrategy> {
        let mut strategies = Vec::with_capacity(2);
        if let Ok(oid) = ObjectId::parse_str(key) {
            strategies.push(LookupStrategy::ObjectIdExact(oid));
        }
        strategies.push(LookupStrategy::LiteralOrComment(key.to_string()));
        strategies
    }

    pub fn filter(&self) -> Document {
        match self {
            LookupStrategy::ObjectIdExact(oid) => doc! { "_id": *oid },
            LookupStrategy::LiteralOrComment(key) => doc! {
                "$or": [
                    { "_id": key.as_str() },
                    { "command.comment": key.as_str() },
                    { "query.comment": key.as_str() },
                ]
            },
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LookupStrategy::ObjectIdExact(_) => "objectId",
            LookupStrategy::LiteralOrComment(_) => "literal/comment",
        }
    }
}

/// Locate exactly one profiled operation in `database` by `key`.
pub async fn locate_operation(
    backend: &dyn ProfileBackend,
    database: &str,
    key: &str,
) -> Result<ProfiledOperation> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::NotFound("empty operation identifier".to_string()));
    }

    for strategy in LookupStrategy::plan(key) {
        let matches = backend.find_profiled(database, strategy.filter(), 2).await?;
        let Some(entry) = matches.first() else {
            log::debug!("No profiler entry for {key} via {} lookup", strategy.label());
            continue;
        };
        if matches.len() > 1 {
            log::warn!(
                "Identifier {key} matched several profiler entries via {} lookup; using the newest",
                strategy.label()
            );
        }
        log::debug!("Located {key} in {database}.system.profile via {} lookup", strategy.label());
        return Ok(ProfiledOperation::from_profile_document(entry, key));
    }

    Err(Error::NotFound(format!("{key} in {database}.system.profile")))
}
