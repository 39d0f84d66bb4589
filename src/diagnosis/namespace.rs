//! Namespace resolution for `store.collection` identifiers.

use crate::error::{Error, Result};

/// A resolved `store.collection` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    /// Split on the first `.`; everything after it is the collection name.
    pub fn parse(namespace: &str) -> Result<Self> {
        let Some((database, collection)) = namespace.split_once('.') else {
            return Err(Error::MalformedNamespace(namespace.to_string()));
        };
        if database.is_empty() || collection.is_empty() {
            return Err(Error::MalformedNamespace(namespace.to_string()));
        }
        Ok(Self { database: database.to_string(), collection: collection.to_string() })
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_separator_only() {
        let ns = Namespace::parse("shop.orders.archive").expect("namespace");
        assert_eq!(ns.database, "shop");
        assert_eq!(ns.collection, "orders.archive");
        assert_eq!(ns.to_string(), "shop.orders.archive");
    }

    #[test]
    fn rejects_missing_separator_and_empty_parts() {
        for bad in ["shop", "shop.", ".orders", ""] {
            assert!(matches!(Namespace::parse(bad), Err(Error::MalformedNamespace(_))), "{bad}");
        }
    }
}
