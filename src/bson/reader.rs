//! Tolerant accessors for documents whose shape varies across server versions.

use mongodb::bson::{Bson, Document};

/// Read a non-negative integer counter stored as Int32, Int64 or Double.
pub fn read_u64(doc: &Document, key: &str) -> Option<u64> {
    let value = doc.get(key)?;
    match value {
        Bson::Int32(v) if *v >= 0 => Some(*v as u64),
        Bson::Int64(v) if *v >= 0 => Some(*v as u64),
        Bson::Double(v) if *v >= 0.0 => Some(*v as u64),
        _ => None,
    }
}

/// Read a signed integer stored as Int32, Int64 or an integral Double.
pub fn read_i64(doc: &Document, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

pub fn read_bool(doc: &Document, key: &str) -> Option<bool> {
    match doc.get(key)? {
        Bson::Boolean(value) => Some(*value),
        _ => None,
    }
}

pub fn read_str<'a>(doc: &'a Document, key: &str) -> Option<&'a str> {
    doc.get_str(key).ok()
}

/// Return the first alias whose value is a document.
pub fn first_document<'a>(doc: &'a Document, aliases: &[&str]) -> Option<&'a Document> {
    aliases.iter().find_map(|key| doc.get_document(key).ok())
}

/// Return the first alias holding a non-negative counter.
pub fn first_u64(doc: &Document, aliases: &[&str]) -> Option<u64> {
    aliases.iter().find_map(|key| read_u64(doc, key))
}

/// Return the first alias holding an integer.
pub fn first_i64(doc: &Document, aliases: &[&str]) -> Option<i64> {
    aliases.iter().find_map(|key| read_i64(doc, key))
}

/// Render a scalar identifier (`_id`, comment) as a plain string.
pub fn bson_to_identifier(value: &Bson) -> Option<String> {
    match value {
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) if !s.is_empty() => Some(s.clone()),
        Bson::Int32(v) => Some(v.to_string()),
        Bson::Int64(v) => Some(v.to_string()),
        _ => None,
    }
}
