//! BSON formatting for reports.

use mongodb::bson::{Bson, Document};

/// Convert a BSON document to a single-line relaxed Extended JSON string.
pub fn document_to_compact_extjson_string(doc: &Document) -> String {
    Bson::Document(doc.clone()).into_relaxed_extjson().to_string()
}

/// Truncate a string for preview display, adding ellipsis if needed.
pub fn truncate_for_preview(input: &str, max_len: usize) -> String {
    if input.chars().count() <= max_len {
        return input.to_string();
    }

    let mut output = String::new();
    for (idx, ch) in input.chars().enumerate() {
        if idx >= max_len.saturating_sub(3) {
            break;
        }
        output.push(ch);
    }
    output.push_str("...");
    output
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate_for_preview("abc", 10), "abc");
        assert_eq!(truncate_for_preview("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn compact_extjson_is_single_line() {
        let rendered = document_to_compact_extjson_string(&doc! { "status": "pending" });
        assert_eq!(rendered, r#"{"status":"pending"}"#);
    }
}
