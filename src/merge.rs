//! Merging of schema documents
//!
//! Later documents override earlier ones. Objects are matched by `@id` at
//! every level: a matching object has its keys overwritten one by one, an
//! unmatched one is appended. Everything else is replaced wholesale.

use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("No documents to merge")]
    Empty,
    #[error("Document {index} is not a mapping")]
    NotAMapping { index: usize },
}

/// Merge documents in order
///
/// # Example
///
/// ```rust
/// use schema_catalog_sdk::merge::merge_documents;
/// use serde_json::json;
///
/// let base = json!({"name": "sales", "@id": "#sales", "tables": [
///     {"name": "customers", "@id": "#customers", "description": "old"}
/// ]});
/// let overlay = json!({"@id": "#sales", "tables": [
///     {"@id": "#customers", "description": "new"}
/// ]});
///
/// let merged = merge_documents(&[base, overlay]).unwrap();
/// assert_eq!(merged["tables"][0]["name"], "customers");
/// assert_eq!(merged["tables"][0]["description"], "new");
/// ```
pub fn merge_documents(documents: &[Value]) -> Result<Value, MergeError> {
    let (first, rest) = documents.split_first().ok_or(MergeError::Empty)?;
    let mut merged = first
        .as_object()
        .cloned()
        .ok_or(MergeError::NotAMapping { index: 0 })?;

    for (offset, document) in rest.iter().enumerate() {
        let overlay = document
            .as_object()
            .ok_or(MergeError::NotAMapping { index: offset + 1 })?;
        merge_objects(&mut merged, overlay);
    }
    Ok(Value::Object(merged))
}

fn merge_objects(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    if let Some(id) = overlay.get("@id").and_then(Value::as_str) {
        debug!(id = %id, "Overwriting");
    }
    for (key, value) in overlay {
        let by_id = matches!(
            (base.get(key), value),
            (Some(Value::Array(existing)), Value::Array(incoming))
                if has_ids(existing) && has_ids(incoming)
        );
        if by_id
            && let (Some(Value::Array(existing)), Value::Array(incoming)) =
                (base.get_mut(key), value)
        {
            merge_lists(existing, incoming);
        } else {
            base.insert(key.clone(), value.clone());
        }
    }
}

fn id_of(value: &Value) -> Option<&str> {
    value.get("@id").and_then(Value::as_str)
}

fn has_ids(items: &[Value]) -> bool {
    items.iter().all(|v| id_of(v).is_some())
}

fn merge_lists(existing: &mut Vec<Value>, incoming: &[Value]) {
    for item in incoming {
        let position = existing.iter().position(|e| id_of(e) == id_of(item));
        match (position, item.as_object()) {
            (Some(i), Some(overlay)) => {
                if let Some(target) = existing[i].as_object_mut() {
                    merge_objects(target, overlay);
                }
            }
            _ => existing.push(item.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_override_by_id() {
        let base = json!({
            "name": "sales",
            "@id": "#sales",
            "tables": [{
                "name": "customers",
                "@id": "#customers",
                "columns": [
                    {"name": "name", "@id": "#customers.name", "datatype": "string", "length": 30}
                ]
            }]
        });
        let overlay = json!({
            "@id": "#sales",
            "description": "merged",
            "tables": [
                {"@id": "#customers", "columns": [
                    {"@id": "#customers.name", "length": 64},
                    {"name": "email", "@id": "#customers.email", "datatype": "string", "length": 64}
                ]},
                {"name": "orders", "@id": "#orders", "columns": []}
            ]
        });

        let merged = merge_documents(&[base, overlay]).unwrap();
        assert_eq!(merged["description"], "merged");
        let columns = merged["tables"][0]["columns"].as_array().unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0]["length"], 64);
        assert_eq!(columns[0]["datatype"], "string");
        assert_eq!(merged["tables"][1]["name"], "orders");
    }

    #[test]
    fn test_plain_lists_replaced() {
        let base = json!({"@id": "#s", "tables": [{"@id": "#t", "primaryKey": ["#t.a"]}]});
        let overlay = json!({"tables": [{"@id": "#t", "primaryKey": ["#t.b"]}]});
        let merged = merge_documents(&[base, overlay]).unwrap();
        assert_eq!(merged["tables"][0]["primaryKey"], json!(["#t.b"]));
    }

    #[test]
    fn test_errors() {
        assert_eq!(merge_documents(&[]), Err(MergeError::Empty));
        assert_eq!(
            merge_documents(&[json!({}), json!([1])]),
            Err(MergeError::NotAMapping { index: 1 })
        );
    }
}
