//! Derive ids for objects that do not declare one
//!
//! Runs on the raw document before parsing: schema `#<name>`, table
//! `#<table>`, column and column group `#<table>.<name>`, constraint and
//! index `#<name>`. Derived ids go through the same uniqueness check as
//! declared ones.

use serde_json::{Map, Value};
use tracing::debug;

fn name_of(map: &Map<String, Value>) -> Option<String> {
    map.get("name").and_then(Value::as_str).map(str::to_string)
}

fn assign(map: &mut Map<String, Value>, id: impl FnOnce(&str) -> String) {
    if map.contains_key("@id") {
        return;
    }
    if let Some(name) = name_of(map) {
        let generated = id(&name);
        debug!(id = %generated, "Generated id");
        map.insert("@id".to_string(), Value::String(generated));
    }
}

fn each_object<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a mut Map<String, Value>> + 'a {
    map.get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

/// Return a copy of `document` with ids filled in where missing
pub fn generate_ids(document: &Value) -> Value {
    let mut document = document.clone();
    let Some(root) = document.as_object_mut() else {
        return document;
    };

    assign(root, |name| format!("#{}", name));

    for table in each_object(root, "tables") {
        assign(table, |name| format!("#{}", name));
        let Some(table_name) = name_of(table) else {
            continue;
        };
        for column in each_object(table, "columns") {
            assign(column, |name| format!("#{}.{}", table_name, name));
        }
        for group in each_object(table, "columnGroups") {
            assign(group, |name| format!("#{}.{}", table_name, name));
        }
        for constraint in each_object(table, "constraints") {
            assign(constraint, |name| format!("#{}", name));
        }
        for index in each_object(table, "indexes") {
            assign(index, |name| format!("#{}", name));
        }
    }
    document
}
