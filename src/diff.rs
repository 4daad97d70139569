//! Structural comparison of schemas
//!
//! Both sides are compared in their document shape. Lists of objects
//! (tables, columns, constraints, indexes, column groups) are matched by
//! `@id`, then by `name`; other lists are compared as a whole.

use crate::models::Schema;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Changed => "changed",
        })
    }
}

/// One structural difference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference {
    /// Location, e.g. `tables[#customers].columns[#customers.name].length`
    pub path: String,
    pub kind: ChangeKind,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<Value>| v.as_ref().map(Value::to_string).unwrap_or_default();
        match self.kind {
            ChangeKind::Added => write!(f, "added {}: {}", self.path, show(&self.new)),
            ChangeKind::Removed => write!(f, "removed {}: {}", self.path, show(&self.old)),
            ChangeKind::Changed => write!(
                f,
                "changed {}: {} -> {}",
                self.path,
                show(&self.old),
                show(&self.new)
            ),
        }
    }
}

/// Ordered differences between two schemas
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[must_use = "a diff should be inspected or reported"]
pub struct SchemaDiff {
    pub differences: Vec<Difference>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Difference> + '_ {
        self.differences.iter()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for difference in &self.differences {
            writeln!(f, "{}", difference)?;
        }
        Ok(())
    }
}

/// Compare two schemas
///
/// # Example
///
/// ```rust
/// use schema_catalog_sdk::diff::{diff, ChangeKind};
/// use schema_catalog_sdk::validation::SchemaValidator;
///
/// let doc = |length: u32| {
///     format!(
///         r##"
/// name: sales
/// "@id": "#sales"
/// tables:
///   - name: customers
///     "@id": "#customers"
///     columns:
///       - name: name
///         "@id": "#customers.name"
///         datatype: string
///         length: {}
/// "##,
///         length
///     )
/// };
/// let validator = SchemaValidator::default();
/// let a = validator.validate_str(&doc(30)).unwrap();
/// let b = validator.validate_str(&doc(40)).unwrap();
///
/// let changes = diff(&a, &b);
/// assert_eq!(changes.differences[0].kind, ChangeKind::Changed);
/// assert_eq!(
///     changes.differences[0].path,
///     "tables[#customers].columns[#customers.name].length"
/// );
/// ```
pub fn diff(a: &Schema, b: &Schema) -> SchemaDiff {
    diff_documents(&a.to_document(), &b.to_document())
}

/// Compare two documents in schema shape
pub fn diff_documents(a: &Value, b: &Value) -> SchemaDiff {
    let mut differences = Vec::new();
    compare(String::new(), a, b, &mut differences);
    SchemaDiff { differences }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn compare(path: String, a: &Value, b: &Value, out: &mut Vec<Difference>) {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => compare_objects(&path, a, b, out),
        (Value::Array(a), Value::Array(b)) if is_keyed(a) && is_keyed(b) => {
            compare_keyed(&path, a, b, out)
        }
        _ if a == b => {}
        _ => out.push(Difference {
            path,
            kind: ChangeKind::Changed,
            old: Some(a.clone()),
            new: Some(b.clone()),
        }),
    }
}

fn compare_objects(
    path: &str,
    a: &Map<String, Value>,
    b: &Map<String, Value>,
    out: &mut Vec<Difference>,
) {
    for (key, old) in a {
        match b.get(key) {
            Some(new) => compare(child_path(path, key), old, new, out),
            None => out.push(Difference {
                path: child_path(path, key),
                kind: ChangeKind::Removed,
                old: Some(old.clone()),
                new: None,
            }),
        }
    }
    for (key, new) in b {
        if !a.contains_key(key) {
            out.push(Difference {
                path: child_path(path, key),
                kind: ChangeKind::Added,
                old: None,
                new: Some(new.clone()),
            });
        }
    }
}

fn field<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str)
}

/// Non-empty list whose items are all objects carrying an `@id` or `name`
fn is_keyed(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|v| v.is_object() && (field(v, "@id").is_some() || field(v, "name").is_some()))
}

fn item_key(value: &Value) -> String {
    field(value, "@id")
        .or_else(|| field(value, "name"))
        .unwrap_or_default()
        .to_string()
}

fn compare_keyed(path: &str, a: &[Value], b: &[Value], out: &mut Vec<Difference>) {
    let mut matched = vec![false; b.len()];

    let mut pairs: Vec<Option<usize>> = a
        .iter()
        .map(|old| {
            let id = field(old, "@id")?;
            let position = b.iter().position(|new| field(new, "@id") == Some(id))?;
            matched[position] = true;
            Some(position)
        })
        .collect();

    // Fall back to names for items whose ids differ
    for (i, old) in a.iter().enumerate() {
        if pairs[i].is_some() {
            continue;
        }
        if let Some(name) = field(old, "name")
            && let Some(position) = b
                .iter()
                .enumerate()
                .position(|(j, new)| !matched[j] && field(new, "name") == Some(name))
        {
            matched[position] = true;
            pairs[i] = Some(position);
        }
    }

    for (old, pair) in a.iter().zip(&pairs) {
        let item_path = format!("{}[{}]", path, item_key(old));
        match pair {
            Some(j) => compare(item_path, old, &b[*j], out),
            None => out.push(Difference {
                path: item_path,
                kind: ChangeKind::Removed,
                old: Some(old.clone()),
                new: None,
            }),
        }
    }
    for (new, seen) in b.iter().zip(&matched) {
        if !seen {
            out.push(Difference {
                path: format!("{}[{}]", path, item_key(new)),
                kind: ChangeKind::Added,
                old: None,
                new: Some(new.clone()),
            });
        }
    }
}
