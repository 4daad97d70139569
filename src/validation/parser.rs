//! Structural parse of a document tree into schema objects
//!
//! Field defaults are applied here and unrecognized keys are rejected.
//! Namespaced keys (`prefix:attribute`) not consumed by a typed field are
//! kept in the object's extension map. Objects missing a required field are
//! dropped from the tree; their ids are remembered so later stages do not
//! report references to them a second time.

use super::error::{ErrorKind, IssueLog};
use super::index::{IndexEntry, ObjectKind};
use super::path::FieldPath;
use crate::models::extensions::{ExtensionMap, Scalar, is_namespaced};
use crate::models::{
    Column, ColumnGroup, Constraint, ConstraintKind, DefaultValue, Index, IndexTarget, Initially,
    ReferentialAction, Schema, SchemaVersion, Table,
};
use crate::types::{DataType, Dialect};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// A `columnRefs` entry awaiting resolution
#[derive(Debug, Clone)]
pub(crate) struct ColumnRefDecl {
    /// Position of the importing table in `Schema::tables`
    pub table_position: usize,
    pub table_id: String,
    pub resource: String,
    pub source_table: String,
    pub name: String,
    pub ref_name: Option<String>,
    pub overrides: Map<String, Value>,
    pub path: FieldPath,
}

/// Output of the structural stage
#[derive(Debug)]
pub(crate) struct ParsedDocument {
    pub schema: Schema,
    /// Declared ids in document order
    pub declarations: Vec<(String, IndexEntry)>,
    pub column_refs: Vec<ColumnRefDecl>,
    /// Ids of objects dropped because they failed to parse
    pub poisoned: HashSet<String>,
    /// Document path of each entry of `schema.tables`
    pub table_paths: Vec<FieldPath>,
}

/// Render a value's JSON type for messages
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

pub(crate) fn value_as_string(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(format!("expected a string, found {}", type_name(other))),
    }
}

pub(crate) fn value_as_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(format!("expected a boolean, found {}", type_name(other))),
    }
}

pub(crate) fn value_as_int(value: &Value) -> Result<i64, String> {
    value
        .as_i64()
        .ok_or_else(|| format!("expected an integer, found {}", type_name(value)))
}

pub(crate) fn value_as_u32(value: &Value) -> Result<u32, String> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| format!("expected a non-negative integer, found {}", value))
}

/// `tap:principal`/`tap:std` style flags: integers, booleans accepted as 0/1
pub(crate) fn value_as_flag(value: &Value) -> Result<i64, String> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        other => value_as_int(other),
    }
}

/// `votable:arraysize` is a string; integers are accepted and converted
pub(crate) fn value_as_arraysize(value: &Value, path: &FieldPath) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if n.is_u64() => {
            warn!(path = %path, "Integer votable:arraysize is deprecated, use a string");
            Ok(n.to_string())
        }
        other => Err(format!("expected a string, found {}", type_name(other))),
    }
}

/// A single id or a list of ids
pub(crate) fn value_as_id_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("expected a list of ids, found {}", type_name(item)))
            })
            .collect(),
        other => Err(format!("expected an id or list of ids, found {}", type_name(other))),
    }
}

fn value_as_string_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("expected a list of strings, found {}", type_name(item)))
            })
            .collect(),
        other => Err(format!("expected a list, found {}", type_name(other))),
    }
}

/// Reads fields of one mapping while tracking which keys were consumed
struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    path: FieldPath,
    consumed: HashSet<String>,
}

impl<'a> ObjectReader<'a> {
    fn new(value: &'a Value, path: FieldPath, what: &str, log: &mut IssueLog) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                map,
                path,
                consumed: HashSet::new(),
            }),
            other => {
                log.report(
                    ErrorKind::Parse,
                    path,
                    format!("{} must be a mapping, found {}", what, type_name(other)),
                );
                None
            }
        }
    }

    fn take(&mut self, key: &str) -> Option<&'a Value> {
        let value = self.map.get(key)?;
        self.consumed.insert(key.to_string());
        if value.is_null() { None } else { Some(value) }
    }

    fn read<T>(
        &mut self,
        key: &str,
        log: &mut IssueLog,
        convert: impl FnOnce(&Value) -> Result<T, String>,
    ) -> Option<T> {
        let value = self.take(key)?;
        match convert(value) {
            Ok(v) => Some(v),
            Err(message) => {
                log.report(
                    ErrorKind::Parse,
                    self.path.key(key),
                    format!("Invalid '{}': {}", key, message),
                );
                None
            }
        }
    }

    fn required<T>(
        &mut self,
        key: &str,
        log: &mut IssueLog,
        convert: impl FnOnce(&Value) -> Result<T, String>,
    ) -> Option<T> {
        if self.map.get(key).is_none_or(Value::is_null) {
            self.consumed.insert(key.to_string());
            log.report(
                ErrorKind::Parse,
                self.path.clone(),
                format!("Missing required field '{}'", key),
            );
            return None;
        }
        self.read(key, log, convert)
    }

    fn string(&mut self, key: &str, log: &mut IssueLog) -> Option<String> {
        self.read(key, log, value_as_string)
    }

    /// Report unconsumed keys and collect the namespaced ones
    fn finish(self, log: &mut IssueLog) -> ExtensionMap {
        let mut extensions = ExtensionMap::new();
        for (key, value) in self.map {
            if self.consumed.contains(key) {
                continue;
            }
            if !is_namespaced(key) {
                log.report(
                    ErrorKind::Parse,
                    self.path.key(key),
                    format!("Unrecognized field '{}'", key),
                );
                continue;
            }
            match Scalar::from_value(value) {
                Some(scalar) => {
                    extensions.insert(key.clone(), scalar);
                }
                None if value.is_null() => {}
                None => log.report(
                    ErrorKind::Parse,
                    self.path.key(key),
                    format!(
                        "Extension attribute '{}' must be a scalar, found {}",
                        key,
                        type_name(value)
                    ),
                ),
            }
        }
        extensions
    }
}

/// Collect every `@id` under a value that could not be parsed
fn collect_ids(value: &Value, into: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(id)) = map.get("@id") {
                into.insert(id.clone());
            }
            for child in map.values() {
                collect_ids(child, into);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_ids(item, into)),
        _ => {}
    }
}

/// Parses one document, reporting into the shared issue log
pub(crate) struct DocumentParser<'l> {
    log: &'l mut IssueLog,
    force_unbounded_arraysize: bool,
    declarations: Vec<(String, IndexEntry)>,
    column_refs: Vec<ColumnRefDecl>,
    poisoned: HashSet<String>,
}

impl<'l> DocumentParser<'l> {
    pub(crate) fn new(log: &'l mut IssueLog, force_unbounded_arraysize: bool) -> Self {
        Self {
            log,
            force_unbounded_arraysize,
            declarations: Vec::new(),
            column_refs: Vec::new(),
            poisoned: HashSet::new(),
        }
    }

    fn declare(&mut self, id: &str, entry: IndexEntry) {
        self.declarations.push((id.to_string(), entry));
    }

    fn drop_object(&mut self, value: &Value) {
        collect_ids(value, &mut self.poisoned);
    }

    /// Parse a whole document. `None` only when the root is not a mapping.
    pub(crate) fn parse(mut self, document: &Value) -> Option<ParsedDocument> {
        let root = FieldPath::root();
        let mut reader = ObjectReader::new(document, root.clone(), "Document", self.log)?;

        let name = reader.required("name", self.log, value_as_string);
        let id = reader.required("@id", self.log, value_as_string);
        let description = reader.string("description", self.log);
        let version = reader.read("version", self.log, parse_version);
        let resources = reader
            .read("resources", self.log, parse_resources)
            .unwrap_or_default();
        let votable_utype = reader.string("votable:utype", self.log);
        let tap_schema_index = reader.read("tap:schema_index", self.log, value_as_int);

        let mut tables = Vec::new();
        let mut table_paths = Vec::new();
        match reader.take("tables") {
            Some(Value::Array(items)) if !items.is_empty() => {
                for (i, item) in items.iter().enumerate() {
                    let path = root.item("tables", i);
                    let position = tables.len();
                    if let Some(table) = self.parse_table(item, path.clone(), position) {
                        tables.push(table);
                        table_paths.push(path);
                    }
                }
            }
            Some(Value::Array(_)) => self.log.report(
                ErrorKind::Parse,
                root.key("tables"),
                "A schema must declare at least one table",
            ),
            Some(other) => self.log.report(
                ErrorKind::Parse,
                root.key("tables"),
                format!("Invalid 'tables': expected a list, found {}", type_name(other)),
            ),
            None => self.log.report(
                ErrorKind::Parse,
                root.clone(),
                "Missing required field 'tables'",
            ),
        }

        let extensions = reader.finish(self.log);

        let id = id.unwrap_or_default();
        if !id.is_empty() {
            self.declarations
                .insert(0, (id.clone(), IndexEntry::new(ObjectKind::Schema, root)));
        }

        Some(ParsedDocument {
            schema: Schema {
                name: name.unwrap_or_default(),
                id,
                description,
                version,
                resources,
                tables,
                votable_utype,
                tap_schema_index,
                extensions,
            },
            declarations: self.declarations,
            column_refs: self.column_refs,
            poisoned: self.poisoned,
            table_paths,
        })
    }

    fn parse_table(&mut self, value: &Value, path: FieldPath, position: usize) -> Option<Table> {
        let mut reader = ObjectReader::new(value, path.clone(), "Table", self.log)?;

        let id = reader.required("@id", self.log, value_as_string);
        let name = reader.required("name", self.log, value_as_string);
        let (Some(id), Some(name)) = (id, name) else {
            self.drop_object(value);
            return None;
        };
        self.declare(&id, IndexEntry::new(ObjectKind::Table, path.clone()));

        let mut table = Table::new(id.clone(), name);
        table.description = reader.string("description", self.log);
        table.primary_key = reader
            .read("primaryKey", self.log, value_as_id_list)
            .unwrap_or_default();
        table.tap_table_index = reader.read("tap:table_index", self.log, value_as_int);
        table.votable_utype = reader.string("votable:utype", self.log);
        table.mysql_engine = reader.string("mysql:engine", self.log);
        table.mysql_charset = reader.string("mysql:charset", self.log);

        let has_refs = reader.map.get("columnRefs").is_some_and(|v| !v.is_null());
        match reader.take("columns") {
            Some(Value::Array(items)) if !items.is_empty() => {
                for (i, item) in items.iter().enumerate() {
                    if let Some(column) = self.parse_column(item, path.item("columns", i), &id) {
                        table.columns.push(column);
                    }
                }
            }
            Some(Value::Array(_)) | None if has_refs => {}
            Some(Value::Array(_)) | None => self.log.report(
                ErrorKind::Parse,
                path.key("columns"),
                "A table must declare at least one column",
            ),
            Some(other) => self.log.report(
                ErrorKind::Parse,
                path.key("columns"),
                format!("Invalid 'columns': expected a list, found {}", type_name(other)),
            ),
        }

        for (i, item) in self.list(&mut reader, "constraints", &path).iter().enumerate() {
            if let Some(c) = self.parse_constraint(item, path.item("constraints", i), &id) {
                table.constraints.push(c);
            }
        }
        for (i, item) in self.list(&mut reader, "indexes", &path).iter().enumerate() {
            if let Some(index) = self.parse_index(item, path.item("indexes", i), &id) {
                table.indexes.push(index);
            }
        }
        for (i, item) in self.list(&mut reader, "columnGroups", &path).iter().enumerate() {
            if let Some(group) = self.parse_column_group(item, path.item("columnGroups", i), &id)
            {
                table.column_groups.push(group);
            }
        }
        if let Some(refs) = reader.take("columnRefs") {
            self.parse_column_refs(refs, path.key("columnRefs"), &id, position);
        }

        table.extensions = reader.finish(self.log);
        Some(table)
    }

    fn list<'v>(
        &mut self,
        reader: &mut ObjectReader<'v>,
        key: &str,
        path: &FieldPath,
    ) -> &'v [Value] {
        match reader.take(key) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.log.report(
                    ErrorKind::Parse,
                    path.key(key),
                    format!("Invalid '{}': expected a list, found {}", key, type_name(other)),
                );
                &[]
            }
            None => &[],
        }
    }

    fn parse_column(&mut self, value: &Value, path: FieldPath, table_id: &str) -> Option<Column> {
        let mut reader = ObjectReader::new(value, path.clone(), "Column", self.log)?;

        let id = reader.required("@id", self.log, value_as_string);
        let name = reader.required("name", self.log, value_as_string);
        let tag = reader.required("datatype", self.log, value_as_string);

        let datatype = match (&id, &tag) {
            (Some(id), Some(tag)) => match DataType::resolve(tag, id) {
                Ok(datatype) => Some(datatype),
                Err(e) => {
                    self.log
                        .report(ErrorKind::InvalidType, path.key("datatype"), e.to_string());
                    None
                }
            },
            _ => None,
        };

        let (Some(id), Some(name), Some(datatype)) = (id, name, datatype) else {
            self.drop_object(value);
            return None;
        };
        self.declare(
            &id,
            IndexEntry::new(ObjectKind::Column, path.clone()).in_table(table_id),
        );

        let log = &mut *self.log;
        let mut column = Column::new(id, name, datatype);
        column.description = reader.string("description", log);
        column.length = reader.read("length", log, value_as_u32);
        column.precision = reader.read("precision", log, value_as_u32);
        column.nullable = reader.read("nullable", log, value_as_bool).unwrap_or(true);
        column.autoincrement = reader.read("autoincrement", log, value_as_bool);
        if let Some(raw) = reader.take("value") {
            column.value = DefaultValue::from_value(raw);
            if column.value.is_none() {
                log.report(
                    ErrorKind::Parse,
                    path.key("value"),
                    format!("Invalid 'value': expected a scalar, found {}", type_name(raw)),
                );
            }
        }
        column.ivoa_unit = reader.string("ivoa:unit", log);
        column.fits_tunit = reader.string("fits:tunit", log);
        column.ivoa_ucd = reader.string("ivoa:ucd", log);
        column.votable_utype = reader.string("votable:utype", log);
        let arraysize_path = path.key("votable:arraysize");
        column.votable_arraysize = reader.read("votable:arraysize", log, |v| {
            value_as_arraysize(v, &arraysize_path)
        });
        column.votable_datatype = reader.string("votable:datatype", log);
        column.votable_xtype = reader.string("votable:xtype", log);
        column.tap_principal = reader.read("tap:principal", log, value_as_flag);
        column.tap_std = reader.read("tap:std", log, value_as_flag);
        column.tap_column_index = reader.read("tap:column_index", log, value_as_int);
        for dialect in Dialect::ALL {
            let declared = reader.string(dialect.datatype_key(), log);
            column.set_datatype_override(dialect, declared);
        }
        column.extensions = reader.finish(log);
        column.apply_votable_defaults(self.force_unbounded_arraysize);
        Some(column)
    }

    fn parse_constraint(
        &mut self,
        value: &Value,
        path: FieldPath,
        table_id: &str,
    ) -> Option<Constraint> {
        let mut reader = ObjectReader::new(value, path.clone(), "Constraint", self.log)?;

        // Discriminate first so missing fields are attributed to the declared variant
        let tag = reader.required("@type", self.log, value_as_string);
        let id = reader.required("@id", self.log, value_as_string);
        let name = reader.required("name", self.log, value_as_string);

        let kind = match tag.as_deref() {
            Some("ForeignKey") => {
                let columns = reader.required("columns", self.log, value_as_id_list);
                let referenced = reader.required("referencedColumns", self.log, value_as_id_list);
                let on_delete = self.action(&mut reader, "on_delete");
                let on_update = self.action(&mut reader, "on_update");
                match (columns, referenced) {
                    (Some(columns), Some(referenced_columns)) => Some(ConstraintKind::ForeignKey {
                        columns,
                        referenced_columns,
                        on_delete,
                        on_update,
                    }),
                    _ => None,
                }
            }
            Some("Unique") => reader
                .required("columns", self.log, value_as_id_list)
                .map(|columns| ConstraintKind::Unique { columns }),
            Some("Check") => reader
                .required("expression", self.log, value_as_string)
                .map(|expression| ConstraintKind::Check { expression }),
            Some(other) => {
                self.log.report(
                    ErrorKind::Parse,
                    path.key("@type"),
                    format!(
                        "Unknown constraint type '{}'; expected ForeignKey, Unique or Check",
                        other
                    ),
                );
                None
            }
            None => None,
        };

        let description = reader.string("description", self.log);
        let deferrable = reader
            .read("deferrable", self.log, value_as_bool)
            .unwrap_or(false);
        let initially = reader
            .string("initially", self.log)
            .and_then(|raw| match raw.parse::<Initially>() {
                Ok(initially) => Some(initially),
                Err(message) => {
                    self.log
                        .report(ErrorKind::InvalidValue, path.key("initially"), message);
                    None
                }
            });
        let votable_utype = reader.string("votable:utype", self.log);
        reader.finish(self.log);

        let (Some(id), Some(name), Some(kind)) = (id, name, kind) else {
            self.drop_object(value);
            return None;
        };
        self.declare(
            &id,
            IndexEntry::new(ObjectKind::Constraint, path).in_table(table_id),
        );
        Some(Constraint {
            id,
            name,
            description,
            deferrable,
            initially,
            votable_utype,
            kind,
        })
    }

    fn action(&mut self, reader: &mut ObjectReader<'_>, key: &str) -> Option<ReferentialAction> {
        let raw = reader.string(key, self.log)?;
        match raw.parse() {
            Ok(action) => Some(action),
            Err(message) => {
                self.log
                    .report(ErrorKind::InvalidValue, reader.path.key(key), message);
                None
            }
        }
    }

    fn parse_index(&mut self, value: &Value, path: FieldPath, table_id: &str) -> Option<Index> {
        let mut reader = ObjectReader::new(value, path.clone(), "Index", self.log)?;

        let id = reader.required("@id", self.log, value_as_string);
        let name = reader.required("name", self.log, value_as_string);
        let description = reader.string("description", self.log);
        let columns = reader.read("columns", self.log, value_as_id_list);
        let expressions = reader.read("expressions", self.log, value_as_string_list);
        reader.finish(self.log);

        let target = match (columns, expressions) {
            (Some(columns), None) if !columns.is_empty() => Some(IndexTarget::Columns(columns)),
            (None, Some(expressions)) if !expressions.is_empty() => {
                Some(IndexTarget::Expressions(expressions))
            }
            (Some(_), Some(_)) => {
                self.log.report(
                    ErrorKind::ConstraintShape,
                    path.clone(),
                    "An index declares either 'columns' or 'expressions', not both",
                );
                None
            }
            _ => {
                self.log.report(
                    ErrorKind::ConstraintShape,
                    path.clone(),
                    "An index must declare non-empty 'columns' or 'expressions'",
                );
                None
            }
        };

        let (Some(id), Some(name), Some(target)) = (id, name, target) else {
            self.drop_object(value);
            return None;
        };
        self.declare(&id, IndexEntry::new(ObjectKind::Index, path).in_table(table_id));
        Some(Index {
            id,
            name,
            description,
            target,
        })
    }

    fn parse_column_group(
        &mut self,
        value: &Value,
        path: FieldPath,
        table_id: &str,
    ) -> Option<ColumnGroup> {
        let mut reader = ObjectReader::new(value, path.clone(), "Column group", self.log)?;

        let id = reader.required("@id", self.log, value_as_string);
        let name = reader.required("name", self.log, value_as_string);
        let columns = reader.required("columns", self.log, value_as_id_list);
        let description = reader.string("description", self.log);
        let ivoa_ucd = reader.string("ivoa:ucd", self.log);
        let votable_utype = reader.string("votable:utype", self.log);
        let extensions = reader.finish(self.log);

        if columns.as_ref().is_some_and(Vec::is_empty) {
            self.log.report(
                ErrorKind::ConstraintShape,
                path.key("columns"),
                "A column group must list at least one column",
            );
        }

        let (Some(id), Some(name), Some(columns)) = (id, name, columns) else {
            self.drop_object(value);
            return None;
        };
        self.declare(
            &id,
            IndexEntry::new(ObjectKind::ColumnGroup, path).in_table(table_id),
        );
        Some(ColumnGroup {
            id,
            name,
            description,
            columns,
            ivoa_ucd,
            votable_utype,
            extensions,
        })
    }

    fn parse_column_refs(
        &mut self,
        value: &Value,
        path: FieldPath,
        table_id: &str,
        table_position: usize,
    ) {
        let Some(resources) = self.mapping(value, &path, "columnRefs") else {
            return;
        };
        for (resource, tables) in resources {
            let resource_path = path.key(resource);
            let Some(tables) = self.mapping(tables, &resource_path, "columnRefs resource") else {
                continue;
            };
            for (source_table, columns) in tables {
                let table_path = resource_path.key(source_table);
                let Some(columns) = self.mapping(columns, &table_path, "columnRefs table") else {
                    continue;
                };
                for (name, entry) in columns {
                    let entry_path = table_path.key(name);
                    let (ref_name, overrides) = match entry {
                        Value::Null => (None, Map::new()),
                        other => {
                            let Some(mut reader) = ObjectReader::new(
                                other,
                                entry_path.clone(),
                                "Column reference",
                                self.log,
                            ) else {
                                continue;
                            };
                            let ref_name = reader.string("ref_name", self.log);
                            let overrides = reader
                                .read("overrides", self.log, |v| match v {
                                    Value::Object(map) => Ok(map.clone()),
                                    other => Err(format!(
                                        "expected a mapping, found {}",
                                        type_name(other)
                                    )),
                                })
                                .unwrap_or_default();
                            reader.finish(self.log);
                            (ref_name, overrides)
                        }
                    };
                    self.column_refs.push(ColumnRefDecl {
                        table_position,
                        table_id: table_id.to_string(),
                        resource: resource.clone(),
                        source_table: source_table.clone(),
                        name: name.clone(),
                        ref_name,
                        overrides,
                        path: entry_path,
                    });
                }
            }
        }
    }

    fn mapping<'v>(
        &mut self,
        value: &'v Value,
        path: &FieldPath,
        what: &str,
    ) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.log.report(
                    ErrorKind::Parse,
                    path.clone(),
                    format!("{} must be a mapping, found {}", what, type_name(other)),
                );
                None
            }
        }
    }
}

fn parse_version(value: &Value) -> Result<SchemaVersion, String> {
    match value {
        Value::String(s) => Ok(SchemaVersion::Plain(s.clone())),
        Value::Object(map) => {
            let current = map
                .get("current")
                .and_then(Value::as_str)
                .ok_or_else(|| "structured version requires 'current'".to_string())?
                .to_string();
            if let Some(unknown) = map
                .keys()
                .find(|k| !matches!(k.as_str(), "current" | "compatible" | "read_compatible"))
            {
                return Err(format!("unrecognized version field '{}'", unknown));
            }
            let list = |key: &str| {
                map.get(key)
                    .map(value_as_string_list)
                    .transpose()
                    .map(Option::unwrap_or_default)
            };
            Ok(SchemaVersion::Structured {
                current,
                compatible: list("compatible")?,
                read_compatible: list("read_compatible")?,
            })
        }
        other => Err(format!(
            "expected a string or a version mapping, found {}",
            type_name(other)
        )),
    }
}

fn parse_resources(value: &Value) -> Result<BTreeMap<String, String>, String> {
    let Value::Object(map) = value else {
        return Err(format!("expected a mapping, found {}", type_name(value)));
    };
    map.iter()
        .map(|(name, uri)| match uri {
            Value::String(uri) => Ok((name.clone(), uri.clone())),
            other => Err(format!(
                "resource '{}' must be a URI string, found {}",
                name,
                type_name(other)
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(document: Value) -> (Option<ParsedDocument>, IssueLog) {
        let mut log = IssueLog::default();
        let parsed = DocumentParser::new(&mut log, false).parse(&document);
        (parsed, log)
    }

    fn issues(log: IssueLog) -> Vec<(ErrorKind, String)> {
        log.into_error()
            .issues
            .into_iter()
            .map(|i| (i.kind, i.path.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_and_extensions() {
        let (parsed, log) = parse(json!({
            "name": "s", "@id": "#s",
            "tables": [{
                "name": "t", "@id": "#t", "lsst:origin": "survey",
                "columns": [{"name": "c", "@id": "#t.c", "datatype": "string", "length": 8}]
            }]
        }));
        assert!(log.is_empty());
        let parsed = parsed.unwrap();
        let column = &parsed.schema.tables[0].columns[0];
        assert!(column.nullable);
        assert_eq!(column.votable_arraysize.as_deref(), Some("8*"));
        assert_eq!(
            parsed.schema.tables[0].extensions.get("lsst:origin"),
            Some(&Scalar::String("survey".to_string()))
        );
        let ids: Vec<_> = parsed.declarations.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["#s", "#t", "#t.c"]);
    }

    #[test]
    fn test_unrecognized_field_rejected() {
        let (_, log) = parse(json!({
            "name": "s", "@id": "#s",
            "tables": [{
                "name": "t", "@id": "#t",
                "columns": [{"name": "c", "@id": "#t.c", "datatype": "int", "colour": "red"}]
            }]
        }));
        assert_eq!(
            issues(log),
            vec![(ErrorKind::Parse, "tables[0].columns[0].colour".to_string())]
        );
    }

    #[test]
    fn test_unknown_datatype_drops_column() {
        let (parsed, log) = parse(json!({
            "name": "s", "@id": "#s",
            "tables": [{
                "name": "t", "@id": "#t",
                "columns": [{"name": "c", "@id": "#t.c", "datatype": "varchar"}]
            }]
        }));
        let parsed = parsed.unwrap();
        assert!(parsed.schema.tables[0].columns.is_empty());
        assert!(parsed.poisoned.contains("#t.c"));
        assert_eq!(
            issues(log),
            vec![(ErrorKind::InvalidType, "tables[0].columns[0].datatype".to_string())]
        );
    }

    #[test]
    fn test_constraint_errors_follow_declared_type() {
        let (_, log) = parse(json!({
            "name": "s", "@id": "#s",
            "tables": [{
                "name": "t", "@id": "#t",
                "columns": [{"name": "c", "@id": "#t.c", "datatype": "int"}],
                "constraints": [{
                    "@type": "Check", "name": "chk", "@id": "#chk",
                    "columns": ["#t.c"]
                }]
            }]
        }));
        let found = log.into_error();
        let messages: Vec<_> = found.issues.iter().map(|i| i.message.as_str()).collect();
        assert!(messages.contains(&"Missing required field 'expression'"));
        assert!(messages.contains(&"Unrecognized field 'columns'"));
    }

    #[test]
    fn test_index_columns_and_expressions_exclusive() {
        let (_, log) = parse(json!({
            "name": "s", "@id": "#s",
            "tables": [{
                "name": "t", "@id": "#t",
                "columns": [{"name": "c", "@id": "#t.c", "datatype": "int"}],
                "indexes": [{
                    "name": "idx", "@id": "#idx",
                    "columns": ["#t.c"], "expressions": ["c + 1"]
                }]
            }]
        }));
        assert_eq!(
            issues(log),
            vec![(ErrorKind::ConstraintShape, "tables[0].indexes[0]".to_string())]
        );
    }

    #[test]
    fn test_structured_version_and_resources() {
        let (parsed, log) = parse(json!({
            "name": "s", "@id": "#s",
            "version": {"current": "2", "compatible": ["1"]},
            "resources": {"base": "base.yaml"},
            "tables": [{
                "name": "t", "@id": "#t",
                "columnRefs": {"base": {"src": {"c": null}}}
            }]
        }));
        assert!(log.is_empty());
        let parsed = parsed.unwrap();
        assert_eq!(parsed.schema.version.unwrap().current(), "2");
        assert_eq!(parsed.schema.resources["base"], "base.yaml");
        assert_eq!(parsed.column_refs.len(), 1);
        assert_eq!(
            parsed.column_refs[0].path.to_string(),
            "tables[0].columnRefs.base.src.c"
        );
    }

    #[test]
    fn test_integer_arraysize_accepted() {
        let (parsed, log) = parse(json!({
            "name": "s", "@id": "#s",
            "tables": [{
                "name": "t", "@id": "#t",
                "columns": [{
                    "name": "c", "@id": "#t.c", "datatype": "char", "length": 4,
                    "votable:arraysize": 4
                }]
            }]
        }));
        assert!(log.is_empty());
        assert_eq!(
            parsed.unwrap().schema.tables[0].columns[0]
                .votable_arraysize
                .as_deref(),
            Some("4")
        );
    }
}
