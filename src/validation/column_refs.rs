//! Resolution of `columnRefs` imports against validated resource schemas

use super::error::{ErrorKind, IssueLog};
use super::parser::{
    ColumnRefDecl, value_as_arraysize, value_as_bool, value_as_flag, value_as_int,
    value_as_string, value_as_u32,
};
use super::path::FieldPath;
use crate::models::{Column, ColumnLineage, Schema};
use crate::types::{DataType, Dialect};
use serde_json::Value;

/// Attributes a `columnRefs` entry may override
pub const ALLOWED_OVERRIDES: [&str; 14] = [
    "datatype",
    "length",
    "description",
    "nullable",
    "ivoa:ucd",
    "ivoa:unit",
    "fits:tunit",
    "votable:arraysize",
    "votable:datatype",
    "votable:xtype",
    "votable:utype",
    "tap:principal",
    "tap:std",
    "tap:column_index",
];

/// Id given to an imported column within the importing table
pub fn imported_column_id(table_id: &str, local_name: &str) -> String {
    format!("{}.{}", table_id, local_name)
}

/// Build the local column for one import.
///
/// Returns `None` after reporting when the source table or column does not
/// exist, or when an override is rejected.
pub(crate) fn import_column(
    decl: &ColumnRefDecl,
    source: &Schema,
    uri: &str,
    force_unbounded_arraysize: bool,
    log: &mut IssueLog,
) -> Option<Column> {
    let Some(table) = source.table_by_name(&decl.source_table) else {
        log.report(
            ErrorKind::ResourceResolution,
            decl.path.clone(),
            format!(
                "Table '{}' not found in resource '{}' ({})",
                decl.source_table, decl.resource, uri
            ),
        );
        return None;
    };
    let source_name = decl.ref_name.as_deref().unwrap_or(&decl.name);
    let Some(original) = table.column_by_name(source_name) else {
        log.report(
            ErrorKind::ResourceResolution,
            decl.path.clone(),
            format!(
                "Column '{}' not found in table '{}' of resource '{}' ({})",
                source_name, decl.source_table, decl.resource, uri
            ),
        );
        return None;
    };

    let mut column = original.clone();
    column.id = imported_column_id(&decl.table_id, &decl.name);
    column.name = decl.name.clone();
    column.lineage = Some(ColumnLineage {
        resource: decl.resource.clone(),
        uri: uri.to_string(),
        table: table.name.clone(),
        column_id: original.id.clone(),
    });

    let overrides_path = decl.path.key("overrides");
    let mut ok = true;
    for (key, value) in &decl.overrides {
        let path = overrides_path.key(key);
        if !ALLOWED_OVERRIDES.contains(&key.as_str()) {
            log.report(
                ErrorKind::OverrideNotAllowed,
                path,
                format!(
                    "Attribute '{}' cannot be overridden on a column reference",
                    key
                ),
            );
            ok = false;
            continue;
        }
        if let Err((kind, message)) = apply_override(&mut column, key, value, &path) {
            log.report(kind, path, message);
            ok = false;
        }
    }
    if !ok {
        return None;
    }

    let overridden = |key: &str| decl.overrides.contains_key(key);
    if overridden("datatype") {
        // Dialect overrides and derived annotations describe the source type
        for dialect in Dialect::ALL {
            column.set_datatype_override(dialect, None);
        }
        if !overridden("length") && !column.datatype.requires_length() {
            column.length = None;
        }
        if !overridden("votable:xtype") {
            column.votable_xtype = None;
        }
    }
    if (overridden("datatype") || overridden("length")) && !overridden("votable:arraysize") {
        column.votable_arraysize = None;
    }
    column.apply_votable_defaults(force_unbounded_arraysize);
    Some(column)
}

fn apply_override(
    column: &mut Column,
    key: &str,
    value: &Value,
    path: &FieldPath,
) -> Result<(), (ErrorKind, String)> {
    let parse = |message: String| (ErrorKind::Parse, format!("Invalid '{}': {}", key, message));
    match key {
        "datatype" => {
            let tag = value_as_string(value).map_err(parse)?;
            column.datatype = DataType::resolve(&tag, &column.id)
                .map_err(|e| (ErrorKind::InvalidType, e.to_string()))?;
        }
        "length" => column.length = Some(value_as_u32(value).map_err(parse)?),
        "description" => column.description = Some(value_as_string(value).map_err(parse)?),
        "nullable" => column.nullable = value_as_bool(value).map_err(parse)?,
        "ivoa:ucd" => column.ivoa_ucd = Some(value_as_string(value).map_err(parse)?),
        "ivoa:unit" => column.ivoa_unit = Some(value_as_string(value).map_err(parse)?),
        "fits:tunit" => column.fits_tunit = Some(value_as_string(value).map_err(parse)?),
        "votable:arraysize" => {
            column.votable_arraysize = Some(value_as_arraysize(value, path).map_err(parse)?)
        }
        "votable:datatype" => {
            column.votable_datatype = Some(value_as_string(value).map_err(parse)?)
        }
        "votable:xtype" => column.votable_xtype = Some(value_as_string(value).map_err(parse)?),
        "votable:utype" => column.votable_utype = Some(value_as_string(value).map_err(parse)?),
        "tap:principal" => column.tap_principal = Some(value_as_flag(value).map_err(parse)?),
        "tap:std" => column.tap_std = Some(value_as_flag(value).map_err(parse)?),
        "tap:column_index" => {
            column.tap_column_index = Some(value_as_int(value).map_err(parse)?)
        }
        _ => {
            return Err((
                ErrorKind::OverrideNotAllowed,
                format!("Attribute '{}' cannot be overridden", key),
            ));
        }
    }
    Ok(())
}
