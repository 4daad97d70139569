//! Validation options

use serde::{Deserialize, Serialize};

/// Minimum description length enforced by `check_description`
pub const MIN_DESCRIPTION_LENGTH: usize = 3;

/// Toggles for one validation run.
///
/// The `check_*` flags enable advisory checks; all default to off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Every object needs a description of at least three characters
    pub check_description: bool,
    /// Per-dialect datatype overrides must differ from the default mapping
    pub check_redundant_datatypes: bool,
    /// Every table carries a unique `tap:table_index`
    pub check_tap_table_indexes: bool,
    /// Every table flags at least one principal column
    pub check_tap_principal: bool,
    /// Derive ids for objects that do not declare one
    pub id_generation: bool,
    /// Materialize `columnRefs` imports as regular columns
    pub dereference_resources: bool,
    /// Default `votable:arraysize` of variable strings to `*`
    pub force_unbounded_arraysize: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            check_description: false,
            check_redundant_datatypes: false,
            check_tap_table_indexes: false,
            check_tap_principal: false,
            id_generation: false,
            dereference_resources: true,
            force_unbounded_arraysize: false,
        }
    }
}
