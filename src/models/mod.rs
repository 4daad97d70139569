//! Schema object model
//!
//! Typed representation of a validated catalog description:
//! Schema → Tables → Columns / Constraints / Indexes / Column Groups.
//! Cross-object references are stored as ids.

pub mod column;
pub mod constraint;
pub mod extensions;
pub mod schema;
pub mod table;

pub use column::{Column, ColumnLineage, DefaultValue};
pub use constraint::{
    ColumnGroup, Constraint, ConstraintKind, Index, IndexTarget, Initially, ReferentialAction,
};
pub use extensions::{ExtensionMap, Scalar};
pub use schema::{Schema, SchemaObject, SchemaVersion};
pub use table::{ColumnReference, Table};
