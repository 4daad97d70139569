//! Validation error taxonomy
//!
//! Individual problems are collected as [`ValidationIssue`]s; a failed
//! validation returns all of them at once in [`SchemaValidationError`].

use super::path::FieldPath;
use serde::Serialize;
use std::fmt;

/// Category of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Malformed document shape
    Parse,
    DuplicateId,
    UnresolvedReference,
    KindMismatch,
    InvalidType,
    /// `length` missing or present against the datatype
    InvalidLength,
    /// A field value outside its allowed domain
    InvalidValue,
    ConstraintShape,
    NullablePrimaryKey,
    NameUniqueness,
    ResourceResolution,
    OverrideNotAllowed,
    /// An enabled advisory check failed
    CheckFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::DuplicateId => "DuplicateIdError",
            ErrorKind::UnresolvedReference => "UnresolvedReferenceError",
            ErrorKind::KindMismatch => "KindMismatchError",
            ErrorKind::InvalidType => "InvalidTypeError",
            ErrorKind::InvalidLength => "InvalidLengthError",
            ErrorKind::InvalidValue => "InvalidValueError",
            ErrorKind::ConstraintShape => "ConstraintShapeError",
            ErrorKind::NullablePrimaryKey => "NullablePrimaryKeyError",
            ErrorKind::NameUniqueness => "NameUniquenessError",
            ErrorKind::ResourceResolution => "ResourceResolutionError",
            ErrorKind::OverrideNotAllowed => "OverrideNotAllowedError",
            ErrorKind::CheckFailed => "CheckFailedError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: FieldPath,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.kind)
    }
}

/// Every issue found while validating one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl SchemaValidationError {
    /// Issues of one kind
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationIssue> + '_ {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.of_kind(kind).next().is_some()
    }
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Schema validation failed with {} issue(s):",
            self.issues.len()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaValidationError {}

/// Collector the validation stages report into
#[derive(Debug, Default)]
pub(crate) struct IssueLog {
    issues: Vec<ValidationIssue>,
}

impl IssueLog {
    pub(crate) fn report(&mut self, kind: ErrorKind, path: FieldPath, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path,
            kind,
            message: message.into(),
        });
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.issues.len()
    }

    pub(crate) fn into_error(self) -> SchemaValidationError {
        SchemaValidationError {
            issues: self.issues,
        }
    }
}
