//! Diff command implementation

use super::validate_input;
use crate::cli::error::CliError;
use crate::diff::{SchemaDiff, diff};
use crate::validation::ValidationOptions;

/// Arguments for the diff command
#[derive(Debug, Clone, Default)]
pub struct DiffArgs {
    pub old: String,
    pub new: String,
    /// Fail when any difference is found
    pub error_on_change: bool,
    pub options: ValidationOptions,
}

/// Compare two documents after validating both
pub fn compare(args: &DiffArgs) -> Result<SchemaDiff, CliError> {
    let old = validate_input(&args.old, args.options.clone())?;
    let new = validate_input(&args.new, args.options.clone())?;
    Ok(diff(&old, &new))
}

/// Handle the diff command
pub fn handle_diff(args: &DiffArgs) -> Result<(), CliError> {
    let result = compare(args)?;
    if result.is_empty() {
        println!("No differences");
        return Ok(());
    }
    print!("{}", result);
    if args.error_on_change {
        return Err(CliError::DifferencesFound(result.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_error_on_change() {
        let dir = tempdir().unwrap();
        let doc = |length: u32| {
            format!(
                r##"name: s
"@id": "#s"
tables:
  - name: t
    "@id": "#t"
    columns:
      - name: c
        "@id": "#t.c"
        datatype: string
        length: {}
"##,
                length
            )
        };
        let old = dir.path().join("old.yaml");
        let new = dir.path().join("new.yaml");
        std::fs::write(&old, doc(10)).unwrap();
        std::fs::write(&new, doc(20)).unwrap();

        let mut args = DiffArgs {
            old: old.to_string_lossy().into_owned(),
            new: new.to_string_lossy().into_owned(),
            ..Default::default()
        };
        let result = compare(&args).unwrap();
        assert_eq!(result.differences[0].path, "tables[#t].columns[#t.c].length");

        args.error_on_change = true;
        assert!(matches!(handle_diff(&args), Err(CliError::DifferencesFound(_))));
    }
}
