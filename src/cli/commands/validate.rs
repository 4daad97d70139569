//! Validate command implementation

use super::validate_input;
use crate::cli::error::CliError;
use crate::validation::ValidationOptions;
use tracing::info;

/// Arguments for the validate command
#[derive(Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Files to validate, `-` for stdin
    pub files: Vec<String>,
    pub options: ValidationOptions,
}

/// Handle the validate command
///
/// Every file is validated; failures are reported together at the end.
pub fn handle_validate(args: &ValidateArgs) -> Result<(), CliError> {
    if args.files.is_empty() {
        return Err(CliError::InvalidArgument("No files to validate".to_string()));
    }

    let mut failed = 0;
    for file in &args.files {
        match validate_input(file, args.options.clone()) {
            Ok(schema) => {
                info!(file = %file, schema = %schema.name, "Validated");
                println!("{}: OK", file);
            }
            Err(err) => {
                failed += 1;
                eprintln!("{}: {}", file, err);
            }
        }
    }

    if failed > 0 {
        return Err(CliError::ValidationFailed(failed, args.files.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_validate_reports_failures() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.yaml");
        let bad = dir.path().join("bad.yaml");
        let mut file = std::fs::File::create(&good).unwrap();
        write!(
            file,
            r##"name: good
"@id": "#good"
tables:
  - name: t
    "@id": "#t"
    columns:
      - name: c
        "@id": "#t.c"
        datatype: int
"##
        )
        .unwrap();
        let mut file = std::fs::File::create(&bad).unwrap();
        write!(file, "name: bad\n\"@id\": \"#bad\"\n").unwrap();

        let args = ValidateArgs {
            files: vec![
                good.to_string_lossy().into_owned(),
                bad.to_string_lossy().into_owned(),
            ],
            options: ValidationOptions::default(),
        };
        let err = handle_validate(&args).unwrap_err();
        assert!(matches!(err, CliError::ValidationFailed(1, 2)));
    }
}
