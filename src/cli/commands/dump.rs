//! Dump command implementation

use super::{validate_input, write_output};
use crate::cli::error::CliError;
use crate::validation::ValidationOptions;
use serde_json::Value;
use std::path::PathBuf;

/// Arguments for the dump command
#[derive(Debug, Clone, Default)]
pub struct DumpArgs {
    pub file: String,
    pub json: bool,
    /// Remove `@id` keys from the output
    pub strip_ids: bool,
    pub output: Option<PathBuf>,
    pub options: ValidationOptions,
}

fn strip_ids(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("@id");
            map.values_mut().for_each(strip_ids);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_ids),
        _ => {}
    }
}

/// Render the validated document
pub fn render_dump(args: &DumpArgs) -> Result<String, CliError> {
    let schema = validate_input(&args.file, args.options.clone())?;
    let mut document = schema.to_document();
    if args.strip_ids {
        strip_ids(&mut document);
    }
    let rendered = if args.json {
        serde_json::to_string_pretty(&document)
            .map(|s| s + "\n")
            .map_err(|e| CliError::SerializationError(e.to_string()))?
    } else {
        serde_yaml::to_string(&document).map_err(|e| CliError::SerializationError(e.to_string()))?
    };
    Ok(rendered)
}

/// Handle the dump command
pub fn handle_dump(args: &DumpArgs) -> Result<(), CliError> {
    write_output(args.output.as_deref(), &render_dump(args)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dump_json_without_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.yaml");
        std::fs::write(
            &path,
            r##"name: s
"@id": "#s"
tables:
  - name: t
    "@id": "#t"
    columns:
      - name: c
        "@id": "#t.c"
        datatype: int
"##,
        )
        .unwrap();

        let rendered = render_dump(&DumpArgs {
            file: path.to_string_lossy().into_owned(),
            json: true,
            strip_ids: true,
            ..Default::default()
        })
        .unwrap();
        let document: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(document["tables"][0]["columns"][0]["datatype"], "int");
        assert!(document.get("@id").is_none());
        assert!(document["tables"][0]["columns"][0].get("@id").is_none());
    }
}
