//! Diff and merge over validated documents

use schema_catalog_sdk::diff::{ChangeKind, diff};
use schema_catalog_sdk::merge::merge_documents;
use schema_catalog_sdk::resources::parse_document;
use schema_catalog_sdk::validation::SchemaValidator;

const BASE: &str = r##"
name: sales
"@id": "#sales"
tables:
  - name: customers
    "@id": "#customers"
    primaryKey: "#customers.customer_id"
    columns:
      - name: customer_id
        "@id": "#customers.customer_id"
        datatype: int
        nullable: false
      - name: name
        "@id": "#customers.name"
        datatype: string
        length: 30
"##;

const OVERLAY: &str = r##"
"@id": "#sales"
description: Sales data
tables:
  - "@id": "#customers"
    columns:
      - "@id": "#customers.name"
        length: 64
      - name: email
        "@id": "#customers.email"
        datatype: string
        length: 128
"##;

mod diff_tests {
    use super::*;

    #[test]
    fn test_identical_schemas() {
        let validator = SchemaValidator::default();
        let a = validator.validate_str(BASE).unwrap();
        let b = validator.validate_str(BASE).unwrap();
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn test_diff_does_not_mutate_inputs() {
        let validator = SchemaValidator::default();
        let a = validator.validate_str(BASE).unwrap();
        let b = validator
            .validate_str(&BASE.replace("length: 30", "length: 40"))
            .unwrap();
        let (a_before, b_before) = (a.clone(), b.clone());

        let result = diff(&a, &b);
        let length = result
            .iter()
            .find(|d| d.path == "tables[#customers].columns[#customers.name].length")
            .unwrap();
        assert_eq!(length.kind, ChangeKind::Changed);
        assert_eq!(length.old, Some(serde_json::json!(30)));
        assert_eq!(length.new, Some(serde_json::json!(40)));
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }
}

mod merge_tests {
    use super::*;

    #[test]
    fn test_merged_document_validates() {
        let base = parse_document(BASE, "base.yaml").unwrap();
        let overlay = parse_document(OVERLAY, "overlay.yaml").unwrap();
        let merged = merge_documents(&[base, overlay]).unwrap();

        let schema = SchemaValidator::default().validate(&merged).unwrap();
        assert_eq!(schema.description.as_deref(), Some("Sales data"));
        let columns = &schema.tables[0].columns;
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[1].length, Some(64));
        assert_eq!(columns[2].name, "email");
    }

    #[test]
    fn test_diff_of_merge_reports_overlay() {
        let validator = SchemaValidator::default();
        let base = parse_document(BASE, "base.yaml").unwrap();
        let overlay = parse_document(OVERLAY, "overlay.yaml").unwrap();
        let merged = merge_documents(&[base.clone(), overlay]).unwrap();

        let result = diff(
            &validator.validate(&base).unwrap(),
            &validator.validate(&merged).unwrap(),
        );
        let paths: Vec<&str> = result.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"description"));
        assert!(paths.contains(&"tables[#customers].columns[#customers.name].length"));
        assert!(paths.contains(&"tables[#customers].columns[#customers.email]"));
    }
}
