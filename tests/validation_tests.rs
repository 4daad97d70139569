//! Validation tests over complete documents

use schema_catalog_sdk::models::Schema;
use schema_catalog_sdk::resources::InMemoryLoader;
use schema_catalog_sdk::types::DataType;
use schema_catalog_sdk::validation::{
    ErrorKind, SchemaValidationError, SchemaValidator, ValidationOptions,
};
use std::sync::Arc;

const SALES: &str = r##"
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
        nullable: false
  - name: orders
    "@id": "#orders"
    columns:
      - name: customer_id
        "@id": "#orders.customer_id"
        datatype: int
    constraints:
      - name: fk_orders_customer
        "@id": "#fk_orders_customer"
        "@type": ForeignKey
        columns: ["#orders.customer_id"]
        referencedColumns: ["#customers.customer_id"]
        on_delete: SET NULL
"##;

fn validate(text: &str) -> Result<Schema, SchemaValidationError> {
    SchemaValidator::default().validate_str(text)
}

fn kinds_and_paths(error: &SchemaValidationError) -> Vec<(ErrorKind, String)> {
    error
        .issues
        .iter()
        .map(|i| (i.kind, i.path.to_string()))
        .collect()
}

mod document_tests {
    use super::*;

    #[test]
    fn test_sales_document_validates() {
        let schema = validate(SALES).unwrap();
        assert_eq!(schema.name, "sales");
        assert_eq!(schema.tables.len(), 2);
        assert_eq!(schema.tables[0].primary_key, vec!["#customers.customer_id"]);
        assert!(schema.tables[1].columns[0].nullable);
        assert_eq!(schema.foreign_keys().count(), 1);
    }

    #[test]
    fn test_forward_references_resolve() {
        // orders is declared before the table it references
        let reordered = r##"
name: sales
"@id": "#sales"
tables:
  - name: orders
    "@id": "#orders"
    columns:
      - name: customer_id
        "@id": "#orders.customer_id"
        datatype: int
    constraints:
      - name: fk_orders_customer
        "@id": "#fk_orders_customer"
        "@type": ForeignKey
        columns: ["#orders.customer_id"]
        referencedColumns: ["#customers.customer_id"]
  - name: customers
    "@id": "#customers"
    primaryKey: "#customers.customer_id"
    columns:
      - name: customer_id
        "@id": "#customers.customer_id"
        datatype: int
        nullable: false
"##;
        assert!(validate(reordered).is_ok());
    }

    #[test]
    fn test_validation_is_deterministic() {
        let first = validate(SALES).unwrap();
        let second = validate(SALES).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_document(), second.to_document());
    }

    #[test]
    fn test_json_and_yaml_agree() {
        let yaml = validate(SALES).unwrap();
        let json_text = serde_json::to_string(&yaml.to_document()).unwrap();
        let json = validate(&json_text).unwrap();
        assert_eq!(yaml.to_document(), json.to_document());
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn test_string_without_length_names_column() {
        let error = validate(&SALES.replace("        length: 30\n", "")).unwrap_err();
        let issue = error.of_kind(ErrorKind::InvalidLength).next().unwrap();
        assert!(issue.message.contains("#customers.name"));
    }

    #[test]
    fn test_nullable_primary_key() {
        let text = SALES.replacen("        nullable: false\n", "", 1);
        let error = validate(&text).unwrap_err();
        assert_eq!(
            kinds_and_paths(&error),
            vec![(ErrorKind::NullablePrimaryKey, "tables[0].primaryKey".to_string())]
        );
    }

    #[test]
    fn test_duplicate_constraint_names_cite_both_locations() {
        let text = SALES.replace(
            "    primaryKey: \"#customers.customer_id\"\n",
            r##"    primaryKey: "#customers.customer_id"
    constraints:
      - name: fk_orders_customer
        "@id": "#uq_customers_name"
        "@type": Unique
        columns: ["#customers.name"]
"##,
        );
        let error = validate(&text).unwrap_err();
        let issue = error.of_kind(ErrorKind::NameUniqueness).next().unwrap();
        assert_eq!(issue.path.to_string(), "tables[1].constraints[0]");
        assert!(issue.message.contains("tables[0].constraints[0]"));
        assert!(issue.message.contains("tables[1].constraints[0]"));
    }

    #[test]
    fn test_foreign_key_cardinality_mismatch() {
        let text = SALES.replace(
            "referencedColumns: [\"#customers.customer_id\"]",
            "referencedColumns: [\"#customers.customer_id\", \"#customers.name\"]",
        );
        let error = validate(&text).unwrap_err();
        assert_eq!(
            kinds_and_paths(&error),
            vec![(ErrorKind::ConstraintShape, "tables[1].constraints[0]".to_string())]
        );
    }

    #[test]
    fn test_errors_are_aggregated() {
        let text = SALES
            .replace("        length: 30\n", "")
            .replace("datatype: int\n    constraints", "datatype: integer\n    constraints")
            .replace("\"#customers.customer_id\"]", "\"#customers.missing\"]");
        let error = validate(&text).unwrap_err();
        assert!(error.has_kind(ErrorKind::InvalidLength));
        assert!(error.has_kind(ErrorKind::InvalidType));
        assert!(error.has_kind(ErrorKind::UnresolvedReference));
    }

    #[test]
    fn test_duplicate_ids() {
        let text = SALES.replace(
            "\"@id\": \"#orders.customer_id\"",
            "\"@id\": \"#customers.name\"",
        );
        let error = validate(&text).unwrap_err();
        assert!(error.has_kind(ErrorKind::DuplicateId));
    }

    #[test]
    fn test_kind_mismatch() {
        let text = SALES.replace(
            "columns: [\"#orders.customer_id\"]",
            "columns: [\"#orders\"]",
        );
        let error = validate(&text).unwrap_err();
        assert!(error.has_kind(ErrorKind::KindMismatch));
    }
}

mod column_ref_tests {
    use super::*;

    const SHARED: &str = r##"
name: shared
"@id": "#shared"
tables:
  - name: customers
    "@id": "#customers"
    columns:
      - name: name
        "@id": "#customers.name"
        datatype: string
        length: 30
        description: Customer name
"##;

    fn importing(overrides: &str) -> String {
        format!(
            r##"
name: warehouse
"@id": "#warehouse"
resources:
  shared: shared.yaml
tables:
  - name: shipments
    "@id": "#shipments"
    columns:
      - name: shipment_id
        "@id": "#shipments.shipment_id"
        datatype: long
    columnRefs:
      shared:
        customers:
          customer_name:
            ref_name: name
            overrides: {}
"##,
            overrides
        )
    }

    fn validator(options: ValidationOptions) -> SchemaValidator {
        let loader = InMemoryLoader::new().with_text("shared.yaml", SHARED).unwrap();
        SchemaValidator::new(options).with_loader(Arc::new(loader))
    }

    #[test]
    fn test_import_materializes_column() {
        let schema = validator(ValidationOptions::default())
            .validate_str(&importing("{}"))
            .unwrap();
        let columns: Vec<&str> = schema.tables[0]
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(columns, vec!["shipment_id", "customer_name"]);
        assert_eq!(schema.tables[0].columns[1].length, Some(30));
        assert_eq!(
            schema.tables[0].columns[1].description.as_deref(),
            Some("Customer name")
        );
    }

    #[test]
    fn test_disallowed_override() {
        let error = validator(ValidationOptions::default())
            .validate_str(&importing("{name: other}"))
            .unwrap_err();
        assert!(error.has_kind(ErrorKind::OverrideNotAllowed));
    }

    #[test]
    fn test_datatype_override_applied() {
        let schema = validator(ValidationOptions::default())
            .validate_str(&importing("{datatype: long}"))
            .unwrap();
        let column = &schema.tables[0].columns[1];
        assert_eq!(column.datatype, DataType::Long);
        assert_eq!(column.length, None);
    }

    #[test]
    fn test_preserved_references() {
        let options = ValidationOptions {
            dereference_resources: false,
            ..Default::default()
        };
        let schema = validator(options).validate_str(&importing("{}")).unwrap();
        let table = &schema.tables[0];
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.all_columns().count(), 2);
    }

    #[test]
    fn test_missing_resource() {
        let error = SchemaValidator::default()
            .with_loader(Arc::new(InMemoryLoader::new()))
            .validate_str(&importing("{}"))
            .unwrap_err();
        assert!(error.has_kind(ErrorKind::ResourceResolution));
    }
}

mod advisory_check_tests {
    use super::*;

    #[test]
    fn test_checks_off_by_default() {
        assert!(validate(SALES).is_ok());
    }

    #[test]
    fn test_description_check() {
        let options = ValidationOptions {
            check_description: true,
            ..Default::default()
        };
        let error = SchemaValidator::new(options).validate_str(SALES).unwrap_err();
        assert!(error.of_kind(ErrorKind::CheckFailed).count() >= 3);
    }

    #[test]
    fn test_tap_principal_check() {
        let options = ValidationOptions {
            check_tap_principal: true,
            ..Default::default()
        };
        let text = SALES.replace(
            "        length: 30\n",
            "        length: 30\n        tap:principal: 1\n",
        );
        let error = SchemaValidator::new(options).validate_str(&text).unwrap_err();
        let failures: Vec<_> = error.of_kind(ErrorKind::CheckFailed).collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("orders"));
    }

    #[test]
    fn test_id_generation() {
        let options = ValidationOptions {
            id_generation: true,
            ..Default::default()
        };
        let text = r##"
name: sales
tables:
  - name: customers
    columns:
      - name: customer_id
        datatype: int
"##;
        let schema = SchemaValidator::new(options).validate_str(text).unwrap();
        assert_eq!(schema.tables[0].columns[0].id, "#customers.customer_id");
    }
}
