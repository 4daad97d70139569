//! Schema validation
//!
//! Turns a loosely-typed document tree into a validated [`Schema`]:
//! - Structural parse with field defaults and unknown-field rejection
//! - Identifier indexing across the whole document
//! - `columnRefs` resolution against external resource documents
//! - Reference resolution and cross-object invariant checks
//! - Opt-in advisory checks (descriptions, redundant overrides, TAP indexes)
//!
//! Problems are collected across all stages and returned together.

mod checks;
pub mod column_refs;
pub mod error;
pub mod ids;
pub mod index;
pub mod options;
mod parser;
pub mod path;
mod references;

pub use column_refs::ALLOWED_OVERRIDES;
pub use error::{ErrorKind, SchemaValidationError, ValidationIssue};
pub use ids::generate_ids;
pub use index::{IdIndex, IndexEntry, IndexError, ObjectKind};
pub use options::ValidationOptions;
pub use path::FieldPath;

use crate::models::{ColumnReference, Schema};
use crate::resources::{DefaultLoader, DocumentLoader, ResourceCache, ResourceError};
use error::IssueLog;
use parser::{ColumnRefDecl, DocumentParser, ParsedDocument};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Progress of one document through validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    Unparsed,
    StructurallyParsed,
    IdentifiersIndexed,
    ReferencesResolved,
    Validated,
    Failed,
}

/// Validates documents into [`Schema`] graphs.
///
/// Each call runs independently. Resource documents are cached per URI for
/// the duration of one call, unless a shared cache is supplied with
/// [`SchemaValidator::with_cache`].
///
/// # Example
///
/// ```rust
/// use schema_catalog_sdk::validation::{SchemaValidator, ValidationOptions};
///
/// let yaml = r##"
/// name: sales
/// "@id": "#sales"
/// tables:
///   - name: customers
///     "@id": "#customers"
///     primaryKey: "#customers.customer_id"
///     columns:
///       - name: customer_id
///         "@id": "#customers.customer_id"
///         datatype: int
///         nullable: false
/// "##;
///
/// let validator = SchemaValidator::new(ValidationOptions::default());
/// let schema = validator.validate_str(yaml).unwrap();
/// assert_eq!(schema.tables[0].columns.len(), 1);
/// ```
pub struct SchemaValidator {
    options: ValidationOptions,
    loader: Arc<dyn DocumentLoader>,
    cache: Option<Arc<ResourceCache>>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(ValidationOptions::default())
    }
}

/// State of one validation run
struct Run<'v> {
    validator: &'v SchemaValidator,
    cache: &'v ResourceCache,
    /// URIs of the resource documents currently being validated, outermost first
    chain: Vec<String>,
    stage: ValidationStage,
    log: IssueLog,
}

impl Run<'_> {
    fn advance(&mut self, next: ValidationStage) {
        debug!(
            from = ?self.stage,
            to = ?next,
            issues = self.log.len(),
            chain_depth = self.chain.len(),
            "Validation stage"
        );
        self.stage = next;
    }
}

impl SchemaValidator {
    /// Create a validator that loads resources from the file system
    pub fn new(options: ValidationOptions) -> Self {
        Self {
            options,
            loader: Arc::new(DefaultLoader::new()),
            cache: None,
        }
    }

    /// Use a different loader for resource documents
    pub fn with_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Share one resource cache between runs
    pub fn with_cache(mut self, cache: Arc<ResourceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate a parsed document tree
    pub fn validate(&self, document: &Value) -> Result<Schema, SchemaValidationError> {
        let cache = self.cache.clone().unwrap_or_default();
        self.run(document, Vec::new(), &cache)
    }

    /// Validate YAML (or JSON) text
    pub fn validate_str(&self, text: &str) -> Result<Schema, SchemaValidationError> {
        let document: Value = serde_yaml::from_str(text).map_err(|e| SchemaValidationError {
            issues: vec![ValidationIssue {
                path: FieldPath::root(),
                kind: ErrorKind::Parse,
                message: format!("Document is not valid YAML: {}", e),
            }],
        })?;
        self.validate(&document)
    }

    /// Load a document through the configured loader and validate it
    pub fn validate_uri(&self, uri: &str) -> Result<Schema, SchemaValidationError> {
        let document = self.loader.load(uri).map_err(|e| SchemaValidationError {
            issues: vec![ValidationIssue {
                path: FieldPath::root(),
                kind: ErrorKind::ResourceResolution,
                message: e.to_string(),
            }],
        })?;
        let cache = self.cache.clone().unwrap_or_default();
        self.run(&document, vec![uri.to_string()], &cache)
    }

    fn run(
        &self,
        document: &Value,
        chain: Vec<String>,
        cache: &ResourceCache,
    ) -> Result<Schema, SchemaValidationError> {
        let mut run = Run {
            validator: self,
            cache,
            chain,
            stage: ValidationStage::Unparsed,
            log: IssueLog::default(),
        };

        let generated;
        let document = if self.options.id_generation {
            generated = generate_ids(document);
            &generated
        } else {
            document
        };

        let parsed = DocumentParser::new(&mut run.log, self.options.force_unbounded_arraysize)
            .parse(document);
        let Some(ParsedDocument {
            mut schema,
            declarations,
            column_refs,
            poisoned,
            table_paths,
        }) = parsed
        else {
            run.advance(ValidationStage::Failed);
            return Err(run.log.into_error());
        };
        run.advance(ValidationStage::StructurallyParsed);

        let mut index = IdIndex::new();
        for (id, entry) in declarations {
            let path = entry.path.clone();
            if let Err(e) = index.register(&id, entry) {
                references::report_index_error(&mut run.log, e, path);
            }
        }
        run.advance(ValidationStage::IdentifiersIndexed);

        run.import_columns(&mut schema, &column_refs, &mut index);
        references::resolve_references(&schema, &index, &table_paths, &poisoned, &mut run.log);
        run.advance(ValidationStage::ReferencesResolved);

        checks::check_invariants(&schema, &index, &table_paths, &mut run.log);
        checks::run_optional_checks(&schema, &index, &table_paths, &self.options, &mut run.log);

        if run.log.is_empty() {
            run.advance(ValidationStage::Validated);
            info!(
                schema = %schema.name,
                tables = schema.tables.len(),
                ids = index.len(),
                "Schema validated"
            );
            Ok(schema)
        } else {
            run.advance(ValidationStage::Failed);
            Err(run.log.into_error())
        }
    }
}

impl Run<'_> {
    fn import_columns(
        &mut self,
        schema: &mut Schema,
        column_refs: &[ColumnRefDecl],
        index: &mut IdIndex,
    ) {
        let validator = self.validator;
        let options = &validator.options;
        for decl in column_refs {
            let Some(uri) = schema.resources.get(&decl.resource).cloned() else {
                self.log.report(
                    ErrorKind::ResourceResolution,
                    decl.path.clone(),
                    format!(
                        "Resource '{}' is not declared in 'resources'",
                        decl.resource
                    ),
                );
                continue;
            };
            let source = match self.load_resource(&uri) {
                Ok(source) => source,
                Err(e) => {
                    self.log
                        .report(ErrorKind::ResourceResolution, decl.path.clone(), e.to_string());
                    continue;
                }
            };
            let Some(column) = column_refs::import_column(
                decl,
                &source,
                &uri,
                options.force_unbounded_arraysize,
                &mut self.log,
            ) else {
                continue;
            };

            let kind = if options.dereference_resources {
                ObjectKind::Column
            } else {
                ObjectKind::ColumnReference
            };
            let entry = IndexEntry::new(kind, decl.path.clone()).in_table(&decl.table_id);
            if let Err(e) = index.register(&column.id, entry) {
                references::report_index_error(&mut self.log, e, decl.path.clone());
                continue;
            }

            let Some(table) = schema.tables.get_mut(decl.table_position) else {
                continue;
            };
            if options.dereference_resources {
                table.columns.push(column);
            } else {
                table.column_refs.push(ColumnReference {
                    resource: decl.resource.clone(),
                    table: decl.source_table.clone(),
                    name: decl.name.clone(),
                    ref_name: decl.ref_name.clone(),
                    overrides: decl.overrides.clone(),
                    column,
                });
            }
        }
    }

    /// Fetch and validate a resource document, once per URI
    fn load_resource(&self, uri: &str) -> Result<Arc<Schema>, ResourceError> {
        if self.chain.iter().any(|u| u == uri) {
            let mut chain = self.chain.clone();
            chain.push(uri.to_string());
            return Err(ResourceError::Cycle { chain });
        }
        let validator = self.validator;
        self.cache.get_or_validate(uri, || {
            let document = validator.loader.load(uri)?;
            let mut chain = self.chain.clone();
            chain.push(uri.to_string());
            validator
                .run(&document, chain, self.cache)
                .map(Arc::new)
                .map_err(|e| ResourceError::Invalid {
                    uri: uri.to_string(),
                    message: e
                        .issues
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; "),
                })
        })
    }
}

/// Validate a document with default options
pub fn validate(document: &Value) -> Result<Schema, SchemaValidationError> {
    SchemaValidator::default().validate(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::InMemoryLoader;
    use serde_json::json;

    fn shared() -> Value {
        json!({
            "name": "shared", "@id": "#shared",
            "tables": [{
                "name": "customers", "@id": "#customers",
                "columns": [
                    {"name": "name", "@id": "#customers.name", "datatype": "string", "length": 30},
                    {"name": "email", "@id": "#customers.email", "datatype": "string", "length": 64}
                ]
            }]
        })
    }

    fn importing(columns: Value) -> Value {
        json!({
            "name": "sales", "@id": "#sales",
            "resources": {"shared": "mem://shared.yaml"},
            "tables": [{
                "name": "orders", "@id": "#orders",
                "primaryKey": "#orders.id",
                "columns": [
                    {"name": "id", "@id": "#orders.id", "datatype": "long", "nullable": false}
                ],
                "columnRefs": {"shared": {"customers": columns}}
            }]
        })
    }

    fn validator(options: ValidationOptions) -> SchemaValidator {
        let loader = InMemoryLoader::new().with_document("mem://shared.yaml", shared());
        SchemaValidator::new(options).with_loader(Arc::new(loader))
    }

    #[test]
    fn test_dereferenced_columns_are_appended() {
        let schema = validator(ValidationOptions::default())
            .validate(&importing(json!({"customer_name": {"ref_name": "name"}})))
            .unwrap();
        let names: Vec<_> = schema.tables[0]
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "customer_name"]);
        assert!(schema.tables[0].column_refs.is_empty());
    }

    #[test]
    fn test_preserved_references() {
        let options = ValidationOptions {
            dereference_resources: false,
            ..ValidationOptions::default()
        };
        let schema = validator(options)
            .validate(&importing(json!({"email": null})))
            .unwrap();
        let table = &schema.tables[0];
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.column_refs.len(), 1);
        assert_eq!(table.column_refs[0].column.id, "#orders.email");
        assert!(table.column("#orders.email").is_some());
    }

    #[test]
    fn test_description_check_covers_preserved_references() {
        let options = ValidationOptions {
            dereference_resources: false,
            check_description: true,
            ..ValidationOptions::default()
        };
        let err = validator(options)
            .validate(&importing(json!({"email": null})))
            .unwrap_err();
        assert!(
            err.of_kind(ErrorKind::CheckFailed)
                .any(|issue| issue.message.contains("'#orders.email'"))
        );
    }

    #[test]
    fn test_undeclared_resource() {
        let mut document = importing(json!({"email": null}));
        document["resources"] = json!({});
        let err = validator(ValidationOptions::default())
            .validate(&document)
            .unwrap_err();
        assert!(err.has_kind(ErrorKind::ResourceResolution));
    }

    #[test]
    fn test_resource_failure_is_reported_not_raised() {
        let err = SchemaValidator::new(ValidationOptions::default())
            .with_loader(Arc::new(InMemoryLoader::new()))
            .validate(&importing(json!({"email": null})))
            .unwrap_err();
        let issue = err.of_kind(ErrorKind::ResourceResolution).next().unwrap();
        assert_eq!(
            issue.path.to_string(),
            "tables[0].columnRefs.shared.customers.email"
        );
        assert!(issue.message.contains("mem://shared.yaml"));
    }

    #[test]
    fn test_import_cycle_detected() {
        let a = json!({
            "name": "a", "@id": "#a",
            "resources": {"b": "mem://b.yaml"},
            "tables": [{"name": "t", "@id": "#t", "columnRefs": {"b": {"t": {"c": null}}}}]
        });
        let b = json!({
            "name": "b", "@id": "#b",
            "resources": {"a": "mem://a.yaml"},
            "tables": [{"name": "t", "@id": "#t", "columnRefs": {"a": {"t": {"c": null}}}}]
        });
        let loader = InMemoryLoader::new()
            .with_document("mem://a.yaml", a)
            .with_document("mem://b.yaml", b);
        let err = SchemaValidator::default()
            .with_loader(Arc::new(loader))
            .validate_uri("mem://a.yaml")
            .unwrap_err();
        assert!(err.issues.iter().any(|i| i.message.contains("Import cycle")));
    }

    #[test]
    fn test_shared_cache_loads_once() {
        let cache = Arc::new(ResourceCache::new());
        let v = validator(ValidationOptions::default()).with_cache(Arc::clone(&cache));
        v.validate(&importing(json!({"email": null}))).unwrap();
        assert!(cache.contains("mem://shared.yaml"));
        v.validate(&importing(json!({"email": null}))).unwrap();
        assert_eq!(cache.len(), 1);
    }

    /// Holds the first two loads until both callers are inside one
    struct RendezvousLoader {
        inner: InMemoryLoader,
        barrier: std::sync::Barrier,
        loads: std::sync::atomic::AtomicUsize,
    }

    impl DocumentLoader for RendezvousLoader {
        fn load(&self, uri: &str) -> Result<Value, ResourceError> {
            if self.loads.fetch_add(1, std::sync::atomic::Ordering::SeqCst) < 2 {
                self.barrier.wait();
            }
            self.inner.load(uri)
        }
    }

    #[test]
    fn test_shared_cache_mutual_imports_across_threads() {
        let mutual = |name: &str, other: &str| {
            json!({
                "name": name, "@id": format!("#{}", name),
                "resources": {"other": format!("mem://{}.yaml", other)},
                "tables": [{"name": "t", "@id": "#t", "columnRefs": {"other": {"t": {"c": null}}}}]
            })
        };
        let entry = |uri: &str| {
            json!({
                "name": "entry", "@id": "#entry",
                "resources": {"r": uri},
                "tables": [{"name": "t", "@id": "#t", "columnRefs": {"r": {"t": {"c": null}}}}]
            })
        };
        let loader = RendezvousLoader {
            inner: InMemoryLoader::new()
                .with_document("mem://a.yaml", mutual("a", "b"))
                .with_document("mem://b.yaml", mutual("b", "a")),
            barrier: std::sync::Barrier::new(2),
            loads: std::sync::atomic::AtomicUsize::new(0),
        };
        let validator = Arc::new(
            SchemaValidator::default()
                .with_loader(Arc::new(loader))
                .with_cache(Arc::new(ResourceCache::new())),
        );

        let (tx, rx) = std::sync::mpsc::channel();
        for uri in ["mem://a.yaml", "mem://b.yaml"] {
            let validator = Arc::clone(&validator);
            let tx = tx.clone();
            let document = entry(uri);
            std::thread::spawn(move || {
                let _ = tx.send(validator.validate(&document));
            });
        }
        for _ in 0..2 {
            let result = rx
                .recv_timeout(std::time::Duration::from_secs(10))
                .expect("validation did not finish");
            assert!(result.unwrap_err().has_kind(ErrorKind::ResourceResolution));
        }
    }

    #[test]
    fn test_id_generation() {
        let options = ValidationOptions {
            id_generation: true,
            ..ValidationOptions::default()
        };
        let schema = SchemaValidator::new(options)
            .validate(&json!({
                "name": "s",
                "tables": [{
                    "name": "t",
                    "primaryKey": "#t.id",
                    "columns": [{"name": "id", "datatype": "int", "nullable": false}]
                }]
            }))
            .unwrap();
        assert_eq!(schema.id, "#s");
        assert_eq!(schema.tables[0].columns[0].id, "#t.id");
    }

    #[test]
    fn test_invalid_yaml() {
        let err = SchemaValidator::default()
            .validate_str("name: [unclosed")
            .unwrap_err();
        assert_eq!(err.issues[0].kind, ErrorKind::Parse);
    }
}
