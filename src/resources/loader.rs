//! Document loaders

use super::ResourceError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// URI prefix of documents shipped with the crate
pub const BUNDLED_SCHEME: &str = "resource://schema-catalog/";

const BUNDLED_DOCUMENTS: &[(&str, &str)] = &[(
    "tap_schema_std.yaml",
    include_str!("../../resources/tap_schema_std.yaml"),
)];

/// Fetches a URI and parses it into a document tree
pub trait DocumentLoader: Send + Sync {
    fn load(&self, uri: &str) -> Result<Value, ResourceError>;
}

/// Parse document text; `.json` URIs are read as JSON, anything else as YAML
pub fn parse_document(text: &str, uri: &str) -> Result<Value, ResourceError> {
    let parsed = if uri.ends_with(".json") {
        serde_json::from_str(text).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| ResourceError::Parse {
        uri: uri.to_string(),
        message,
    })
}

/// Loads plain paths and `file://` URIs
#[derive(Debug, Clone, Default)]
pub struct FileSystemLoader {
    base_dir: Option<PathBuf>,
}

impl FileSystemLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, uri: &str) -> PathBuf {
        let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl DocumentLoader for FileSystemLoader {
    fn load(&self, uri: &str) -> Result<Value, ResourceError> {
        let path = self.resolve(uri);
        debug!(path = %path.display(), "Loading document");
        if !path.exists() {
            return Err(ResourceError::NotFound(uri.to_string()));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| ResourceError::Io {
            uri: uri.to_string(),
            message: e.to_string(),
        })?;
        parse_document(&text, uri)
    }
}

/// Serves documents registered ahead of time
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    documents: HashMap<String, Value>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, document: Value) {
        self.documents.insert(uri.into(), document);
    }

    /// Builder-style [`InMemoryLoader::insert`]
    pub fn with_document(mut self, uri: impl Into<String>, document: Value) -> Self {
        self.insert(uri, document);
        self
    }

    /// Register document text, parsed as it would be when loaded from `uri`
    pub fn with_text(self, uri: &str, text: &str) -> Result<Self, ResourceError> {
        let document = parse_document(text, uri)?;
        Ok(self.with_document(uri, document))
    }
}

impl DocumentLoader for InMemoryLoader {
    fn load(&self, uri: &str) -> Result<Value, ResourceError> {
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(uri.to_string()))
    }
}

/// Serves documents compiled into the crate under [`BUNDLED_SCHEME`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLoader;

impl BundledLoader {
    /// Text of a bundled document, by file name
    pub fn text(name: &str) -> Option<&'static str> {
        BUNDLED_DOCUMENTS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| *text)
    }
}

impl DocumentLoader for BundledLoader {
    fn load(&self, uri: &str) -> Result<Value, ResourceError> {
        let name = uri
            .strip_prefix(BUNDLED_SCHEME)
            .ok_or_else(|| ResourceError::UnsupportedScheme(uri.to_string()))?;
        let text = Self::text(name).ok_or_else(|| ResourceError::NotFound(uri.to_string()))?;
        parse_document(text, uri)
    }
}

/// Fetches `http(s)://` documents with a blocking client
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpLoader {
    pub fn new(timeout: std::time::Duration) -> Result<Self, ResourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResourceError::Http {
                uri: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl DocumentLoader for HttpLoader {
    fn load(&self, uri: &str) -> Result<Value, ResourceError> {
        let http_error = |e: reqwest::Error| ResourceError::Http {
            uri: uri.to_string(),
            message: e.to_string(),
        };
        debug!(uri, "Fetching document");
        let text = self
            .client
            .get(uri)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(http_error)?;
        parse_document(&text, uri)
    }
}

/// Dispatches on URI scheme
#[derive(Debug, Clone, Default)]
pub struct DefaultLoader {
    files: FileSystemLoader,
    #[cfg(feature = "http")]
    http: Option<HttpLoader>,
}

impl DefaultLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            files: FileSystemLoader::with_base_dir(base_dir),
            #[cfg(feature = "http")]
            http: None,
        }
    }

    #[cfg(feature = "http")]
    pub fn with_http(mut self, loader: HttpLoader) -> Self {
        self.http = Some(loader);
        self
    }
}

impl DocumentLoader for DefaultLoader {
    fn load(&self, uri: &str) -> Result<Value, ResourceError> {
        if uri.starts_with(BUNDLED_SCHEME) {
            return BundledLoader.load(uri);
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            #[cfg(feature = "http")]
            if let Some(http) = &self.http {
                return http.load(uri);
            }
            return Err(ResourceError::UnsupportedScheme(uri.to_string()));
        }
        if uri.contains("://") && !uri.starts_with("file://") {
            return Err(ResourceError::UnsupportedScheme(uri.to_string()));
        }
        self.files.load(uri)
    }
}
