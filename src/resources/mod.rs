//! External document loading
//!
//! Provides:
//! - [`DocumentLoader`]: fetch a URI and parse it into a document tree
//! - Loaders for the file system, in-memory documents, bundled package
//!   resources and (feature `http`) remote URLs
//! - [`ResourceCache`]: at-most-once fetch-and-validate per URI

pub mod cache;
pub mod loader;

pub use cache::ResourceCache;
#[cfg(feature = "http")]
pub use loader::HttpLoader;
pub use loader::{
    BUNDLED_SCHEME, BundledLoader, DefaultLoader, DocumentLoader, FileSystemLoader,
    InMemoryLoader, parse_document,
};

/// Error while fetching or validating an external document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Failed to read {uri}: {message}")]
    Io { uri: String, message: String },
    #[error("Failed to parse {uri}: {message}")]
    Parse { uri: String, message: String },
    #[error("Failed to fetch {uri}: {message}")]
    Http { uri: String, message: String },
    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Import cycle: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },
    #[error("Resource {uri} is not a valid schema: {message}")]
    Invalid { uri: String, message: String },
}
