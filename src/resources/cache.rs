//! Memoizing fetch-and-validate of resource documents

use super::ResourceError;
use crate::models::Schema;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

type Slot = Arc<OnceCell<Result<Arc<Schema>, ResourceError>>>;

/// Validated resource schemas keyed by URI.
///
/// Each URI holds at most one result, including failures, so every import
/// of the same resource sees the same outcome. The cache is safe to share
/// between threads.
#[derive(Debug, Default)]
pub struct ResourceCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `uri`, running `validate` when none is
    /// stored yet.
    ///
    /// `validate` runs outside the slot, so callers never wait on each
    /// other. When two callers race on one URI, the first stored result wins
    /// and both return it.
    pub fn get_or_validate<F>(&self, uri: &str, validate: F) -> Result<Arc<Schema>, ResourceError>
    where
        F: FnOnce() -> Result<Arc<Schema>, ResourceError>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(uri.to_string()).or_default().clone()
        };
        if let Some(result) = slot.get() {
            debug!(uri, "Resource cache hit");
            return result.clone();
        }
        let computed = validate();
        slot.get_or_init(|| computed).clone()
    }

    pub fn contains(&self, uri: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(uri).is_some_and(|slot| slot.get().is_some())
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtensionMap, Table};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schema() -> Arc<Schema> {
        Arc::new(Schema {
            name: "base".to_string(),
            id: "#base".to_string(),
            description: None,
            version: None,
            resources: BTreeMap::new(),
            tables: vec![Table::new("#t", "t")],
            votable_utype: None,
            tap_schema_index: None,
            extensions: ExtensionMap::new(),
        })
    }

    #[test]
    fn test_validates_once_per_uri() {
        let cache = ResourceCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let result = cache.get_or_validate("base.yaml", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(schema())
            });
            assert_eq!(result.unwrap().name, "base");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("base.yaml"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_are_cached() {
        let cache = ResourceCache::new();
        let first = cache.get_or_validate("gone.yaml", || {
            Err(ResourceError::NotFound("gone.yaml".to_string()))
        });
        let second = cache.get_or_validate("gone.yaml", || Ok(schema()));
        assert_eq!(first.unwrap_err(), second.unwrap_err());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(ResourceCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    cache
                        .get_or_validate("shared.yaml", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(schema())
                        })
                        .map(|s| s.id.clone())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), "#base");
        }
        assert!(calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_stored_result_wins() {
        let cache = ResourceCache::new();
        let outer = cache.get_or_validate("race.yaml", || {
            // A nested caller stores its result while this one is running
            let inner = cache.get_or_validate("race.yaml", || Ok(schema()));
            assert!(inner.is_ok());
            Err(ResourceError::NotFound("race.yaml".to_string()))
        });
        assert_eq!(outer.unwrap().name, "base");
    }
}
