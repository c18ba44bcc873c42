//! Precedence resolution.
//!
//! Loads every existing document a [`QueryContext`] names, lowest tier
//! first, and deep-merges them into one [`LayeredConfig`].

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, trace};

use crate::core::layout::{Location, QueryContext};
use crate::core::store::Store;
use crate::core::value::{self, Value, ValueMap};
use crate::error::Result;

/// Merged values plus the documents that contributed to them.
///
/// Values sit behind a lock so a resolved config can be read from several
/// threads (e.g. rendering more than one encoding at once).
#[derive(Debug, Default)]
pub struct LayeredConfig {
    values: RwLock<ValueMap>,
    files: Vec<Location>,
}

impl LayeredConfig {
    pub fn new(values: ValueMap, files: Vec<Location>) -> Self {
        Self {
            values: RwLock::new(values),
            files,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    /// Text form of a key, if present.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.read().get(key).map(Value::to_text)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Keys that reach rendered output (no `_` prefix), sorted.
    pub fn export_keys(&self) -> Vec<String> {
        self.read()
            .keys()
            .filter(|k| !value::is_internal(k))
            .cloned()
            .collect()
    }

    /// Snapshot of the merged values.
    pub fn values(&self) -> ValueMap {
        self.read().clone()
    }

    /// Documents that existed and were merged, in precedence order.
    pub fn files(&self) -> &[Location] {
        &self.files
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|l| l.path.clone()).collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ValueMap> {
        self.values.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolve `ctx` against `store`.
///
/// Missing documents are skipped. The first load failure aborts and names
/// the failing document.
pub fn resolve(ctx: &QueryContext, store: &impl Store) -> Result<LayeredConfig> {
    let mut merged = ValueMap::new();
    let mut files = Vec::new();

    for location in ctx.locations() {
        let Some(values) = store.load(&location.path)? else {
            trace!(tier = location.tier.name(), path = %location.path.display(), "skipping missing document");
            continue;
        };

        debug!(
            tier = location.tier.name(),
            path = %location.path.display(),
            keys = values.len(),
            "merging document"
        );
        value::merge(&mut merged, values);
        files.push(location);
    }

    debug!(files = files.len(), keys = merged.len(), "resolved configuration");
    Ok(LayeredConfig::new(merged, files))
}
