//! Value operations (init, set, get, generate).
//!
//! High-level operations composed from the store, resolver, template engine
//! and formatter.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::constants::{BASE_DIR, INIT_MARKER_KEY, METADATA_KEY};
use crate::core::format::{self, FormatOptions};
use crate::core::layout::{Location, QueryContext};
use crate::core::ledger::Ledger;
use crate::core::recipients;
use crate::core::resolve;
use crate::core::store::{fs, DocumentStore};
use crate::core::template;
use crate::core::types::{ConfigKey, PublicKey};
use crate::core::value::{self, Value, ValueMap};
use crate::error::{ConfigError, DocumentError, Error, KeyError, Result};

/// What `init` created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// `base/shared.yml`, if it did not exist before.
    pub shared: Option<PathBuf>,
    pub ledger: PathBuf,
}

/// Initialize a configuration tree encrypted for `keys`.
///
/// # Arguments
///
/// * `root` - Root directory of the tree
/// * `keys` - age public keys; at least one
/// * `comment` - Ledger comment applied to every key
///
/// # Errors
///
/// Returns `KeyError::InvalidRecipient` for a malformed key (nothing is
/// written), or `ConfigError::AlreadyInitialized` if a ledger exists.
pub fn init(root: &Path, keys: &[PublicKey], comment: Option<&str>) -> Result<InitReport> {
    if keys.is_empty() {
        return Err(KeyError::NoRecipients(root.to_path_buf()).into());
    }
    for key in keys {
        crate::core::cipher::parse_recipient(key)
            .map_err(|_| KeyError::InvalidRecipient(key.clone()))?;
    }

    let ledger_path = Ledger::path_for(root);
    if ledger_path.exists() {
        return Err(ConfigError::AlreadyInitialized(ledger_path).into());
    }

    let base = root.join(BASE_DIR);
    fs::ensure_dir(&base).map_err(|source| DocumentError::Write {
        path: base.clone(),
        source,
    })?;

    let shared = QueryContext::new(root).write_location().path;
    let created = if shared.exists() {
        debug!(path = %shared.display(), "keeping existing document");
        None
    } else {
        let mut values = ValueMap::new();
        values.insert(INIT_MARKER_KEY.to_string(), Value::from("true"));
        DocumentStore::default().save(&shared, &values, keys)?;
        Some(shared)
    };

    let mut ledger = Ledger::new(root);
    for key in keys {
        ledger.add(key, comment);
    }
    ledger.save()?;

    info!(root = %root.display(), keys = keys.len(), "initialized");
    Ok(InitReport {
        shared: created,
        ledger: ledger_path,
    })
}

/// Set `key` to `value` in the single document `ctx` writes to.
///
/// The document is decrypted if needed, updated, and re-encrypted for the
/// recipient inventory of the whole tree. Returns the document location.
///
/// # Errors
///
/// Returns `DocumentError::ReservedKey` for `sops`, or `KeyError::NoRecipients`
/// when the tree has no recipients yet.
pub fn set(store: &DocumentStore, ctx: &QueryContext, key: &str, value: &str) -> Result<Location> {
    if key == METADATA_KEY {
        return Err(DocumentError::ReservedKey(key.to_string()).into());
    }

    let recipients = recipients::inventory(ctx.root())?;
    if recipients.is_empty() {
        return Err(KeyError::NoRecipients(ctx.root().to_path_buf()).into());
    }

    let location = ctx.write_location();
    let mut values = match store.open(&location.path)? {
        Some(doc) => store.plaintext(&doc)?,
        None => ValueMap::new(),
    };
    let key: ConfigKey = key.to_string();
    values.insert(key.clone(), Value::from(value));

    store.save(&location.path, &values, &recipients)?;
    info!(
        key = %key,
        tier = location.tier.name(),
        path = %location.path.display(),
        "set value"
    );
    Ok(location)
}

/// Resolve and template-expand `ctx`, then look up `key`.
///
/// Internal (`_`) keys are returned like any other.
pub fn get(store: &DocumentStore, ctx: &QueryContext, key: &str) -> Result<Value> {
    let values = resolved(store, ctx)?;
    values
        .get(key)
        .cloned()
        .ok_or_else(|| Error::KeyNotFound(key.to_string()))
}

/// Resolve, expand, drop internal keys and render with `options`.
///
/// Options are validated before any document is read.
pub fn generate(store: &DocumentStore, ctx: &QueryContext, options: &FormatOptions) -> Result<String> {
    options.validate()?;
    let values = resolved(store, ctx)?;
    let exported = value::without_internal(&values);
    debug!(
        keys = exported.len(),
        hidden = values.len() - exported.len(),
        encoding = options.encoding.name(),
        "rendering"
    );
    format::format(&exported, options)
}

fn resolved(store: &DocumentStore, ctx: &QueryContext) -> Result<ValueMap> {
    let config = resolve::resolve(ctx, store)?;
    Ok(template::resolve(&config.values())?)
}
