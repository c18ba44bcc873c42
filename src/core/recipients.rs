//! Recipient lifecycle across a document tree.
//!
//! Every operation rescans the tree; nothing is cached between calls. Scans
//! load and parse every candidate before anything is written, so a broken
//! document aborts the operation with no changes on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::cipher::{self, aead::DataKey};
use crate::core::constants::{EXT, LEDGER_FILE, WORKING_COPY_MARKER};
use crate::core::document::Document;
use crate::core::layout::Scope;
use crate::core::ledger::Ledger;
use crate::core::store::DocumentStore;
use crate::core::types::{Comment, PublicKey};
use crate::core::value::ValueMap;
use crate::error::{DocumentError, Error, KeyError, Result};

/// An encrypted document found by [`scan`].
#[derive(Debug, Clone)]
pub struct Located {
    pub scope: Scope,
    pub document: Document,
}

impl Located {
    pub fn path(&self) -> &Path {
        &self.document.path
    }
}

/// One recipient and where it is in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientInfo {
    pub key: PublicKey,
    pub comment: Option<Comment>,
    pub scopes: BTreeSet<Scope>,
}

/// Which documents an add or remove rewrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChangeReport {
    pub updated: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

/// Find every encrypted document under `root`, sorted by path.
///
/// `env` restricts the result to one environment (see
/// [`Scope::matches_env`]). Working copies and hidden directories are
/// skipped. A document that fails to parse aborts the scan.
pub fn scan(root: &Path, env: Option<&str>) -> Result<Vec<Located>> {
    let mut found = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            DocumentError::Read {
                path,
                source: e.into(),
            }
        })?;
        if !entry.file_type().is_file() || !is_candidate(entry.path()) {
            continue;
        }

        let scope = Scope::classify(root, entry.path());
        if let Some(filter) = env {
            if !scope.matches_env(filter) {
                continue;
            }
        }

        let Some(document) = Document::read(entry.path())? else {
            continue;
        };
        if document.is_encrypted() {
            found.push(Located { scope, document });
        }
    }

    found.sort_by(|a, b| a.path().cmp(b.path()));
    debug!(root = %root.display(), env = env.unwrap_or("*"), documents = found.len(), "scanned tree");
    Ok(found)
}

fn is_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name == LEDGER_FILE {
        return false;
    }
    let Some(stem) = name.strip_suffix(&format!(".{}", EXT)) else {
        return false;
    };
    !stem.ends_with(&format!(".{}", WORKING_COPY_MARKER))
}

/// Every recipient in use under `root`, with its comment and scopes.
///
/// Keys listed in the ledger but not used by any document are included
/// with no scopes.
pub fn list(root: &Path) -> Result<Vec<RecipientInfo>> {
    let ledger = Ledger::load(root)?;
    let mut by_key: BTreeMap<PublicKey, BTreeSet<Scope>> = BTreeMap::new();

    for located in scan(root, None)? {
        for recipient in located.document.recipients() {
            by_key
                .entry(recipient.to_string())
                .or_default()
                .insert(located.scope.clone());
        }
    }
    if let Some(ledger) = &ledger {
        for key in ledger.keys() {
            by_key.entry(key).or_default();
        }
    }

    Ok(by_key
        .into_iter()
        .map(|(key, scopes)| RecipientInfo {
            comment: ledger
                .as_ref()
                .and_then(|l| l.comment(&key))
                .map(str::to_string),
            key,
            scopes,
        })
        .collect())
}

/// Recipients new documents are encrypted for: every recipient of an
/// existing encrypted document, or the ledger's keys when there are none.
pub fn inventory(root: &Path) -> Result<Vec<PublicKey>> {
    let mut keys = BTreeSet::new();
    for located in scan(root, None)? {
        keys.extend(located.document.recipients().into_iter().map(str::to_string));
    }
    if keys.is_empty() {
        if let Some(ledger) = Ledger::load(root)? {
            keys.extend(ledger.keys());
        }
    }
    Ok(keys.into_iter().collect())
}

fn validate_key(key: &str) -> Result<()> {
    cipher::parse_recipient(key)
        .map(|_| ())
        .map_err(|_| KeyError::InvalidRecipient(key.to_string()).into())
}

fn aborted(path: &Path, source: Error, updated: &[PathBuf]) -> Error {
    KeyError::Aborted {
        path: path.to_path_buf(),
        source: Box::new(source),
        updated: updated.to_vec(),
    }
    .into()
}

/// Authorize `key` on every encrypted document (optionally one environment).
///
/// The existing data key of each document is wrapped for the new recipient;
/// values are not re-sealed. Documents that already list `key` are left as
/// they are. The ledger is updated afterwards to list every recipient in
/// use anywhere in the tree, plus `key` with its comment.
///
/// # Errors
///
/// - `KeyError::InvalidRecipient` before anything is read.
/// - `KeyError::NoEncryptedDocuments` when nothing matches.
/// - `KeyError::Aborted` if a write fails part way, naming what was updated.
pub fn add(
    store: &DocumentStore,
    root: &Path,
    key: &str,
    comment: Option<&str>,
    env: Option<&str>,
) -> Result<KeyChangeReport> {
    validate_key(key)?;

    let documents = scan(root, env)?;
    if documents.is_empty() {
        return Err(KeyError::NoEncryptedDocuments(root.to_path_buf()).into());
    }

    let mut report = KeyChangeReport::default();
    let mut pending: Vec<(Document, DataKey)> = Vec::new();
    for located in documents {
        if located.document.has_recipient(key) {
            debug!(path = %located.path().display(), "recipient already present");
            report.unchanged.push(located.document.path);
            continue;
        }
        let data_key = store
            .unwrap_key(&located.document)
            .map_err(|e| aborted(located.path(), e, &[]))?;
        pending.push((located.document, data_key));
    }

    for (mut document, data_key) in pending {
        document
            .wrap_for(key, &data_key)
            .and_then(|_| document.write())
            .map_err(|e| aborted(&document.path, e, &report.updated))?;
        info!(path = %document.path.display(), "added recipient");
        report.updated.push(document.path);
    }

    let mut ledger = Ledger::load_or_new(root)?;
    for located in scan(root, None)? {
        for recipient in located.document.recipients() {
            ledger.add(recipient, None);
        }
    }
    ledger.add(key, comment);
    ledger.save()?;

    Ok(report)
}

/// Revoke `key` from every encrypted document (optionally one environment).
///
/// Each affected document gets a fresh data key and all its values are
/// re-sealed, so the removed recipient cannot read later versions. A
/// document where `key` is the only recipient is left untouched and the
/// operation fails with `KeyError::LastRecipient` after the others are
/// done. The ledger drops `key` once no document anywhere still uses it.
///
/// # Errors
///
/// - `KeyError::RecipientNotFound` if neither a document nor the ledger has it.
/// - `KeyError::LastRecipient` naming blocked and already-updated documents.
/// - `KeyError::Aborted` if a decrypt or write fails part way.
pub fn remove(
    store: &DocumentStore,
    root: &Path,
    key: &str,
    env: Option<&str>,
) -> Result<KeyChangeReport> {
    let documents = scan(root, env)?;
    let ledger = Ledger::load(root)?;

    let listed = ledger.as_ref().is_some_and(|l| l.contains(key));
    if !listed && !documents.iter().any(|d| d.document.has_recipient(key)) {
        return Err(KeyError::RecipientNotFound(key.to_string()).into());
    }

    let mut report = KeyChangeReport::default();
    let mut blocked = Vec::new();
    let mut pending: Vec<(Document, ValueMap, Vec<PublicKey>)> = Vec::new();

    for located in documents {
        let document = located.document;
        if !document.has_recipient(key) {
            report.unchanged.push(document.path);
            continue;
        }
        let remaining: Vec<PublicKey> = document
            .recipients()
            .into_iter()
            .filter(|r| *r != key)
            .map(str::to_string)
            .collect();
        if remaining.is_empty() {
            warn!(path = %document.path.display(), "refusing to remove last recipient");
            blocked.push(document.path);
            continue;
        }
        let plaintext = store
            .plaintext(&document)
            .map_err(|e| aborted(&document.path, e, &[]))?;
        pending.push((document, plaintext, remaining));
    }

    for (document, plaintext, remaining) in pending {
        let path = document.path;
        Document::seal(&path, &plaintext, &remaining, &DataKey::generate())
            .and_then(|rotated| rotated.write())
            .map_err(|e| aborted(&path, e, &report.updated))?;
        info!(path = %path.display(), recipients = remaining.len(), "removed recipient and rotated data key");
        report.updated.push(path);
    }

    if let Some(mut ledger) = ledger {
        let still_used = scan(root, None)?
            .iter()
            .any(|d| d.document.has_recipient(key));
        if !still_used && ledger.remove(key) {
            ledger.save()?;
        }
    }

    if !blocked.is_empty() {
        return Err(KeyError::LastRecipient {
            blocked,
            updated: report.updated,
        }
        .into());
    }
    Ok(report)
}
