//! Plaintext working copies for bulk edits.
//!
//! `decrypt` writes `<name>.dec.yml` next to `<name>.yml`; `encrypt` seals
//! the working copy back over the original and deletes it. A working copy
//! that cannot be deleted is reported as [`Error::Cleanup`], never as a
//! plain I/O error.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::constants::{EXT, LEDGER_FILE, WORKING_COPY_MARKER};
use crate::core::document::Document;
use crate::core::recipients;
use crate::core::store::{fs, DocumentStore};
use crate::core::types::PublicKey;
use crate::error::{DocumentError, Error, KeyError, Result};

/// `dir/name.yml` → `dir/name.dec.yml`.
pub fn working_copy_path(original: &Path) -> PathBuf {
    let name = original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let renamed = match name.rsplit_once('.') {
        Some((stem, ext)) if ext == EXT || ext == "yaml" => {
            format!("{}.{}.{}", stem, WORKING_COPY_MARKER, ext)
        }
        _ => format!("{}.{}", name, WORKING_COPY_MARKER),
    };
    original.with_file_name(renamed)
}

/// `dir/name.dec.yml` → `dir/name.yml`; anything else is rejected.
pub fn original_path(working: &Path) -> Result<PathBuf> {
    let name = working
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let marker = format!(".{}", WORKING_COPY_MARKER);

    let restored = if let Some((stem, ext)) = name.rsplit_once('.') {
        match stem.strip_suffix(&marker) {
            Some(base) if !base.is_empty() => Some(format!("{}.{}", base, ext)),
            _ if ext == WORKING_COPY_MARKER && !stem.is_empty() => Some(stem.to_string()),
            _ => None,
        }
    } else {
        None
    };

    restored
        .map(|n| working.with_file_name(n))
        .ok_or_else(|| DocumentError::NotWorkingCopy(working.to_path_buf()).into())
}

/// Nearest ancestor of `path` holding a ledger, else the document's
/// grandparent directory.
pub fn find_root(path: &Path) -> PathBuf {
    let start = path.parent().unwrap_or(Path::new("."));
    for dir in start.ancestors() {
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        if dir.join(LEDGER_FILE).is_file() {
            return dir.to_path_buf();
        }
    }
    match start.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Decrypt `path` into a 0600 working copy. Returns the working copy path.
pub fn decrypt(store: &DocumentStore, path: &Path) -> Result<PathBuf> {
    let document = store
        .open(path)?
        .ok_or_else(|| DocumentError::NotFound(path.to_path_buf()))?;
    if !document.is_encrypted() {
        return Err(DocumentError::NotEncrypted(path.to_path_buf()).into());
    }

    let values = store.plaintext(&document)?;
    let working = working_copy_path(path);
    let plain = Document {
        path: working.clone(),
        values,
        metadata: None,
    };
    let yaml = plain.to_yaml()?;
    fs::write_private(&working, &yaml).map_err(|source| DocumentError::Write {
        path: working.clone(),
        source,
    })?;

    info!(original = %path.display(), working = %working.display(), "wrote working copy");
    Ok(working)
}

/// Seal a working copy back over its original and delete it.
///
/// Recipients come from the original's metadata when it has any, else from
/// the recipient inventory of the tree it lives in. Returns the original
/// path.
pub fn encrypt(store: &DocumentStore, working: &Path) -> Result<PathBuf> {
    if !working.is_file() {
        return Err(DocumentError::NotFound(working.to_path_buf()).into());
    }
    let original = original_path(working)?;

    let text = std::fs::read_to_string(working).map_err(|source| DocumentError::Read {
        path: working.to_path_buf(),
        source,
    })?;
    let edited = Document::parse(working, &text)?;

    let recipients = recipients_for(&original)?;
    store.save(&original, &edited.values, &recipients)?;

    remove_working_copy(working)?;

    info!(original = %original.display(), "re-encrypted working copy");
    Ok(original)
}

/// Delete a working copy once its contents are sealed elsewhere.
fn remove_working_copy(working: &Path) -> Result<()> {
    std::fs::remove_file(working).map_err(|source| Error::Cleanup {
        path: working.to_path_buf(),
        source,
    })
}

fn recipients_for(original: &Path) -> Result<Vec<PublicKey>> {
    if let Some(doc) = Document::read(original)? {
        let existing: Vec<PublicKey> = doc.recipients().into_iter().map(str::to_string).collect();
        if !existing.is_empty() {
            debug!(path = %original.display(), recipients = existing.len(), "reusing recipients");
            return Ok(existing);
        }
    }

    let root = find_root(original);
    let keys = recipients::inventory(&root)?;
    if keys.is_empty() {
        return Err(KeyError::NoRecipients(root).into());
    }
    debug!(root = %root.display(), recipients = keys.len(), "using tree inventory");
    Ok(keys)
}
