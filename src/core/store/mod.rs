//! Document storage.
//!
//! The [`Store`] trait is the read seam the resolver depends on. The one
//! implementation, [`DocumentStore`], reads plaintext and encrypted documents
//! from disk and holds the local identities needed to open them.
//!
//! ## Example
//!
//! ```ignore
//! let store = DocumentStore::new(Keyring::discover(None)?);
//! if let Some(values) = store.load(Path::new("base/shared.yml"))? {
//!     // metadata already stripped, values decrypted
//! }
//! ```

use std::path::Path;

use tracing::debug;

use crate::core::cipher::aead::DataKey;
use crate::core::document::Document;
use crate::core::identity::Keyring;
use crate::core::value::ValueMap;
use crate::error::{CipherError, Result};

pub mod fs;

/// Read access to value maps by location.
pub trait Store {
    /// Load the plaintext values at `path`, metadata stripped.
    ///
    /// A missing file is `Ok(None)`. Any other failure names the file.
    fn load(&self, path: &Path) -> Result<Option<ValueMap>>;
}

/// Filesystem store for plaintext and encrypted YAML documents.
#[derive(Default)]
pub struct DocumentStore {
    keyring: Keyring,
}

impl DocumentStore {
    pub fn new(keyring: Keyring) -> Self {
        Self { keyring }
    }

    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    /// Parse the document at `path` without decrypting it.
    pub fn open(&self, path: &Path) -> Result<Option<Document>> {
        Document::read(path)
    }

    /// Recover the data key of an encrypted document.
    pub fn unwrap_key(&self, doc: &Document) -> Result<DataKey> {
        if self.keyring.is_empty() {
            return Err(CipherError::NoMatchingIdentity(doc.path.clone()).into());
        }
        doc.data_key(self.keyring.identities())
    }

    /// Plaintext values of a parsed document.
    pub fn plaintext(&self, doc: &Document) -> Result<ValueMap> {
        if !doc.is_encrypted() {
            return Ok(doc.values.clone());
        }
        let key = self.unwrap_key(doc)?;
        doc.open(&key)
    }

    /// Encrypt `values` under a fresh data key for `recipients` and write.
    pub fn save(&self, path: &Path, values: &ValueMap, recipients: &[String]) -> Result<Document> {
        let doc = Document::seal(path, values, recipients, &DataKey::generate())?;
        doc.write()?;
        debug!(path = %path.display(), keys = values.len(), "saved encrypted document");
        Ok(doc)
    }
}

impl Store for DocumentStore {
    fn load(&self, path: &Path) -> Result<Option<ValueMap>> {
        match self.open(path)? {
            Some(doc) => self.plaintext(&doc).map(Some),
            None => Ok(None),
        }
    }
}
