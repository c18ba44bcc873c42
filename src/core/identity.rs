//! Local age identities used to unwrap document data keys.
//!
//! Lookup order: inline keys in `PUFF_AGE_KEY` / `SOPS_AGE_KEY`, then the
//! file named by `PUFF_AGE_KEY_FILE` / `SOPS_AGE_KEY_FILE`, then the settings
//! `identity.key_file`, then `<config dir>/sops/age/keys.txt`. Every source
//! that exists contributes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::cipher::{self, Identity};
use crate::core::constants::{
    DEFAULT_IDENTITY_FILE, FILE_MODE, IDENTITY_ENV_VARS, IDENTITY_FILE_ENV_VARS,
};
use crate::error::{CipherError, Result};

/// A set of private identities available to this process.
#[derive(Default)]
pub struct Keyring {
    identities: Vec<Identity>,
}

impl Keyring {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    /// Discover identities from the environment and well-known files.
    ///
    /// `configured` is the settings-file key path, if any. An empty keyring is
    /// not an error here; decryption reports it when it matters.
    pub fn discover(configured: Option<&Path>) -> Result<Self> {
        let mut keyring = Self::default();

        for var in IDENTITY_ENV_VARS {
            if let Ok(value) = std::env::var(var) {
                keyring.extend_from_str(&value, var)?;
            }
        }

        let mut files: Vec<PathBuf> = IDENTITY_FILE_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var_os(var).map(PathBuf::from))
            .collect();
        if let Some(path) = configured {
            files.push(path.to_path_buf());
        }
        if let Some(dir) = dirs::config_dir() {
            files.push(dir.join(DEFAULT_IDENTITY_FILE));
        }

        for path in files {
            if path.is_file() {
                keyring.load_file(&path)?;
            }
        }

        debug!(identities = keyring.len(), "identities discovered");
        Ok(keyring)
    }

    /// Add every identity in an age key file.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        warn_if_loose(path);

        let contents = fs::read_to_string(path).map_err(|e| CipherError::InvalidIdentity {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.extend_from_str(&contents, &path.display().to_string())
    }

    fn extend_from_str(&mut self, contents: &str, source_name: &str) -> Result<()> {
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.identities
                .push(cipher::parse_identity(line, source_name)?);
        }
        Ok(())
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Warn when a key file is readable by anyone but its owner (Unix only).
#[cfg(unix)]
fn warn_if_loose(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & !FILE_MODE != 0 {
            warn!(
                path = %path.display(),
                mode = format!("{:o}", mode),
                "identity file permissions are too open; run chmod 600"
            );
        }
    }
}
