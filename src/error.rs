//! Error types.
//!
//! One enum per concern, all folded into [`Error`]. Every variant that is
//! about a file carries the path so the message names it.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A plaintext working copy could not be deleted after re-encryption.
    #[error("cleanup failed: plaintext working copy {} was NOT removed ({source}); delete it manually", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reading, parsing and writing individual documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("error loading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing YAML in {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {}: {reason}", path.display())]
    Serialize { path: PathBuf, reason: String },

    #[error("file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("file is not encrypted: {}", .0.display())]
    NotEncrypted(PathBuf),

    #[error("file must be a decrypted working copy with .dec extension: {}", .0.display())]
    NotWorkingCopy(PathBuf),

    #[error("key '{0}' is reserved for encryption metadata")]
    ReservedKey(String),
}

/// `${NAME}` resolution failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("undefined variable referenced: {reference} (in {key})")]
    Undefined { key: String, reference: String },

    #[error("circular dependency detected for variable: {key} ({})", chain.join(" -> "))]
    Circular { key: String, chain: Vec<String> },

    #[error("variable {reference} (in {key}) is not a scalar and cannot be substituted")]
    NotScalar { key: String, reference: String },
}

/// Output rendering failures.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("{option} is required for {encoding} format")]
    MissingOption {
        option: &'static str,
        encoding: &'static str,
    },

    #[error("unknown format: {0} (valid formats: env, json, yaml, k8s)")]
    UnknownEncoding(String),

    #[error("failed to render {encoding}: {reason}")]
    Serialize {
        encoding: &'static str,
        reason: String,
    },
}

/// Recipient lifecycle failures.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("invalid age key: {0}")]
    InvalidRecipient(String),

    #[error("cannot remove the last key from {}{}", display_paths(blocked), updated_suffix(updated))]
    LastRecipient {
        blocked: Vec<PathBuf>,
        updated: Vec<PathBuf>,
    },

    #[error("key not found: {0}")]
    RecipientNotFound(String),

    #[error("no encryption keys found in {} - run 'puff init' first", .0.display())]
    NoRecipients(PathBuf),

    #[error("no encrypted files found in {}", .0.display())]
    NoEncryptedDocuments(PathBuf),

    #[error("failed on {}: {source}{}", path.display(), updated_suffix(updated))]
    Aborted {
        path: PathBuf,
        #[source]
        source: Box<Error>,
        updated: Vec<PathBuf>,
    },
}

/// Encrypted-document primitives.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("armor failed: {0}")]
    ArmorFailed(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid identity in {source_name}: {reason}")]
    InvalidIdentity { source_name: String, reason: String },

    #[error("no matching identity for this ciphertext")]
    NoMatchingKeys,

    #[error("no identity can decrypt {} (set PUFF_AGE_KEY_FILE or SOPS_AGE_KEY_FILE)", .0.display())]
    NoMatchingIdentity(PathBuf),

    #[error("integrity check failed for {}: file was modified outside puff", .0.display())]
    MacMismatch(PathBuf),

    #[error("malformed encrypted value at {path}: {reason}")]
    MalformedValue { path: String, reason: String },
}

/// Settings and initialization state.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("already initialized: {} exists", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("failed to parse ledger {}: {reason}", path.display())]
    Ledger { path: PathBuf, reason: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn updated_suffix(updated: &[PathBuf]) -> String {
    if updated.is_empty() {
        String::new()
    } else {
        format!(" (already updated: {})", display_paths(updated))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
