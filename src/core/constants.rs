//! Constants used throughout puff.
//!
//! Centralizes magic strings and on-disk layout names.

/// Document file extension.
pub const EXT: &str = "yml";

/// Recipient ledger file at the root (.sops.yaml).
pub const LEDGER_FILE: &str = ".sops.yaml";

/// Optional settings file at the root.
pub const SETTINGS_FILE: &str = ".puff.toml";

/// Directory holding global documents.
pub const BASE_DIR: &str = "base";

/// Segment used for target lookups when no environment is given.
pub const BASE_SEGMENT: &str = "base";

/// Directory holding per-target overrides.
pub const TARGET_DIR: &str = "target-overrides";

/// Stem of the shared (non app-specific) document in each directory.
pub const SHARED_STEM: &str = "shared";

/// Reserved top-level key carrying encryption metadata.
pub const METADATA_KEY: &str = "sops";

/// Marker inserted before the extension of plaintext working copies.
pub const WORKING_COPY_MARKER: &str = "dec";

/// Keys starting with this prefix never reach rendered output.
pub const INTERNAL_PREFIX: char = '_';

/// Keys with this suffix are stored in plaintext inside encrypted documents.
pub const UNENCRYPTED_SUFFIX: &str = "_unencrypted";

/// Key written into `base/shared.yml` by `puff init`.
pub const INIT_MARKER_KEY: &str = "_PUFF_INITIALIZED";

/// Age public key prefix.
pub const AGE_PREFIX: &str = "age1";

/// Identity environment variables, checked in order.
pub const IDENTITY_ENV_VARS: &[&str] = &["PUFF_AGE_KEY", "SOPS_AGE_KEY"];

/// Identity file environment variables, checked in order.
pub const IDENTITY_FILE_ENV_VARS: &[&str] = &["PUFF_AGE_KEY_FILE", "SOPS_AGE_KEY_FILE"];

/// Default identity file relative to the user config dir.
pub const DEFAULT_IDENTITY_FILE: &str = "sops/age/keys.txt";

/// Directory permissions for created config directories (Unix).
pub const DIR_MODE: u32 = 0o700;

/// File permissions for documents, ledger and working copies (Unix).
pub const FILE_MODE: u32 = 0o600;
