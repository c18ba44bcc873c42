//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A configuration key (e.g., DATABASE_URL, _DB_PASSWORD).
pub type ConfigKey = String;

/// An age public key string (starts with "age1...").
pub type PublicKey = String;

/// A free-form note attached to a recipient in the ledger.
pub type Comment = String;

/// An application name (`base/<app>.yml`).
pub type AppName = String;

/// An environment name (`<env>/`).
pub type EnvName = String;

/// A deployment target name (`target-overrides/<target>/`).
pub type TargetName = String;
