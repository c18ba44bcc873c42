//! Cryptographic primitives for encrypted documents.
//!
//! Two layers, mirroring how an encrypted document is built:
//!
//! - **aead**: every scalar leaf is sealed with AES-256-GCM under a per-file
//!   data key.
//! - **age**: the data key itself is wrapped once per recipient with age
//!   x25519 keys, so adding a recipient never touches the sealed values.
//!
//! ## Adding a New Key-Wrapping Backend
//!
//! 1. Implement the `Cipher` trait
//! 2. Add the implementation in a new file
//! 3. Re-export from this module

use crate::error::Result;

pub mod aead;
mod age;

pub use self::aead::{DataKey, ValueKind};
pub use self::age::{parse_identity, parse_recipient, Age};

/// Key-wrapping backend trait.
///
/// Wraps small secrets (data keys) for a set of recipients and unwraps them
/// with any matching identity.
pub trait Cipher {
    /// Type representing a recipient public key.
    type Recipient;

    /// Type representing a private identity/key.
    type Identity;

    /// Encrypt `plaintext` so any of `recipients` can decrypt it.
    ///
    /// # Errors
    ///
    /// Returns `CipherError` if encryption fails.
    fn encrypt(&self, plaintext: &[u8], recipients: &[Self::Recipient]) -> Result<String>;

    /// Decrypt with the first identity that matches.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::NoMatchingKeys` when none of `identities` is a
    /// recipient, `CipherError::DecryptionFailed` for anything else.
    fn decrypt(&self, encrypted: &str, identities: &[Self::Identity]) -> Result<Vec<u8>>;

    /// Backend name for display/metadata.
    #[allow(dead_code)]
    fn name(&self) -> &'static str;
}

pub use ::age::x25519::{Identity, Recipient};
