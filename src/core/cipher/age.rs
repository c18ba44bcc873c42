//! Age encryption backend implementation.
//!
//! Wraps data keys using the age format with x25519 keys and ASCII armor
//! encoding.

use std::io::{Read, Write};

use ::age::x25519;
use tracing::trace;

use super::Cipher;
use crate::core::constants::AGE_PREFIX;
use crate::error::{CipherError, Result};

/// Age-based key wrapping using x25519 keys
pub struct Age;

impl Cipher for Age {
    type Recipient = x25519::Recipient;
    type Identity = x25519::Identity;

    fn name(&self) -> &'static str {
        "age"
    }

    fn encrypt(&self, plaintext: &[u8], recipients: &[x25519::Recipient]) -> Result<String> {
        trace!(recipients = recipients.len(), "wrapping");

        let encryptor =
            age::Encryptor::with_recipients(recipients.iter().map(|r| r as &dyn age::Recipient))
                .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        let mut encrypted = Vec::new();
        let mut writer = encryptor
            .wrap_output(age::armor::ArmoredWriter::wrap_output(
                &mut encrypted,
                age::armor::Format::AsciiArmor,
            )?)
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        writer.write_all(plaintext)?;
        let armored = writer
            .finish()
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;
        armored
            .finish()
            .map_err(|e| CipherError::ArmorFailed(format!("{}", e)))?;

        String::from_utf8(encrypted)
            .map_err(|e| CipherError::EncryptionFailed(format!("UTF-8 error: {}", e)).into())
    }

    fn decrypt(&self, encrypted: &str, identities: &[x25519::Identity]) -> Result<Vec<u8>> {
        trace!(identities = identities.len(), "unwrapping");

        let reader = age::armor::ArmoredReader::new(encrypted.as_bytes());
        let decryptor = age::Decryptor::new(reader)
            .map_err(|e| CipherError::DecryptionFailed(format!("{}", e)))?;

        let mut reader = decryptor
            .decrypt(identities.iter().map(|i| i as &dyn age::Identity))
            .map_err(|e| match e {
                age::DecryptError::NoMatchingKeys => CipherError::NoMatchingKeys,
                other => CipherError::DecryptionFailed(format!("{}", other)),
            })?;

        let mut decrypted = Vec::new();
        reader.read_to_end(&mut decrypted)?;
        Ok(decrypted)
    }
}

/// Parse a public key string into an age recipient
///
/// # Errors
///
/// Returns `CipherError::InvalidPublicKey` if the key format is invalid.
pub fn parse_recipient(key: &str) -> Result<x25519::Recipient> {
    if !key.starts_with(AGE_PREFIX) {
        return Err(CipherError::InvalidPublicKey(key.to_string()).into());
    }
    key.parse::<x25519::Recipient>()
        .map_err(|_| CipherError::InvalidPublicKey(key.to_string()).into())
}

/// Parse an `AGE-SECRET-KEY-...` line into an identity.
///
/// `source_name` names where the line came from for the error message.
pub fn parse_identity(line: &str, source_name: &str) -> Result<x25519::Identity> {
    line.trim().parse::<x25519::Identity>().map_err(|e: &str| {
        CipherError::InvalidIdentity {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
