//! Per-value AES-256-GCM sealing.
//!
//! Sealed values are self-describing strings:
//!
//! ```text
//! ENC[AES256_GCM,data:<b64>,iv:<b64>,tag:<b64>,type:<str|int|float|bool>]
//! ```
//!
//! The additional authenticated data binds each value to its key path so
//! sealed values cannot be swapped between keys.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{CipherError, Result};

/// Data key length in bytes.
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const PREFIX: &str = "ENC[AES256_GCM,";

/// Scalar type recorded next to a sealed value so it decrypts to the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Int,
    Float,
    Bool,
}

impl ValueKind {
    fn tag(&self) -> &'static str {
        match self {
            ValueKind::Str => "str",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "str" => Some(ValueKind::Str),
            "int" => Some(ValueKind::Int),
            "float" => Some(ValueKind::Float),
            "bool" => Some(ValueKind::Bool),
            _ => None,
        }
    }
}

/// Per-document symmetric key. Zeroed on drop.
pub struct DataKey(Zeroizing<[u8; KEY_LEN]>);

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataKey(..)")
    }
}

impl DataKey {
    /// Fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut key[..]);
        Self(key)
    }

    /// Rebuild a key from unwrapped bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(CipherError::DecryptionFailed(format!(
                "data key must be {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            ))
            .into());
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// Seal `plaintext` bound to `aad`.
    pub fn seal(&self, plaintext: &str, kind: ValueKind, aad: &str) -> Result<String> {
        let cipher = Aes256Gcm::new((&*self.0).into());
        let mut iv = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut iv);

        let sealed = cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let (data, tag) = sealed.split_at(sealed.len() - TAG_LEN);
        Ok(format!(
            "{}data:{},iv:{},tag:{},type:{}]",
            PREFIX,
            B64.encode(data),
            B64.encode(iv),
            B64.encode(tag),
            kind.tag()
        ))
    }

    /// Open a sealed value. `aad` must match the one used to seal it.
    pub fn open(&self, sealed: &str, aad: &str) -> Result<(String, ValueKind)> {
        let parts = Sealed::parse(sealed).ok_or_else(|| malformed(aad, "not an ENC[] value"))?;

        let data = B64
            .decode(parts.data)
            .map_err(|e| malformed(aad, &e.to_string()))?;
        let iv = B64
            .decode(parts.iv)
            .map_err(|e| malformed(aad, &e.to_string()))?;
        let tag = B64
            .decode(parts.tag)
            .map_err(|e| malformed(aad, &e.to_string()))?;
        if iv.len() != NONCE_LEN || tag.len() != TAG_LEN {
            return Err(malformed(aad, "bad iv or tag length"));
        }
        let kind = ValueKind::from_tag(parts.kind)
            .ok_or_else(|| malformed(aad, &format!("unknown type {}", parts.kind)))?;

        let mut ciphertext = data;
        ciphertext.extend_from_slice(&tag);

        let cipher = Aes256Gcm::new((&*self.0).into());
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: &ciphertext,
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|e| CipherError::DecryptionFailed(format!("{} at {}", e, aad)))?;

        let text = String::from_utf8(plaintext)
            .map_err(|e| CipherError::DecryptionFailed(format!("UTF-8 error: {}", e)))?;
        Ok((text, kind))
    }
}

/// True if `s` looks like a sealed value.
pub fn is_sealed(s: &str) -> bool {
    s.starts_with(PREFIX) && s.ends_with(']')
}

struct Sealed<'a> {
    data: &'a str,
    iv: &'a str,
    tag: &'a str,
    kind: &'a str,
}

impl<'a> Sealed<'a> {
    fn parse(s: &'a str) -> Option<Self> {
        let body = s.strip_prefix(PREFIX)?.strip_suffix(']')?;
        let (mut data, mut iv, mut tag, mut kind) = (None, None, None, None);
        for field in body.split(',') {
            let (name, value) = field.split_once(':')?;
            match name {
                "data" => data = Some(value),
                "iv" => iv = Some(value),
                "tag" => tag = Some(value),
                "type" => kind = Some(value),
                _ => return None,
            }
        }
        Some(Self {
            data: data?,
            iv: iv?,
            tag: tag?,
            kind: kind?,
        })
    }
}

fn malformed(path: &str, reason: &str) -> crate::error::Error {
    CipherError::MalformedValue {
        path: path.to_string(),
        reason: reason.to_string(),
    }
    .into()
}
