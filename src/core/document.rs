//! Key/value documents on disk.
//!
//! A document is a YAML mapping. An encrypted document keeps its keys
//! readable, replaces every scalar leaf with a sealed `ENC[...]` string and
//! carries a reserved top-level `sops` key with the wrapped data key per
//! recipient and an integrity tag over all sealed plaintexts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::core::cipher::aead::{self, DataKey, ValueKind};
use crate::core::cipher::{self, Age, Cipher};
use crate::core::constants::{METADATA_KEY, UNENCRYPTED_SUFFIX};
use crate::core::store::fs;
use crate::core::value::{Value, ValueMap};
use crate::error::{CipherError, DocumentError, Error, Result};

/// One recipient's copy of the data key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeStanza {
    pub recipient: String,
    pub enc: String,
}

/// Contents of the reserved `sops` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub age: Vec<AgeStanza>,
    pub lastmodified: String,
    pub mac: String,
    #[serde(default = "default_suffix")]
    pub unencrypted_suffix: String,
    pub version: String,
}

fn default_suffix() -> String {
    UNENCRYPTED_SUFFIX.to_string()
}

#[derive(Deserialize)]
struct Envelope {
    sops: Option<Metadata>,
}

#[derive(Serialize)]
struct OnDisk<'a> {
    #[serde(flatten)]
    values: &'a ValueMap,
    sops: &'a Metadata,
}

/// A parsed document. Values are still sealed when `metadata` is present.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub values: ValueMap,
    pub metadata: Option<Metadata>,
}

impl Document {
    /// Load `path`. A missing file is `Ok(None)`, not an error.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let contents = fs::read_optional(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        match contents {
            Some(text) => Self::parse(path, &text).map(Some),
            None => Ok(None),
        }
    }

    /// Parse YAML text that came from `path`.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut values = parse_map(path, text)?;

        let metadata = match values.remove(METADATA_KEY) {
            None => None,
            Some(_) => {
                let envelope: Envelope =
                    serde_yaml::from_str(text).map_err(|e| DocumentError::Parse {
                        path: path.to_path_buf(),
                        reason: format!("invalid {} metadata: {}", METADATA_KEY, e),
                    })?;
                envelope.sops
            }
        };

        trace!(
            path = %path.display(),
            keys = values.len(),
            encrypted = metadata.is_some(),
            "parsed document"
        );

        Ok(Self {
            path: path.to_path_buf(),
            values,
            metadata,
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.metadata.is_some()
    }

    /// Recipients the data key is wrapped for, in file order.
    pub fn recipients(&self) -> Vec<&str> {
        self.metadata
            .as_ref()
            .map(|m| m.age.iter().map(|s| s.recipient.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn has_recipient(&self, key: &str) -> bool {
        self.recipients().contains(&key)
    }

    /// Seal `plaintext` for `recipients` under `data_key`.
    pub fn seal(
        path: &Path,
        plaintext: &ValueMap,
        recipients: &[String],
        data_key: &DataKey,
    ) -> Result<Self> {
        if plaintext.contains_key(METADATA_KEY) {
            return Err(DocumentError::ReservedKey(METADATA_KEY.to_string()).into());
        }

        let mut hasher = Sha256::new();
        let mut key_path = Vec::new();
        let values = seal_map(plaintext, data_key, &mut key_path, &mut hasher)?;

        let lastmodified = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let mac = data_key.seal(&digest_hex(hasher), ValueKind::Str, &lastmodified)?;

        let mut doc = Self {
            path: path.to_path_buf(),
            values,
            metadata: Some(Metadata {
                age: Vec::new(),
                lastmodified,
                mac,
                unencrypted_suffix: default_suffix(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),
        };
        for recipient in recipients {
            doc.wrap_for(recipient, data_key)?;
        }
        Ok(doc)
    }

    /// Append a stanza wrapping `data_key` for `recipient`.
    pub fn wrap_for(&mut self, recipient: &str, data_key: &DataKey) -> Result<()> {
        let parsed = cipher::parse_recipient(recipient)?;
        let enc = Age.encrypt(data_key.as_bytes(), &[parsed])?;
        if let Some(meta) = self.metadata.as_mut() {
            meta.age.push(AgeStanza {
                recipient: recipient.to_string(),
                enc,
            });
        }
        Ok(())
    }

    /// Recover the data key with any of `identities`.
    pub fn data_key(&self, identities: &[cipher::Identity]) -> Result<DataKey> {
        let meta = self
            .metadata
            .as_ref()
            .ok_or_else(|| DocumentError::NotEncrypted(self.path.clone()))?;

        for stanza in &meta.age {
            match Age.decrypt(&stanza.enc, identities) {
                Ok(bytes) => return DataKey::from_bytes(&bytes),
                Err(Error::Cipher(CipherError::NoMatchingKeys)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(CipherError::NoMatchingIdentity(self.path.clone()).into())
    }

    /// Plaintext values, with the integrity tag verified.
    pub fn open(&self, data_key: &DataKey) -> Result<ValueMap> {
        let Some(meta) = self.metadata.as_ref() else {
            return Ok(self.values.clone());
        };

        let mut hasher = Sha256::new();
        let mut key_path = Vec::new();
        let values = open_map(
            &self.values,
            data_key,
            &meta.unencrypted_suffix,
            &mut key_path,
            &mut hasher,
        )?;

        let (expected, _) = data_key.open(&meta.mac, &meta.lastmodified)?;
        if expected != digest_hex(hasher) {
            return Err(CipherError::MacMismatch(self.path.clone()).into());
        }
        Ok(values)
    }

    /// Render the document as YAML, metadata last.
    pub fn to_yaml(&self) -> Result<String> {
        let rendered = match &self.metadata {
            Some(meta) => serde_yaml::to_string(&OnDisk {
                values: &self.values,
                sops: meta,
            }),
            None => serde_yaml::to_string(&self.values),
        };
        rendered.map_err(|e| {
            DocumentError::Serialize {
                path: self.path.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Overwrite the document at its path (0600, parents 0700).
    pub fn write(&self) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write_private(&self.path, &yaml).map_err(|source| DocumentError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            path = %self.path.display(),
            recipients = self.recipients().len(),
            "wrote document"
        );
        Ok(())
    }
}

/// Parse YAML text into a top-level mapping. Blank or comment-only text is
/// an empty mapping.
pub fn parse_map(path: &Path, text: &str) -> Result<ValueMap> {
    let is_blank = text
        .lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#') || l == "---");
    if is_blank {
        return Ok(ValueMap::new());
    }

    let parsed: Value = serde_yaml::from_str(text).map_err(|e| DocumentError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    match parsed {
        Value::Map(map) => Ok(map),
        Value::Null => Ok(ValueMap::new()),
        _ => Err(DocumentError::Parse {
            path: path.to_path_buf(),
            reason: "top level must be a mapping".to_string(),
        }
        .into()),
    }
}

fn aad(key_path: &[String]) -> String {
    let mut out = key_path.join(":");
    out.push(':');
    out
}

fn digest_hex(hasher: Sha256) -> String {
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}

fn seal_map(
    map: &ValueMap,
    key: &DataKey,
    key_path: &mut Vec<String>,
    hasher: &mut Sha256,
) -> Result<ValueMap> {
    let mut out = ValueMap::new();
    for (k, v) in map {
        if k.ends_with(UNENCRYPTED_SUFFIX) {
            out.insert(k.clone(), v.clone());
            continue;
        }
        key_path.push(k.clone());
        let sealed = seal_value(v, key, key_path, hasher)?;
        key_path.pop();
        out.insert(k.clone(), sealed);
    }
    Ok(out)
}

fn seal_value(
    value: &Value,
    key: &DataKey,
    key_path: &mut Vec<String>,
    hasher: &mut Sha256,
) -> Result<Value> {
    let (text, kind) = match value {
        Value::Null => return Ok(Value::Null),
        Value::Map(m) => return seal_map(m, key, key_path, hasher).map(Value::Map),
        Value::Sequence(items) => {
            return items
                .iter()
                .map(|item| seal_value(item, key, key_path, hasher))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence)
        }
        Value::String(s) => (s.clone(), ValueKind::Str),
        Value::Integer(i) => (i.to_string(), ValueKind::Int),
        Value::Float(f) => (f.to_string(), ValueKind::Float),
        Value::Bool(b) => (b.to_string(), ValueKind::Bool),
    };
    hasher.update(text.as_bytes());
    key.seal(&text, kind, &aad(key_path)).map(Value::String)
}

fn open_map(
    map: &ValueMap,
    key: &DataKey,
    suffix: &str,
    key_path: &mut Vec<String>,
    hasher: &mut Sha256,
) -> Result<ValueMap> {
    let mut out = ValueMap::new();
    for (k, v) in map {
        if k.ends_with(suffix) {
            out.insert(k.clone(), v.clone());
            continue;
        }
        key_path.push(k.clone());
        let opened = open_value(v, key, suffix, key_path, hasher)?;
        key_path.pop();
        out.insert(k.clone(), opened);
    }
    Ok(out)
}

fn open_value(
    value: &Value,
    key: &DataKey,
    suffix: &str,
    key_path: &mut Vec<String>,
    hasher: &mut Sha256,
) -> Result<Value> {
    let path = aad(key_path);
    match value {
        Value::Null => Ok(Value::Null),
        Value::Map(m) => open_map(m, key, suffix, key_path, hasher).map(Value::Map),
        Value::Sequence(items) => items
            .iter()
            .map(|item| open_value(item, key, suffix, key_path, hasher))
            .collect::<Result<Vec<_>>>()
            .map(Value::Sequence),
        Value::String(s) if aead::is_sealed(s) => {
            let (text, kind) = key.open(s, &path)?;
            hasher.update(text.as_bytes());
            typed(text, kind, &path)
        }
        _ => Err(CipherError::MalformedValue {
            path,
            reason: "value is not encrypted".to_string(),
        }
        .into()),
    }
}

fn typed(text: String, kind: ValueKind, path: &str) -> Result<Value> {
    let bad = |reason: String| -> Error {
        CipherError::MalformedValue {
            path: path.to_string(),
            reason,
        }
        .into()
    };
    Ok(match kind {
        ValueKind::Str => Value::String(text),
        ValueKind::Int => Value::Integer(text.parse().map_err(|e| bad(format!("{}", e)))?),
        ValueKind::Float => Value::Float(text.parse().map_err(|e| bad(format!("{}", e)))?),
        ValueKind::Bool => Value::Bool(text.parse().map_err(|e| bad(format!("{}", e)))?),
    })
}
