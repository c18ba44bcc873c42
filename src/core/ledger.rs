//! Recipient ledger (`.sops.yaml` at the root).
//!
//! The YAML body lists authorized recipients in the first creation rule.
//! Per-key comments live in header comment lines so they survive tools that
//! only read the YAML:
//!
//! ```text
//! # SOPS configuration for Puff
//! # Age encryption keys with their associated comments
//! # age1... (Alice laptop)
//!
//! creation_rules:
//! - path_regex: .*\.yml$
//!   age: age1...,age1...
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::{AGE_PREFIX, EXT, LEDGER_FILE};
use crate::core::store::fs;
use crate::core::types::{Comment, PublicKey};
use crate::error::{ConfigError, DocumentError, Result};

const HEADER: &str = "# SOPS configuration for Puff\n# Age encryption keys with their associated comments\n";
const NO_COMMENT: &str = "No comment";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    creation_rules: Vec<CreationRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CreationRule {
    path_regex: String,
    #[serde(default)]
    age: String,
}

/// Authorized recipients and their comments.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    rules: Vec<CreationRule>,
    comments: BTreeMap<PublicKey, Comment>,
}

impl Ledger {
    /// Ledger location for `root`.
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(LEDGER_FILE)
    }

    /// Empty ledger with the default creation rule.
    pub fn new(root: &Path) -> Self {
        Self {
            path: Self::path_for(root),
            rules: vec![CreationRule {
                path_regex: format!(r".*\.{}$", EXT),
                age: String::new(),
            }],
            comments: BTreeMap::new(),
        }
    }

    /// Load the ledger under `root`; `None` if there isn't one.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = Self::path_for(root);
        let contents = fs::read_optional(&path).map_err(|source| DocumentError::Read {
            path: path.clone(),
            source,
        })?;
        contents.map(|text| Self::parse(&path, &text)).transpose()
    }

    /// Load, or start an empty ledger when none exists.
    pub fn load_or_new(root: &Path) -> Result<Self> {
        Ok(Self::load(root)?.unwrap_or_else(|| Self::new(root)))
    }

    fn parse(path: &Path, text: &str) -> Result<Self> {
        let comments = text
            .lines()
            .filter_map(|line| parse_comment_line(line.trim()))
            .collect();

        let file: LedgerFile = if text.lines().all(|l| {
            let l = l.trim();
            l.is_empty() || l.starts_with('#')
        }) {
            LedgerFile::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| ConfigError::Ledger {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        Ok(Self {
            path: path.to_path_buf(),
            rules: file.creation_rules,
            comments,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recipients in the first creation rule, in file order.
    pub fn keys(&self) -> Vec<PublicKey> {
        self.rules
            .first()
            .map(|rule| split_keys(&rule.age))
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys().iter().any(|k| k == key)
    }

    pub fn comment(&self, key: &str) -> Option<&str> {
        self.comments.get(key).map(String::as_str)
    }

    /// Add `key` (if absent) and set its comment (if given).
    pub fn add(&mut self, key: &str, comment: Option<&str>) {
        if let Some(comment) = comment.filter(|c| !c.is_empty()) {
            self.comments.insert(key.to_string(), comment.to_string());
        }
        let mut keys = self.keys();
        if keys.iter().any(|k| k == key) {
            return;
        }
        keys.push(key.to_string());
        self.set_keys(&keys);
    }

    /// Drop `key` and its comment. Returns whether it was listed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.comments.remove(key);
        let mut keys = self.keys();
        let before = keys.len();
        keys.retain(|k| k != key);
        if keys.len() == before {
            return false;
        }
        self.set_keys(&keys);
        true
    }

    fn set_keys(&mut self, keys: &[PublicKey]) {
        let age = keys.join(",");
        match self.rules.first_mut() {
            Some(rule) => rule.age = age,
            None => self.rules.push(CreationRule {
                path_regex: format!(r".*\.{}$", EXT),
                age,
            }),
        }
    }

    /// Render the ledger file.
    pub fn render(&self) -> Result<String> {
        let mut out = String::from(HEADER);
        for key in self.keys() {
            let comment = self.comment(&key).unwrap_or(NO_COMMENT);
            out.push_str(&format!("# {} ({})\n", key, comment));
        }
        out.push('\n');

        let body = serde_yaml::to_string(&LedgerFile {
            creation_rules: self.rules.clone(),
        })
        .map_err(|e| ConfigError::Ledger {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        out.push_str(&body);
        Ok(out)
    }

    pub fn save(&self) -> Result<()> {
        let text = self.render()?;
        fs::write_private(&self.path, &text).map_err(|source| DocumentError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), keys = self.keys().len(), "saved ledger");
        Ok(())
    }
}

/// `# age1... (comment)` → `(key, comment)`.
fn parse_comment_line(line: &str) -> Option<(PublicKey, Comment)> {
    let content = line.strip_prefix("# ")?;
    if !content.starts_with(AGE_PREFIX) {
        return None;
    }
    let idx = content.find(" (").filter(|&i| i > 0)?;
    let key = &content[..idx];
    let comment = content[idx + 2..].trim_end_matches(')');
    Some((key.to_string(), comment.to_string()))
}

fn split_keys(field: &str) -> Vec<PublicKey> {
    field
        .split([',', '\n'])
        .map(str::trim)
        .filter(|k| k.starts_with(AGE_PREFIX))
        .map(str::to_string)
        .collect()
}
