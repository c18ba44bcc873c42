//! Output encodings.
//!
//! Callers strip internal keys first; nothing here filters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::Serialize;

use crate::core::value::{Value, ValueMap};
use crate::error::{FormatError, Result};

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// `KEY=VALUE` lines, sorted.
    #[default]
    Env,
    Json,
    Yaml,
    /// Kubernetes `Secret` manifest.
    K8s,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Env => "env",
            Encoding::Json => "json",
            Encoding::Yaml => "yaml",
            Encoding::K8s => "k8s",
        }
    }
}

impl FromStr for Encoding {
    type Err = FormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "env" => Ok(Encoding::Env),
            "json" => Ok(Encoding::Json),
            "yaml" => Ok(Encoding::Yaml),
            "k8s" => Ok(Encoding::K8s),
            other => Err(FormatError::UnknownEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoding plus its parameters.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    pub encoding: Encoding,
    /// Required for [`Encoding::K8s`].
    pub secret_name: Option<String>,
    /// K8s only: base64 values under `data` instead of `stringData`.
    pub base64: bool,
}

impl FormatOptions {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            ..Default::default()
        }
    }

    pub fn with_secret_name(mut self, name: Option<String>) -> Self {
        self.secret_name = name.filter(|n| !n.is_empty());
        self
    }

    pub fn with_base64(mut self, base64: bool) -> Self {
        self.base64 = base64;
        self
    }

    /// Reject missing required options before anything is rendered.
    pub fn validate(&self) -> Result<()> {
        if self.encoding == Encoding::K8s && self.secret_name.is_none() {
            return Err(FormatError::MissingOption {
                option: "secret-name",
                encoding: "k8s",
            }
            .into());
        }
        Ok(())
    }
}

/// Render `values` with `options`.
pub fn format(values: &ValueMap, options: &FormatOptions) -> Result<String> {
    options.validate()?;

    match options.encoding {
        Encoding::Env => Ok(env(values)),
        Encoding::Json => serde_json::to_string_pretty(values).map_err(|e| {
            FormatError::Serialize {
                encoding: "json",
                reason: e.to_string(),
            }
            .into()
        }),
        Encoding::Yaml => yaml(values, "yaml"),
        Encoding::K8s => {
            let name = options.secret_name.clone().unwrap_or_default();
            yaml(&Secret::new(name, values, options.base64), "k8s")
        }
    }
}

fn yaml<T: Serialize>(value: &T, encoding: &'static str) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| {
        FormatError::Serialize {
            encoding,
            reason: e.to_string(),
        }
        .into()
    })
}

fn env(values: &ValueMap) -> String {
    values
        .iter()
        .map(|(key, value)| format!("{}={}", key, env_value(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn env_value(value: &Value) -> String {
    let text = value.to_text();
    if needs_quoting(&text) {
        format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        text
    }
}

fn needs_quoting(text: &str) -> bool {
    text.contains([' ', '\t', '\n', '\r', '"', '\'', '$', '\\'])
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Secret {
    api_version: &'static str,
    kind: &'static str,
    metadata: SecretMetadata,
    #[serde(rename = "type")]
    secret_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    string_data: Option<BTreeMap<String, String>>,
}

#[derive(Serialize)]
struct SecretMetadata {
    name: String,
}

impl Secret {
    fn new(name: String, values: &ValueMap, base64: bool) -> Self {
        let entries = values.iter().map(|(k, v)| {
            let text = v.to_text();
            let text = if base64 { B64.encode(text) } else { text };
            (k.clone(), text)
        });
        let entries: BTreeMap<String, String> = entries.collect();

        let (data, string_data) = if base64 {
            (Some(entries), None)
        } else {
            (None, Some(entries))
        };

        Self {
            api_version: "v1",
            kind: "Secret",
            metadata: SecretMetadata { name },
            secret_type: "Opaque",
            data,
            string_data,
        }
    }
}
