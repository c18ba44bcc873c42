//! `${NAME}` substitution between keys of one value map.
//!
//! References resolve depth-first. The keys currently being resolved form a
//! stack, so a cycle is reported from the key where it closes, with the full
//! chain. Results are memoized; the input map is never modified.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::core::value::{Value, ValueMap};
use crate::error::TemplateError;

static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("reference pattern is valid"));

/// True if `s` contains at least one `${...}` reference.
pub fn has_references(s: &str) -> bool {
    REFERENCE.is_match(s)
}

/// Return a copy of `values` with every reference in a top-level string
/// value replaced by the referenced value's text.
pub fn resolve(values: &ValueMap) -> Result<ValueMap, TemplateError> {
    let mut resolver = Resolver {
        input: values,
        resolved: HashMap::new(),
        resolving: Vec::new(),
    };

    let mut out = ValueMap::new();
    for key in values.keys() {
        let value = resolver.resolve_key(key)?;
        out.insert(key.clone(), value);
    }
    Ok(out)
}

struct Resolver<'a> {
    input: &'a ValueMap,
    resolved: HashMap<String, Value>,
    resolving: Vec<String>,
}

impl Resolver<'_> {
    fn resolve_key(&mut self, key: &str) -> Result<Value, TemplateError> {
        if let Some(done) = self.resolved.get(key) {
            return Ok(done.clone());
        }

        if let Some(pos) = self.resolving.iter().position(|k| k == key) {
            let mut chain = self.resolving[pos..].to_vec();
            chain.push(key.to_string());
            return Err(TemplateError::Circular {
                key: key.to_string(),
                chain,
            });
        }

        let original = match self.input.get(key) {
            Some(v) => v,
            None => return Ok(Value::Null),
        };

        let value = match original {
            Value::String(text) if has_references(text) => {
                self.resolving.push(key.to_string());
                let expanded = self.expand(key, text);
                self.resolving.pop();
                Value::String(expanded?)
            }
            other => other.clone(),
        };

        self.resolved.insert(key.to_string(), value.clone());
        Ok(value)
    }

    fn expand(&mut self, key: &str, text: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in REFERENCE.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let reference = name.as_str();

            match self.input.get(reference) {
                None => {
                    return Err(TemplateError::Undefined {
                        key: key.to_string(),
                        reference: reference.to_string(),
                    })
                }
                Some(v) if !v.is_scalar() => {
                    return Err(TemplateError::NotScalar {
                        key: key.to_string(),
                        reference: reference.to_string(),
                    })
                }
                Some(_) => {}
            }

            trace!(key, reference, "substituting");
            let substituted = self.resolve_key(reference)?;
            out.push_str(&text[last..whole.start()]);
            out.push_str(&substituted.to_text());
            last = whole.end();
        }

        out.push_str(&text[last..]);
        Ok(out)
    }
}
