//! Get and set commands.

use std::path::Path;

use tracing::info;

use crate::cli::{open_store, output, ScopeArgs};
use crate::core::secrets;
use crate::error::Result;

/// Print the resolved, template-expanded value of `key`.
pub fn get(root: &Path, scope: &ScopeArgs, key: &str) -> Result<()> {
    let (_, store) = open_store(root)?;
    let value = secrets::get(&store, &scope.context(root), key)?;
    output::data(&value.to_text());
    Ok(())
}

/// Store `key = value` in the most specific document of `scope`.
pub fn set(root: &Path, scope: &ScopeArgs, key: &str, value: &str) -> Result<()> {
    info!(key, "setting value");
    let (_, store) = open_store(root)?;
    let location = secrets::set(&store, &scope.context(root), key, value)?;

    let shown = location
        .path
        .strip_prefix(root)
        .unwrap_or(&location.path)
        .display()
        .to_string();
    output::success(&format!(
        "set {} in {} (encrypted)",
        output::key(key),
        output::path(shown)
    ));
    Ok(())
}
