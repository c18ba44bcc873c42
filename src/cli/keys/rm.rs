//! Keys rm command - revoke a recipient.

use std::path::Path;

use tracing::info;

use super::print_paths;
use crate::cli::{open_store, output};
use crate::core::recipients;
use crate::error::Result;

/// Remove `key` and rotate the data key of every affected document.
pub fn execute(root: &Path, key: &str, env: Option<&str>) -> Result<()> {
    info!(key, env = env.unwrap_or("*"), "removing key");
    let (_, store) = open_store(root)?;
    let report = recipients::remove(&store, root, key, env)?;

    output::success(&format!(
        "removed {} from {}",
        output::key(key),
        output::count(report.updated.len(), "file")
    ));
    print_paths(root, "Re-encrypted", &report.updated);
    Ok(())
}
