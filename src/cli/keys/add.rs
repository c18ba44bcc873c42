//! Keys add command - authorize a recipient.

use std::path::Path;

use tracing::info;

use super::print_paths;
use crate::cli::{open_store, output};
use crate::core::recipients;
use crate::error::Result;

/// Add `key` to every encrypted document (optionally one environment).
pub fn execute(root: &Path, key: &str, comment: Option<&str>, env: Option<&str>) -> Result<()> {
    info!(key, env = env.unwrap_or("*"), "adding key");
    let (_, store) = open_store(root)?;
    let report = recipients::add(&store, root, key, comment, env)?;

    output::success(&format!(
        "added {} to {}",
        output::key(key),
        output::count(report.updated.len(), "file")
    ));
    print_paths(root, "Updated", &report.updated);
    if !report.unchanged.is_empty() {
        output::dimmed(&format!(
            "{} already had this key",
            output::count(report.unchanged.len(), "file")
        ));
    }
    Ok(())
}
