//! Init command - create the base document and the recipient ledger.

use std::path::Path;

use tracing::info;

use crate::cli::output;
use crate::core::secrets;
use crate::error::Result;

/// Initialize an encrypted tree under `root`.
pub fn execute(root: &Path, keys: &[String], comment: Option<&str>) -> Result<()> {
    let keys: Vec<String> = keys
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    info!(root = %root.display(), keys = keys.len(), "initializing");

    let report = secrets::init(root, &keys, comment)?;

    if let Some(shared) = &report.shared {
        output::success(&format!("created {} (encrypted)", output::path(shared.display())));
    }
    output::success(&format!("created {}", output::path(report.ledger.display())));
    output::blank();
    output::header("Next steps");
    output::list_item("puff set -k KEY -v VALUE [-a APP] [-e ENV] [-t TARGET]");
    output::list_item("puff generate -a APP -e ENV -f env");
    output::list_item("puff keys add -k age1... -c \"teammate\"");
    Ok(())
}
