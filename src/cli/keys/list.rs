//! Keys list command.

use std::path::Path;

use crate::cli::output;
use crate::core::recipients;
use crate::error::Result;

/// List recipients with their ledger comments and scopes.
pub fn execute(root: &Path) -> Result<()> {
    let keys = recipients::list(root)?;

    if keys.is_empty() {
        output::dimmed("no keys");
        output::hint("run: puff init --age-keys age1...");
        return Ok(());
    }

    output::header(&output::count(keys.len(), "key"));
    output::rule();
    for info in keys {
        output::data(&output::key(&info.key));
        output::kv(
            "comment:",
            info.comment.as_deref().unwrap_or("No comment"),
        );
        let scopes = if info.scopes.is_empty() {
            "(ledger only)".to_string()
        } else {
            info.scopes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        output::kv("scopes: ", scopes);
    }
    Ok(())
}
