//! Decrypt and encrypt commands for plaintext working copies.

use std::path::Path;

use crate::cli::{open_store, output};
use crate::core::workcopy;
use crate::error::Result;

/// Write `<file>.dec.yml` for editing.
pub fn decrypt(root: &Path, file: &Path) -> Result<()> {
    let (_, store) = open_store(root)?;
    let working = workcopy::decrypt(&store, file)?;

    output::success(&format!(
        "decrypted {} to {}",
        output::path(file.display()),
        output::path(working.display())
    ));
    output::warn("the working copy holds plaintext secrets");
    output::hint(&format!("edit it, then run: puff encrypt -f {}", working.display()));
    Ok(())
}

/// Seal a working copy over its original and delete it.
pub fn encrypt(root: &Path, file: &Path) -> Result<()> {
    let (_, store) = open_store(root)?;
    let original = workcopy::encrypt(&store, file)?;

    output::success(&format!(
        "encrypted {} to {}",
        output::path(file.display()),
        output::path(original.display())
    ));
    output::success("removed working copy");
    Ok(())
}
