//! Generate command - render the resolved configuration.

use std::path::{Path, PathBuf};

use crate::cli::{open_store, output, ScopeArgs};
use crate::core::format::{Encoding, FormatOptions};
use crate::core::secrets;
use crate::core::store::fs;
use crate::error::{DocumentError, Result};

/// Flags of `puff generate`; unset ones fall back to `.puff.toml`.
#[derive(Debug, Default)]
pub struct Request {
    pub format: Option<String>,
    pub output: Option<PathBuf>,
    pub secret_name: Option<String>,
    pub base64: bool,
}

/// Render to stdout or `request.output`.
pub fn execute(root: &Path, scope: &ScopeArgs, request: Request) -> Result<()> {
    let (settings, store) = open_store(root)?;

    let encoding = match request.format.as_deref() {
        Some(name) => name.parse::<Encoding>()?,
        None => settings.default_encoding().unwrap_or_default(),
    };
    let options = FormatOptions::new(encoding)
        .with_secret_name(request.secret_name.or(settings.generate.secret_name))
        .with_base64(request.base64 || settings.generate.base64);

    let rendered = secrets::generate(&store, &scope.context(root), &options)?;

    match request.output {
        Some(path) => {
            fs::write_private(&path, &rendered).map_err(|source| DocumentError::Write {
                path: path.clone(),
                source,
            })?;
            output::success(&format!(
                "generated {} config in {}",
                encoding,
                output::path(path.display())
            ));
        }
        None => output::data(rendered.trim_end_matches('\n')),
    }
    Ok(())
}
