//! Recipient key commands.
//!
//! Add, list, and remove age recipients across the encrypted tree.

mod add;
mod list;
mod rm;

pub use add::execute as add;
pub use list::execute as list;
pub use rm::execute as rm;

use std::path::{Path, PathBuf};

use crate::cli::output;

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn print_paths(root: &Path, label: &str, paths: &[PathBuf]) {
    if paths.is_empty() {
        return;
    }
    output::header(label);
    for path in paths {
        output::list_item(&output::path(relative(root, path)));
    }
}
