//! `chore --init`: write a starter `chore.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use super::config::{CONFIG_FILE_NAME, ChoreConfig, write_config};
use crate::taskfile::default_vars;

/// Options for `init_config`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite an existing config file.
    pub force: bool,
}

/// Write the default config (built-in vars spelled out) to `path`, or to
/// `<root>/chore.toml` when `path` is `None`.
///
/// Fails if the file already exists unless `options.force` is set.
pub fn init_config(root: &Path, path: Option<&Path>, options: &InitOptions) -> Result<PathBuf> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
    if path.exists() && !options.force {
        return Err(anyhow!(
            "chore init: {} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    if path.is_dir() {
        return Err(anyhow!(
            "chore init: {} exists but is a directory",
            path.display()
        ));
    }

    let cfg = ChoreConfig {
        vars: default_vars(),
        ..ChoreConfig::default()
    };
    write_config(&path, &cfg)?;
    Ok(path)
}
