//! Artifact removal for `remove` entries.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::pattern::ArtifactPattern;

/// Directories never descended into while matching globs.
const SKIP_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Remove every match of `patterns` under `root`.
///
/// Literal paths are removed directly; globs walk the tree and remove matched
/// entries whole without descending into them. Missing targets are not an
/// error. Returns the removed paths in removal order.
#[instrument(skip_all, fields(root = %root.display(), patterns = patterns.len()))]
pub fn remove_artifacts(root: &Path, patterns: &[ArtifactPattern]) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for pattern in patterns {
        if let ArtifactPattern::Literal(rel) = pattern {
            let path = root.join(rel);
            if remove_path(&path)? {
                removed.push(path);
            }
        }
    }

    let globs: Vec<&ArtifactPattern> = patterns
        .iter()
        .filter(|pattern| matches!(pattern, ArtifactPattern::Glob { .. }))
        .collect();
    if !globs.is_empty() && root.is_dir() {
        walk(root, "", &globs, &mut removed)?;
    }

    debug!(removed = removed.len(), "artifacts removed");
    Ok(removed)
}

fn walk(
    dir: &Path,
    prefix: &str,
    globs: &[&ArtifactPattern],
    removed: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("read {}", dir.display())),
    };

    let mut entries: Vec<_> = entries
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("read entry in {}", dir.display()))?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if SKIP_DIRS.contains(&&*name) {
            continue;
        }
        let rel = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };
        let path = entry.path();

        if globs.iter().any(|glob| glob.matches(&rel)) {
            if remove_path(&path)? {
                removed.push(path);
            }
            continue;
        }

        // file_type does not follow symlinks, so linked directories are not walked.
        let is_dir = entry
            .file_type()
            .with_context(|| format!("stat {}", path.display()))?
            .is_dir();
        if is_dir {
            walk(&path, &rel, globs, removed)?;
        }
    }
    Ok(())
}

/// Remove a file, symlink or directory tree. Returns false if it did not exist.
fn remove_path(path: &Path) -> Result<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e).with_context(|| format!("stat {}", path.display())),
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
    }
}
