//! Tool presence checks against the search path.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::debug;

const PATH_VAR: &str = "PATH";

/// Resolves executables before a command is spawned.
pub trait ToolProbe {
    /// Full path of `tool`, or `None` when it cannot be resolved.
    fn locate(&self, tool: &str) -> Option<PathBuf>;
}

/// The search path children will see: optional extra directories followed by `PATH`.
#[derive(Debug, Clone)]
pub struct SearchPath {
    paths: OsString,
    cwd: PathBuf,
}

impl SearchPath {
    /// Build from the current `PATH`, with `extra_dirs` searched first.
    pub fn from_env(cwd: &Path, extra_dirs: &[PathBuf]) -> Self {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        Self::new(cwd, extra_dirs, &inherited)
    }

    /// Search path of a child whose environment gets `env` on top of ours:
    /// `extra_dirs`, then the `PATH` set in `env`, else the inherited one.
    pub fn for_child(cwd: &Path, extra_dirs: &[PathBuf], env: &BTreeMap<String, String>) -> Self {
        match env.get(PATH_VAR) {
            Some(path) => Self::new(cwd, extra_dirs, OsStr::new(path)),
            None => Self::from_env(cwd, extra_dirs),
        }
    }

    pub fn new(cwd: &Path, extra_dirs: &[PathBuf], inherited: &OsStr) -> Self {
        let mut dirs: Vec<PathBuf> = extra_dirs.to_vec();
        dirs.extend(std::env::split_paths(inherited).filter(|dir| !dir.as_os_str().is_empty()));
        // join_paths only fails on entries containing the separator; such
        // entries cannot be searched anyway.
        let paths = std::env::join_paths(&dirs).unwrap_or_else(|_| inherited.to_os_string());
        Self {
            paths,
            cwd: cwd.to_path_buf(),
        }
    }

    /// Value to export as `PATH` to child processes.
    pub fn value(&self) -> &OsStr {
        &self.paths
    }
}

impl ToolProbe for SearchPath {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        match which::which_in(tool, Some(&self.paths), &self.cwd) {
            Ok(path) => {
                debug!(tool, path = %path.display(), "tool resolved");
                Some(path)
            }
            Err(err) => {
                debug!(tool, err = %err, "tool not found");
                None
            }
        }
    }
}

/// Environment overrides for children: `env`, with `PATH` replaced by
/// `search_path` whenever `env` sets one or `extra_dirs` were prepended.
pub fn child_env(
    env: &BTreeMap<String, String>,
    search_path: &SearchPath,
    extra_dirs: &[PathBuf],
) -> Vec<(OsString, OsString)> {
    let mut vars: Vec<(OsString, OsString)> = env
        .iter()
        .filter(|(key, _)| key.as_str() != PATH_VAR)
        .map(|(key, value)| (OsString::from(key), OsString::from(value)))
        .collect();
    if env.contains_key(PATH_VAR) || !extra_dirs.is_empty() {
        vars.push((OsString::from(PATH_VAR), search_path.value().to_os_string()));
    }
    vars
}

/// `bin` directory of a virtual environment, if it exists.
pub fn venv_bin_dir(root: &Path, venv_dir: &str) -> Option<PathBuf> {
    if venv_dir.trim().is_empty() {
        return None;
    }
    let bin = if cfg!(windows) { "Scripts" } else { "bin" };
    let dir = root.join(venv_dir).join(bin);
    dir.is_dir().then_some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::write(path, "#!/bin/sh\nexit 0\n").expect("write tool");
        let mut perms = std::fs::metadata(path).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).expect("chmod");
    }

    #[cfg(unix)]
    #[test]
    fn extra_dirs_are_searched_first() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bin = temp.path().join("bin");
        std::fs::create_dir_all(&bin).expect("mkdir");
        make_executable(&bin.join("fake-linter"));

        let search = SearchPath::new(temp.path(), &[bin.clone()], OsStr::new(""));
        assert_eq!(search.locate("fake-linter"), Some(bin.join("fake-linter")));
        assert!(
            std::env::split_paths(search.value()).next() == Some(bin),
            "extra dir should lead the search path"
        );
    }

    #[cfg(unix)]
    #[test]
    fn config_path_is_searched_instead_of_inherited() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tools = temp.path().join("tools");
        let venv_bin = temp.path().join(".venv/bin");
        std::fs::create_dir_all(&tools).expect("mkdir tools");
        std::fs::create_dir_all(&venv_bin).expect("mkdir venv");
        make_executable(&tools.join("project-linter"));
        let env = BTreeMap::from([
            ("PATH".to_string(), tools.display().to_string()),
            ("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string()),
        ]);
        let extra = [venv_bin.clone()];

        let search = SearchPath::for_child(temp.path(), &extra, &env);
        assert_eq!(search.locate("project-linter"), Some(tools.join("project-linter")));

        let vars = child_env(&env, &search, &extra);
        let paths: Vec<(OsString, OsString)> = vars
            .iter()
            .filter(|(key, _)| key == "PATH")
            .cloned()
            .collect();
        assert_eq!(paths.len(), 1, "PATH must be exported exactly once");
        let dirs: Vec<PathBuf> = std::env::split_paths(&paths[0].1).collect();
        assert_eq!(dirs, vec![venv_bin, tools]);
        assert!(vars.contains(&(
            OsString::from("PYTHONDONTWRITEBYTECODE"),
            OsString::from("1")
        )));
    }

    #[test]
    fn path_is_not_exported_when_unchanged() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = BTreeMap::from([("CI".to_string(), "1".to_string())]);
        let search = SearchPath::for_child(temp.path(), &[], &env);
        assert_eq!(
            child_env(&env, &search, &[]),
            vec![(OsString::from("CI"), OsString::from("1"))]
        );
    }

    #[test]
    fn missing_tool_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let search = SearchPath::new(temp.path(), &[], OsStr::new(""));
        assert_eq!(search.locate("no-such-tool-for-chore"), None);
    }

    #[test]
    fn venv_bin_requires_existing_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert_eq!(venv_bin_dir(temp.path(), ".venv"), None);

        let bin = if cfg!(windows) { "Scripts" } else { "bin" };
        let dir = temp.path().join(".venv").join(bin);
        std::fs::create_dir_all(&dir).expect("mkdir");
        assert_eq!(venv_bin_dir(temp.path(), ".venv"), Some(dir));
        assert_eq!(venv_bin_dir(temp.path(), ""), None);
    }
}
