// src/core/path_index.rs

use std::collections::HashSet;
use std::env;
use std::ffi::OsStr;
use std::path::Path;

/// A registry of the executable names visible on the search path.
///
/// The index is built once and is immutable afterwards; rebuilding means
/// constructing a new one. It answers resolvability only; search-path order
/// establishes no precedence here, because the directory that wins is decided
/// by the OS at exec time.
///
/// Besides the full name set, the index keeps four derived subsets keyed on
/// separator style, which is what multi-segment command resolution matches
/// against (`mkfs.ext4`, `apt-get`, ...).
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    names: HashSet<String>,
    dotted: HashSet<String>,
    dashed: HashSet<String>,
    underscored: HashSet<String>,
    hybrid: HashSet<String>,
}

impl PathIndex {
    /// Scans the `PATH` environment variable and indexes every executable
    /// file found in its directories.
    pub fn scan() -> Self {
        let path_var = env::var_os("PATH").unwrap_or_default();
        Self::scan_path(&path_var)
    }

    /// Scans an explicit search-path string (same format as `PATH`).
    ///
    /// Unreadable directories are skipped. An empty search path yields an
    /// empty index, in which case every later resolution attempt will fail
    /// the unknown-command guard.
    pub fn scan_path(path_var: &OsStr) -> Self {
        let mut names = HashSet::new();
        for dir in env::split_paths(path_var) {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    log::debug!("Skipping unreadable PATH entry '{}': {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let file_path = entry.path();
                if file_path.is_file() && is_executable(&file_path) {
                    let file_name = entry.file_name();
                    if let Some(name) = file_name.to_str() {
                        names.insert(name.to_string());
                    }
                }
            }
        }
        let index = Self::from_names(names);
        log::debug!("Indexed {} executables from the search path.", index.len());
        index
    }

    /// Builds an index from a fixed set of names.
    ///
    /// This is the cacheable, rebuildable construction seam: callers that
    /// already know the relevant executables (or tests that must not depend
    /// on the host machine's `PATH`) can hand the set in directly.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::default();
        for name in names {
            let name = name.into();
            let has_dash = name.contains('-');
            let has_underscore = name.contains('_');
            if name.contains('.') {
                index.dotted.insert(name.clone());
            }
            match (has_dash, has_underscore) {
                (true, true) => {
                    index.hybrid.insert(name.clone());
                }
                (true, false) => {
                    index.dashed.insert(name.clone());
                }
                (false, true) => {
                    index.underscored.insert(name.clone());
                }
                (false, false) => {}
            }
            index.names.insert(name);
        }
        index
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names containing a `.`.
    pub fn dotted(&self) -> &HashSet<String> {
        &self.dotted
    }

    /// Names containing a `-` but no `_`.
    pub fn dashed(&self) -> &HashSet<String> {
        &self.dashed
    }

    /// Names containing a `_` but no `-`.
    pub fn underscored(&self) -> &HashSet<String> {
        &self.underscored
    }

    /// Names containing both `-` and `_`.
    pub fn hybrid(&self) -> &HashSet<String> {
        &self.hybrid
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(metadata) => metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_names_categorizes_by_separator() {
        let index = PathIndex::from_names(["ls", "mkfs.ext4", "apt-get", "py_compile", "do-it_now"]);

        assert_eq!(index.len(), 5);
        assert!(index.contains("ls"));
        assert!(index.dotted().contains("mkfs.ext4"));
        assert!(index.dashed().contains("apt-get"));
        assert!(index.underscored().contains("py_compile"));
        assert!(index.hybrid().contains("do-it_now"));

        // Subsets must not bleed into each other.
        assert!(!index.dashed().contains("do-it_now"));
        assert!(!index.underscored().contains("do-it_now"));
        assert!(!index.dotted().contains("ls"));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_path_indexes_only_executable_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exec_path = dir.path().join("my-tool");
        let plain_path = dir.path().join("notes.txt");
        fs::write(&exec_path, "#!/bin/sh\n").unwrap();
        fs::write(&plain_path, "not a program").unwrap();
        fs::set_permissions(&exec_path, fs::Permissions::from_mode(0o755)).unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let path_var = env::join_paths([dir.path()]).unwrap();
        let index = PathIndex::scan_path(&path_var);

        assert!(index.contains("my-tool"));
        assert!(!index.contains("notes.txt"));
        assert!(!index.contains("subdir"));
    }

    #[test]
    fn test_scan_path_skips_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let path_var = env::join_paths([missing.as_path()]).unwrap();

        let index = PathIndex::scan_path(&path_var);
        assert!(index.is_empty());
    }

    #[test]
    fn test_empty_search_path_yields_empty_index() {
        let index = PathIndex::scan_path(OsStr::new(""));
        assert!(index.is_empty());
        assert!(!index.contains("ls"));
    }
}
