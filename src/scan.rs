//! Path scanner (C2): enumerates candidate `.als` files under a root,
//! filtering backup paths and macOS resource-fork sidecar files.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::InvalidPath;

/// A literal, case-sensitive ancestor-directory name that marks a path as a
/// backup copy to be excluded from scanning.
const BACKUP_DIR_NAMES: [&str; 2] = ["Backup", "backup"];

/// macOS resource-fork sidecar prefix; files like `._Project A.als` are
/// never real project files.
const SIDECAR_PREFIX: &str = "._";

pub struct ProjectPathScanner;

impl ProjectPathScanner {
    pub fn new() -> Self {
        Self
    }

    /// Returns the `.als` files found under `root`. If `root` is itself a
    /// file, it is returned alone (after the suffix check); if it is a
    /// directory, it is walked according to `recursive`. Results are sorted
    /// lexicographically so that scans of an unchanged filesystem state are
    /// deterministic.
    pub fn scan(&self, root: &Path, recursive: bool) -> Result<Vec<PathBuf>, InvalidPath> {
        if root.is_file() {
            if root.extension().and_then(|e| e.to_str()) != Some("als") {
                return Err(InvalidPath::NotAlsFile(root.to_path_buf()));
            }
            return Ok(vec![root.to_path_buf()]);
        }

        if !root.is_dir() {
            return Err(InvalidPath::NotFileOrDirectory(root.to_path_buf()));
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut paths: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("als"))
            .filter(|path| is_accepted(path))
            .collect();

        paths.sort();
        Ok(paths)
    }

    /// Convenience wrapper matching the common case of a recursive directory
    /// scan, used by the CLI's `scan`/`watch` startup pass.
    pub fn scan_directory(&self, root: &Path) -> Result<Vec<PathBuf>, InvalidPath> {
        self.scan(root, true)
    }
}

impl Default for ProjectPathScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the backup-directory and sidecar-file filters to a single path.
fn is_accepted(path: &Path) -> bool {
    let in_backup_dir = path
        .parent()
        .into_iter()
        .flat_map(|parent| parent.components())
        .any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| BACKUP_DIR_NAMES.contains(&name))
        });
    if in_backup_dir {
        return false;
    }

    !path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(SIDECAR_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn scan_finds_als_files_recursively() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("Project A.als"));
        touch(&dir.path().join("nested/Project B.als"));
        touch(&dir.path().join("nested/not_a_project.txt"));

        let scanner = ProjectPathScanner::new();
        let found = scanner.scan(dir.path(), true).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn scan_excludes_backup_directories() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("Project A.als"));
        touch(&dir.path().join("Backup/Project A.als"));
        touch(&dir.path().join("backup/Project B.als"));
        touch(&dir.path().join("Backups/Project C.als")); // not a literal match, stays

        let scanner = ProjectPathScanner::new();
        let found = scanner.scan(dir.path(), true).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert!(names.contains(&"Project A.als"));
        assert!(names.contains(&"Project C.als"));
        assert!(!names.contains(&"Project B.als"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn scan_excludes_resource_fork_sidecars() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("Project A.als"));
        touch(&dir.path().join("._Project A.als"));

        let scanner = ProjectPathScanner::new();
        let found = scanner.scan(dir.path(), true).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn scan_non_recursive_stays_at_top_level() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("Project A.als"));
        touch(&dir.path().join("nested/Project B.als"));

        let scanner = ProjectPathScanner::new();
        let found = scanner.scan(dir.path(), false).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn scan_single_file_input_requires_als_suffix() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("notes.txt");
        touch(&txt);

        let scanner = ProjectPathScanner::new();
        let err = scanner.scan(&txt, false).unwrap_err();
        assert!(matches!(err, InvalidPath::NotAlsFile(_)));
    }

    #[test]
    fn scan_rejects_nonexistent_input() {
        let scanner = ProjectPathScanner::new();
        let err = scanner
            .scan(Path::new("/does/not/exist/at/all"), false)
            .unwrap_err();
        assert!(matches!(err, InvalidPath::NotFileOrDirectory(_)));
    }

    #[test]
    fn scan_is_deterministic() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("b.als"));
        touch(&dir.path().join("a.als"));
        touch(&dir.path().join("c.als"));

        let scanner = ProjectPathScanner::new();
        let found = scanner.scan(dir.path(), false).unwrap();
        let mut sorted = found.clone();
        sorted.sort();
        assert_eq!(found, sorted);
    }
}
