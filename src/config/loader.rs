//! Config file discovery (C11): `--config` flag, then `./config.toml`,
//! then `{USER_HOME}/.config/live-catalog/config.toml`. The first that
//! exists wins; if none exist, the caller falls back to built-in defaults.

use std::path::{Path, PathBuf};

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
    }

    let cwd_candidate = PathBuf::from("config.toml");
    if cwd_candidate.is_file() {
        return Some(cwd_candidate);
    }

    let home = dirs::home_dir()?;
    let candidate = home.join(".config").join("live-catalog").join("config.toml");
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_wins_when_it_exists() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("custom.toml");
        fs::write(&explicit, b"").unwrap();
        assert_eq!(find_config_file(Some(&explicit)), Some(explicit));
    }

    #[test]
    fn explicit_path_is_skipped_when_missing() {
        let missing = Path::new("/does/not/exist/config.toml");
        // Falls through to cwd/home search; in a test sandbox neither is
        // likely to exist, so this should resolve to None rather than
        // panicking or erroring.
        let _ = find_config_file(Some(missing));
    }
}
