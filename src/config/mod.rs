//! Configuration (C11): a small TOML file holding the catalog's database
//! path and the list of directories the watcher/scanner operate over.
//! `{USER_HOME}` in `database_path` is substituted at load time so the
//! same config file works across machines.

pub mod loader;

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::CatalogEngineError;

const USER_HOME_TOKEN: &str = "{USER_HOME}";

/// Serializes mutations to `directories` so two CLI invocations editing
/// the config file at once can't interleave a read-modify-write and drop
/// one of their changes.
static MUTATION_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabasePath {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabasePath {
    fn default() -> Self {
        Self { path: default_database_path() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Directories {
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveDatabaseDir {
    pub dir: Option<PathBuf>,
}

/// The resolved configuration document (§4.11/§6): `database_path.path`,
/// `directories.paths`, and `live_database_dir.dir`, each with
/// `{USER_HOME}` substituted at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_path: DatabasePath,
    #[serde(default)]
    pub directories: Directories,
    #[serde(default)]
    pub live_database_dir: LiveDatabaseDir,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: DatabasePath::default(),
            directories: Directories::default(),
            live_database_dir: LiveDatabaseDir::default(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from(format!("{USER_HOME_TOKEN}/.local/share/live-catalog/catalog.db"))
}

impl Config {
    /// Loads the config found by [`loader::find_config_file`], or built-in
    /// defaults if none exists. Every `{USER_HOME}` token present in
    /// `database_path.path`, `directories.paths`, or `live_database_dir.dir`
    /// is resolved before this returns.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, CatalogEngineError> {
        let mut config = match loader::find_config_file(explicit_path) {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .map_err(|e| CatalogEngineError::Config(format!("{}: {e}", path.display())))?;
                toml::from_str(&raw)
                    .map_err(|e| CatalogEngineError::Config(format!("{}: {e}", path.display())))?
            }
            None => Config::default(),
        };
        config.database_path.path = substitute_user_home(&config.database_path.path)?;
        config.directories.paths = config
            .directories
            .paths
            .iter()
            .map(|p| substitute_user_home(p))
            .collect::<Result<_, _>>()?;
        config.live_database_dir.dir = config
            .live_database_dir
            .dir
            .as_deref()
            .map(substitute_user_home)
            .transpose()?;
        Ok(config)
    }

    pub fn add_directory(&mut self, path: PathBuf, config_path: &Path) -> Result<(), CatalogEngineError> {
        let _guard = MUTATION_LOCK.lock();
        if !self.directories.paths.contains(&path) {
            self.directories.paths.push(path);
        }
        self.save(config_path)
    }

    pub fn remove_directory(&mut self, path: &Path, config_path: &Path) -> Result<(), CatalogEngineError> {
        let _guard = MUTATION_LOCK.lock();
        self.directories.paths.retain(|existing| existing != path);
        self.save(config_path)
    }

    fn save(&self, config_path: &Path) -> Result<(), CatalogEngineError> {
        let serialized = toml::to_string_pretty(self)
            .map_err(|e| CatalogEngineError::Config(e.to_string()))?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CatalogEngineError::Config(format!("{}: {e}", parent.display())))?;
        }
        fs::write(config_path, serialized)
            .map_err(|e| CatalogEngineError::Config(format!("{}: {e}", config_path.display())))
    }
}

fn substitute_user_home(path: &Path) -> Result<PathBuf, CatalogEngineError> {
    let raw = path.to_string_lossy();
    if !raw.contains(USER_HOME_TOKEN) {
        return Ok(path.to_path_buf());
    }
    let home = dirs::home_dir()
        .ok_or_else(|| CatalogEngineError::Config("could not determine home directory".to_string()))?;
    Ok(PathBuf::from(
        raw.replace(USER_HOME_TOKEN, &home.to_string_lossy()),
    ))
}
