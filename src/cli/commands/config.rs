//! `live-catalog config show`: prints the resolved configuration, after
//! `{USER_HOME}` substitution, so the operator can see what the engine
//! will actually use without re-deriving it by hand.

use crate::config::Config;
use crate::error::CatalogEngineError;

pub fn show(config: &Config) -> Result<String, CatalogEngineError> {
    toml::to_string_pretty(config).map_err(|e| CatalogEngineError::Config(e.to_string()))
}
