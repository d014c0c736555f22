//! Lurker tuning loader.

use std::path::Path;

use tracing::debug;

use crate::config::LurkerConfig;
use crate::loaders::{LoadResult, read_file};

/// Loader for [`LurkerConfig`] from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads a config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<LurkerConfig> {
        let content = read_file(path)?;
        let config = Self::parse(&content)?;
        debug!(target: "content::loaders", path = %path.display(), "loaded lurker config");
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> LoadResult<LurkerConfig> {
        path.map_or_else(|| Ok(LurkerConfig::default()), Self::load)
    }

    pub fn parse(content: &str) -> LoadResult<LurkerConfig> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))
    }
}
