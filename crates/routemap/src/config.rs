// File: src/config.rs
// Purpose: Mapper configuration parsing from routemap.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::cache::DEFAULT_CACHE_SIZE;

/// Mapper configuration
///
/// Read either from a `[routing]` table or from top-level keys:
///
/// ```
/// use routemap::MapperConfig;
///
/// let config = MapperConfig::from_toml_str("[routing]\ncache_size = 32").unwrap();
/// assert_eq!(config.cache_size, 32);
/// assert!(config.decode_params);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Capacity of the match cache; 0 disables caching (default: 1600)
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Percent-decode matched values (default: true)
    #[serde(default = "default_true")]
    pub decode_params: bool,

    /// Whether submapper helpers append `{.format}` (default: true)
    #[serde(default = "default_true")]
    pub formatted: bool,

    /// Whether templates match case-insensitively (default: false)
    #[serde(default = "default_false")]
    pub case_insensitive: bool,
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            decode_params: true,
            formatted: true,
            case_insensitive: false,
        }
    }
}

impl MapperConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from default path (./routemap.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("routemap.toml")
    }

    /// Parses TOML text; blank text yields the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut table: toml::Table = toml::from_str(content).context("Invalid TOML")?;
        let table = match table.remove("routing") {
            Some(toml::Value::Table(routing)) => routing,
            Some(other) => anyhow::bail!("`routing` must be a table, found {}", other.type_str()),
            None => table,
        };

        toml::Value::Table(table)
            .try_into()
            .context("Invalid routing configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MapperConfig::default();
        assert_eq!(config.cache_size, 1600);
        assert!(config.decode_params);
        assert!(config.formatted);
        assert!(!config.case_insensitive);
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(MapperConfig::from_toml_str("  \n").unwrap(), MapperConfig::default());
    }

    #[test]
    fn test_routing_table() {
        let toml = r#"
            [routing]
            cache_size = 0
            formatted = false
        "#;
        let config = MapperConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.cache_size, 0);
        assert!(!config.formatted);
        assert!(config.decode_params);
    }

    #[test]
    fn test_top_level_keys() {
        let config = MapperConfig::from_toml_str("case_insensitive = true").unwrap();
        assert!(config.case_insensitive);
        assert_eq!(config.cache_size, 1600);
    }

    #[test]
    fn test_invalid_values() {
        assert!(MapperConfig::from_toml_str("cache_size = \"big\"").is_err());
        assert!(MapperConfig::from_toml_str("routing = 3").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = MapperConfig::load("/nonexistent/routemap.toml").unwrap();
        assert_eq!(config, MapperConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("routemap-{}.toml", std::process::id()));
        fs::write(&path, "[routing]\ndecode_params = false\n").unwrap();
        let config = MapperConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(!config.decode_params);
    }
}
