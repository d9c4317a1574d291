//! Configuration management with YAML support

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::locate::Variant;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Per-variant settings, keyed by "standard" / "ultra"
    #[serde(default)]
    pub variants: HashMap<String, VariantConfig>,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub reader: ReaderConfig,
}

/// Individual variant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Overrides the platform-derived root search for this variant;
    /// searched before the OS-convention candidates.
    #[serde(default)]
    pub base_path: Option<String>,
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

/// Resilient reader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

// Default value functions
fn default_enabled() -> bool {
    true
}

fn default_ttl_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variants: HashMap::new(),
            cache: CacheConfig::default(),
            reader: ReaderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./colloquy.yaml (current directory)
    /// 3. ~/.config/colloquy/colloquy.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "colloquy.yaml".to_string(),
            shellexpand::tilde("~/.config/colloquy/colloquy.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Check if a variant's roots participate in the search
    pub fn is_variant_enabled(&self, variant: Variant) -> bool {
        self.variants
            .get(variant.as_str())
            .map_or(true, |v| v.enabled)
    }

    /// Get the configured root override for a variant, expanding ~
    pub fn root_override(&self, variant: Variant) -> Option<PathBuf> {
        self.variants
            .get(variant.as_str())
            .and_then(|v| v.base_path.as_ref())
            .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.is_variant_enabled(Variant::Standard));
        assert!(config.is_variant_enabled(Variant::Ultra));
        assert_eq!(config.cache.ttl_ms, 30_000);
        assert_eq!(config.reader.max_attempts, 3);
        assert_eq!(config.reader.timeout_ms, 5_000);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
variants:
  standard:
    enabled: true
    base_path: ~/storage/standard/tasks
  ultra:
    enabled: false

cache:
  ttl_ms: 500

reader:
  max_attempts: 5
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.is_variant_enabled(Variant::Standard));
        assert!(!config.is_variant_enabled(Variant::Ultra));
        assert_eq!(config.cache.ttl_ms, 500);
        assert_eq!(config.reader.max_attempts, 5);
        // base_path is tilde-expanded
        let root = config.root_override(Variant::Standard).unwrap();
        assert!(!root.to_string_lossy().starts_with('~'));
        assert!(root.ends_with("storage/standard/tasks"));
    }

    #[test]
    fn test_root_override_absent_by_default() {
        let config = Config::default();
        assert!(config.root_override(Variant::Standard).is_none());
    }
}
