use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use pigeon_api::{DEFAULT_BASE_URL, DEFAULT_IMAGE_ENDPOINT};

use crate::search::{DEFAULT_FALLBACK_IMAGE_URL, DEFAULT_TOP_K};

pub const ENV_API_URL: &str = "PIGEON_API_URL";
pub const ENV_IMAGE_ACCESS_KEY: &str = "PIGEON_IMAGE_ACCESS_KEY";

/// Main configuration structure
///
/// Loaded from the config file, then environment overrides. The CLI applies
/// its own flags on top. Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults
    pub fn load() -> crate::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `<config_dir>/pigeon/config.toml`
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("pigeon").join("config.toml"))
    }

    /// Non-empty environment values win over the file
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(key) = lookup(ENV_IMAGE_ACCESS_KEY) {
            self.images.access_key = Some(key);
        }
    }

    /// Profile database location, defaulting under the user data dir
    pub fn db_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.storage.db_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("pigeon").join("profile.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Where the trending/recommend service lives
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// How many recommendations a search asks for
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_endpoint")]
    pub endpoint: String,

    /// Image search access key. Without one every search gets the
    /// fallback image.
    pub access_key: Option<String>,

    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
}

fn default_image_endpoint() -> String {
    DEFAULT_IMAGE_ENDPOINT.to_string()
}

fn default_per_page() -> u32 {
    1
}

fn default_fallback_url() -> String {
    DEFAULT_FALLBACK_IMAGE_URL.to_string()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_image_endpoint(),
            access_key: None,
            per_page: default_per_page(),
            fallback_url: default_fallback_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Overrides the default profile database path
    pub db_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.top_k, 5);
        assert_eq!(config.images.per_page, 1);
        assert!(config.images.access_key.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://news.internal"

            [images]
            access_key = "abc123"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://news.internal");
        assert_eq!(config.api.top_k, 5);
        assert_eq!(config.images.access_key.as_deref(), Some("abc123"));
        assert_eq!(config.images.endpoint, DEFAULT_IMAGE_ENDPOINT);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            ENV_API_URL => Some("http://10.0.0.2:8000".into()),
            ENV_IMAGE_ACCESS_KEY => Some("   ".into()),
            _ => None,
        });

        assert_eq!(config.api.base_url, "http://10.0.0.2:8000");
        assert!(config.images.access_key.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pigeon").join("config.toml");

        let mut config = Config::default();
        config.storage.db_path = Some(dir.path().join("profile.db"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage.db_path, config.storage.db_path);
        assert_eq!(loaded.db_path().unwrap(), dir.path().join("profile.db"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(loaded.api.base_url, DEFAULT_BASE_URL);
    }
}
