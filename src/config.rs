use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest page size the GitHub REST API accepts
pub const MAX_PER_PAGE: u8 = 100;

/// Main configuration structure for tagwarden
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// GitHub API settings
    #[serde(default)]
    pub github: GitHubSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub API configuration
///
/// The access token is not part of the file; callers pass it to
/// [`crate::GitHubClient::new`] explicitly.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubSettings {
    /// API root for GitHub Enterprise; `None` means api.github.com
    #[serde(default)]
    pub api_base: Option<String>,

    /// Page size for release and tag listings
    #[serde(default = "default_per_page")]
    pub per_page: u8,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

// Default value functions
fn default_per_page() -> u8 {
    MAX_PER_PAGE
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            per_page: default_per_page(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl GitHubSettings {
    /// Page size clamped into the range the API accepts
    pub fn page_size(&self) -> u8 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("tagwarden").join("config.yml"))
    }

    /// Expand environment variables in configured values
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(api_base) = &self.github.api_base {
            self.github.api_base = Some(
                shellexpand::full(api_base)
                    .context("Failed to expand github.api_base")?
                    .into_owned(),
            );
        }

        Ok(())
    }
}
