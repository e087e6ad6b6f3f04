//! Configuration loading and validation.
//!
//! Settings come from an optional TOML file, overridden by
//! `COMMUNITY_META__*` environment variables (`__` separates nested keys,
//! e.g. `COMMUNITY_META__SERVER__PORT`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calculate::{ColorError, PaletteSeed, Rgb};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "COMMUNITY_META";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to load layered config: {0}")]
    LayerError(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Where month files are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// `<site_dir>/data/events`
    #[default]
    Fs,
    /// `<base_url>/data/events`
    Http,
}

/// Event source configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Required for the http source
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    30
}

/// Chart rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Entries shown before the tail is folded into "Other"
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Starting color for generated palettes; empty selects the fixed palette
    #[serde(default = "default_seed_color")]
    pub seed_color: String,
}

fn default_max_items() -> usize {
    10
}

fn default_seed_color() -> String {
    "#2563eb".to_string()
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            seed_color: default_seed_color(),
        }
    }
}

impl ChartConfig {
    pub fn palette_seed(&self) -> Result<PaletteSeed, ColorError> {
        if self.seed_color.trim().is_empty() {
            return Ok(PaletteSeed::Default);
        }
        Ok(PaletteSeed::From(self.seed_color.parse::<Rgb>()?))
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Static site root holding `data/` and `images/`
    #[serde(default = "default_site_dir")]
    pub site_dir: PathBuf,

    /// URL prefix the site is deployed under
    #[serde(default)]
    pub base_path: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Months loaded for the meta pages
    #[serde(default = "default_window_months")]
    pub window_months: u32,

    /// Longest month span a request may ask for
    #[serde(default = "default_max_window_months")]
    pub max_window_months: u32,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub charts: ChartConfig,

    #[serde(default)]
    pub source: SourceConfig,
}

fn default_site_dir() -> PathBuf {
    PathBuf::from("./public")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_window_months() -> u32 {
    12
}

fn default_max_window_months() -> u32 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_dir: default_site_dir(),
            base_path: String::new(),
            log_level: default_log_level(),
            window_months: default_window_months(),
            max_window_months: default_max_window_months(),
            server: ServerConfig::default(),
            charts: ChartConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then the optional file at `path`, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path.to_path_buf()).required(false));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.window_months == 0 {
            return Err(ConfigError::ValidationError(
                "Window must cover at least one month".to_string(),
            ));
        }

        if self.window_months > self.max_window_months {
            return Err(ConfigError::ValidationError(format!(
                "Window of {} months exceeds max_window_months ({})",
                self.window_months, self.max_window_months
            )));
        }

        if self.charts.max_items == 0 {
            return Err(ConfigError::ValidationError(
                "Charts must show at least one item".to_string(),
            ));
        }

        self.charts
            .palette_seed()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.source.kind == SourceKind::Http
            && self.source.base_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::ValidationError(
                "The http source needs a base_url".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.site_dir, PathBuf::from("./public"));
        assert_eq!(config.base_path, "");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.window_months, 12);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.charts.max_items, 10);
        assert_eq!(config.source.kind, SourceKind::Fs);
    }

    #[test]
    fn test_palette_seed() {
        let mut charts = ChartConfig::default();
        assert_eq!(
            charts.palette_seed().unwrap(),
            PaletteSeed::From(Rgb::new(0x25, 0x63, 0xeb))
        );

        charts.seed_color = String::new();
        assert_eq!(charts.palette_seed().unwrap(), PaletteSeed::Default);
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_window_and_items() {
        let mut config = AppConfig::default();
        config.window_months = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.charts.max_items = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_limited_by_max_window() {
        let mut config = AppConfig::default();
        assert_eq!(config.max_window_months, 60);

        config.window_months = 61;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.max_window_months = 120;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_seed_color() {
        let mut config = AppConfig::default();
        config.charts.seed_color = "blue".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_http_source_needs_base_url() {
        let mut config = AppConfig::default();
        config.source.kind = SourceKind::Http;
        assert!(config.validate().is_err());

        config.source.base_url = Some("https://example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("meta.toml");
        std::fs::write(
            &path,
            r##"
site_dir = "/srv/site"
window_months = 6

[charts]
seed_color = "#123"

[source]
kind = "http"
base_url = "https://cards.example.org"
"##,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();

        assert_eq!(config.site_dir, PathBuf::from("/srv/site"));
        assert_eq!(config.window_months, 6);
        assert_eq!(config.charts.max_items, 10);
        assert_eq!(config.source.kind, SourceKind::Http);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_layered_load_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("meta.toml");
        std::fs::write(&path, "base_path = \"/meta\"\n[charts]\nmax_items = 6\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.base_path, "/meta");
        assert_eq!(config.charts.max_items, 6);
        assert_eq!(config.charts.seed_color, "#2563eb");
    }

    #[test]
    fn test_layered_load_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load(Some(&tmp.path().join("absent.toml"))).unwrap();

        assert_eq!(config.site_dir, PathBuf::from("./public"));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.site_dir, parsed.site_dir);
        assert_eq!(config.charts.seed_color, parsed.charts.seed_color);
    }
}
