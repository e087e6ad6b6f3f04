//! Site directory layout and event store loading.
//!
//! The site directory holds everything served to browsers:
//! - `data/events/YYYY-MM.json` month files (source of truth)
//! - `images/events/<id>/` deck photos for each event

mod loader;

pub use loader::*;

use std::path::PathBuf;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::models::{EventId, YearMonth};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Invalid regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid month file name: {0}")]
    InvalidMonth(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub site_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(site_dir: PathBuf) -> Self {
        Self { site_dir }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.site_dir.join("data")
    }

    pub fn events_dir(&self) -> PathBuf {
        self.data_dir().join("events")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.site_dir.join("images")
    }

    pub fn event_images_dir(&self, id: &EventId) -> PathBuf {
        self.images_dir().join("events").join(id.as_str())
    }

    /// Path of the month file holding events dated in `month`.
    pub fn month_path(&self, month: YearMonth) -> PathBuf {
        self.events_dir().join(month.file_name())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./public"))
    }
}

/// Public URLs for site assets, relative to a deployment base path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPaths {
    base_path: String,
}

impl AssetPaths {
    /// `base_path` is stored without a trailing slash; an empty base serves from `/`.
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn image_url(&self, rel: &str) -> String {
        format!("{}/images/{}", self.base_path, rel.trim_start_matches('/'))
    }

    pub fn event_image_url(&self, id: &EventId, rel: &str) -> String {
        format!(
            "{}/images/events/{}/{}",
            self.base_path,
            id,
            rel.trim_start_matches('/')
        )
    }

    pub fn json_url(&self, rel: &str) -> String {
        format!("{}/data/{}", self.base_path, rel.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/site"));
        let month = YearMonth::new(2026, 3).unwrap();

        assert_eq!(config.data_dir(), PathBuf::from("/site/data"));
        assert_eq!(config.events_dir(), PathBuf::from("/site/data/events"));
        assert_eq!(config.images_dir(), PathBuf::from("/site/images"));
        assert_eq!(
            config.event_images_dir(&EventId::from("abc")),
            PathBuf::from("/site/images/events/abc")
        );
        assert_eq!(
            config.month_path(month),
            PathBuf::from("/site/data/events/2026-03.json")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.site_dir, PathBuf::from("./public"));
    }

    #[test]
    fn test_asset_paths_without_base() {
        let assets = AssetPaths::default();

        assert_eq!(assets.image_url("logo.png"), "/images/logo.png");
        assert_eq!(
            assets.event_image_url(&EventId::from("e1"), "1.webp"),
            "/images/events/e1/1.webp"
        );
        assert_eq!(assets.json_url("events/2026-10.json"), "/data/events/2026-10.json");
    }

    #[test]
    fn test_asset_paths_with_base() {
        let assets = AssetPaths::new("/community/");

        assert_eq!(assets.base_path(), "/community");
        assert_eq!(assets.image_url("/logo.png"), "/community/images/logo.png");
        assert_eq!(
            assets.event_image_url(&EventId::from("e1"), "2.webp"),
            "/community/images/events/e1/2.webp"
        );
    }
}
