use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::config::{AppConfig, SourceKind};
use crate::fetch::{FetchError, FetcherConfig, HttpEventSource};
use crate::storage::{AssetPaths, EventLoader, StorageConfig};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageConfig>,
    pub config: Arc<AppConfig>,
    pub loader: EventLoader,
    pub assets: AssetPaths,

    /// Pins "today" for reproducible responses
    pub fixed_now: Option<NaiveDate>,
}

impl AppState {
    /// Build state for `config`, reading events from the configured source.
    pub fn from_config(config: AppConfig) -> Result<Self, FetchError> {
        let storage = StorageConfig::new(config.site_dir.clone());
        let loader = match config.source.kind {
            SourceKind::Fs => EventLoader::fs(storage.events_dir()),
            SourceKind::Http => {
                let raw = config.source.base_url.as_deref().unwrap_or_default();
                let base_url = url::Url::parse(raw)
                    .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;
                let fetcher = FetcherConfig::new(base_url)
                    .with_timeout(Duration::from_secs(config.source.timeout_seconds));
                EventLoader::new(Arc::new(HttpEventSource::new(fetcher)?))
            }
        };

        Ok(Self {
            storage: Arc::new(storage),
            assets: AssetPaths::new(&config.base_path),
            config: Arc::new(config),
            loader,
            fixed_now: None,
        })
    }

    pub fn with_fixed_now(mut self, now: Option<NaiveDate>) -> Self {
        self.fixed_now = now;
        self
    }

    /// Reference date for windowed statistics.
    pub fn today(&self) -> NaiveDate {
        self.fixed_now
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}
