//! Month file loading from a pluggable source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::StorageError;
use crate::ingest::{merge_batches, Batch, IngestReport};
use crate::models::{EventRecord, YearMonth};

/// Somewhere month files can be read from.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Records stored for `month`.
    async fn fetch_month(&self, month: YearMonth) -> Result<Vec<EventRecord>, StorageError>;

    /// Where `month` is read from, for logs and reports.
    fn location(&self, month: YearMonth) -> String;

    /// Every month with a stored file, oldest first, when the source can list them.
    async fn available_months(&self) -> Result<Option<Vec<YearMonth>>, StorageError> {
        Ok(None)
    }
}

/// Decode a month file. The file must be a JSON array; elements that are not
/// valid event records are logged and skipped so the rest of the month loads.
pub fn decode_events(raw: &[u8], location: &str) -> Result<Vec<EventRecord>, serde_json::Error> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(raw)?;
    let mut events = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<EventRecord>(value) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Skipping record {} in {}: {}", idx, location, e),
        }
    }
    Ok(events)
}

/// Reads `<events_dir>/YYYY-MM.json` from local disk.
#[derive(Debug, Clone)]
pub struct FsEventSource {
    events_dir: PathBuf,
}

impl FsEventSource {
    pub fn new(events_dir: PathBuf) -> Self {
        Self { events_dir }
    }

    pub fn events_dir(&self) -> &Path {
        &self.events_dir
    }

    async fn read_file(path: &Path) -> Result<Vec<EventRecord>, StorageError> {
        if !tokio::fs::try_exists(path).await? {
            return Err(StorageError::PathNotFound(path.to_path_buf()));
        }
        let raw = tokio::fs::read(path).await?;
        let events = decode_events(&raw, &path.display().to_string())?;
        debug!("Read {} events from {:?}", events.len(), path);
        Ok(events)
    }

    /// Month files present in the events directory, in name order.
    pub fn month_files(&self) -> Result<Vec<(YearMonth, PathBuf)>, StorageError> {
        let pattern = self.events_dir.join("*.json");
        let pattern = pattern
            .to_str()
            .ok_or_else(|| StorageError::InvalidPath(format!("{:?}", self.events_dir)))?;

        let month_stem = Regex::new(r"^\d{4}-\d{2}$")?;
        let mut files = Vec::new();
        for entry in glob::glob(pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !month_stem.is_match(stem) {
                debug!("Ignoring non-month file {:?}", path);
                continue;
            }
            match stem.parse::<YearMonth>() {
                Ok(month) => files.push((month, path)),
                Err(e) => warn!("Skipping {:?}: {}", path, StorageError::InvalidMonth(e.0)),
            }
        }

        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }
}

#[async_trait]
impl EventSource for FsEventSource {
    async fn fetch_month(&self, month: YearMonth) -> Result<Vec<EventRecord>, StorageError> {
        Self::read_file(&self.events_dir.join(month.file_name())).await
    }

    fn location(&self, month: YearMonth) -> String {
        self.events_dir.join(month.file_name()).display().to_string()
    }

    async fn available_months(&self) -> Result<Option<Vec<YearMonth>>, StorageError> {
        if !tokio::fs::try_exists(&self.events_dir).await? {
            return Err(StorageError::PathNotFound(self.events_dir.clone()));
        }
        let months = self.month_files()?.into_iter().map(|(m, _)| m).collect();
        Ok(Some(months))
    }
}

/// Loads month ranges concurrently from an [`EventSource`].
#[derive(Clone)]
pub struct EventLoader {
    source: Arc<dyn EventSource>,
}

impl EventLoader {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self { source }
    }

    pub fn fs(events_dir: PathBuf) -> Self {
        Self::new(Arc::new(FsEventSource::new(events_dir)))
    }

    /// Deduplicated events for every month from `start` to `end` inclusive,
    /// newest first.
    pub async fn load_range(&self, start: YearMonth, end: YearMonth) -> Vec<EventRecord> {
        self.load_range_with_report(start, end).await.0
    }

    /// Like [`EventLoader::load_range`], also returning what was dropped.
    pub async fn load_range_with_report(
        &self,
        start: YearMonth,
        end: YearMonth,
    ) -> (Vec<EventRecord>, IngestReport) {
        self.load_months(YearMonth::range_inclusive(start, end)).await
    }

    /// Load every month file the source holds, as the static site build does.
    ///
    /// Returns `Ok(None)` when the source cannot list its months.
    pub async fn load_all(&self) -> Result<Option<(Vec<EventRecord>, IngestReport)>, StorageError> {
        match self.source.available_months().await? {
            Some(months) => Ok(Some(self.load_months(months).await)),
            None => Ok(None),
        }
    }

    /// Fetch `months` concurrently and merge them in the given order.
    ///
    /// A month that fails to load contributes nothing; the others still load.
    async fn load_months(&self, months: Vec<YearMonth>) -> (Vec<EventRecord>, IngestReport) {
        let mut tasks = JoinSet::new();

        for (idx, month) in months.iter().copied().enumerate() {
            let source = Arc::clone(&self.source);
            tasks.spawn(async move { (idx, month, source.fetch_month(month).await) });
        }

        let mut slots: Vec<Option<Vec<EventRecord>>> = vec![None; months.len()];
        let mut skipped = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, _, Ok(events))) => slots[idx] = Some(events),
                Ok((_, month, Err(e))) => {
                    let location = self.source.location(month);
                    warn!("Failed to load {}: {}", location, e);
                    skipped.push(location);
                }
                Err(e) => warn!("Month load task failed: {}", e),
            }
        }

        let batches = months
            .into_iter()
            .zip(slots)
            .filter_map(|(month, events)| {
                events.map(|events| Batch::new(self.source.location(month), events))
            })
            .collect();

        skipped.sort();
        merge_batches(batches, skipped)
    }

    /// The trailing `window_months` months ending with the month of `now`.
    pub async fn load_window(
        &self,
        now: chrono::NaiveDate,
        window_months: u32,
    ) -> Vec<EventRecord> {
        let end = YearMonth::from_date(now);
        let start = end.months_back(window_months.saturating_sub(1));
        self.load_range(start, end).await
    }
}
