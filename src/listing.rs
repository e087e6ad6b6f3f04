//! Event table queries: search, column filters and sorting.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::EventRecord;

/// Column an event listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    When,
    Title,
    Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "when" | "date" => Ok(SortKey::When),
            "title" => Ok(SortKey::Title),
            "host" => Ok(SortKey::Host),
            other => Err(format!("unknown sort column: {}", other)),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::When => "when",
            SortKey::Title => "title",
            SortKey::Host => "host",
        };
        f.write_str(name)
    }
}

/// Filters and ordering for an event listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub host: Option<String>,
    pub format: Option<String>,
    pub official: Option<bool>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl EventQuery {
    pub fn matches(&self, event: &EventRecord) -> bool {
        if let Some(needle) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            if !event
                .title
                .to_lowercase()
                .contains(&needle.trim().to_lowercase())
            {
                return false;
            }
        }
        if self.host.as_deref().is_some_and(|h| h != event.host) {
            return false;
        }
        if self.format.as_deref().is_some_and(|f| f != event.format) {
            return false;
        }
        if self.official.is_some_and(|o| o != event.official) {
            return false;
        }
        true
    }

    fn compare(&self, a: &EventRecord, b: &EventRecord) -> Ordering {
        let ordering = match self.sort {
            SortKey::When => a.date().cmp(&b.date()),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Host => a.host.to_lowercase().cmp(&b.host.to_lowercase()),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Filter then sort; ties keep their input order.
    pub fn apply(&self, events: Vec<EventRecord>) -> Vec<EventRecord> {
        let mut matched: Vec<EventRecord> =
            events.into_iter().filter(|e| self.matches(e)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        matched
    }
}
