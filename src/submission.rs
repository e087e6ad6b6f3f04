//! Event listing requests.
//!
//! Organizers fill in an [`EventDraft`]; it is normalized into a full
//! [`EventRecord`] and sent to maintainers as pretty-printed JSON, ready to be
//! pasted into a month file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{parse_event_date, DeckTally, EventId, EventRecord, Winner};

/// Subject line used when a draft is mailed to maintainers.
pub const SUBMISSION_SUBJECT: &str = "Event Listing Request";

/// Format used for `when` in submitted records, e.g. `Oct 04 2026`.
pub const SUBMISSION_DATE_FORMAT: &str = "%b %d %Y";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unrecognized event date: {0}")]
    InvalidDate(String),

    #[error("JSON serialization error: {0}")]
    Json(String),
}

/// A winner as entered on the form; position comes from list order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub deck: String,
}

fn default_format() -> String {
    "OCG".to_string()
}

fn default_rounds() -> Option<u32> {
    Some(3)
}

/// Form input for a new event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub host: String,

    /// Any date `parse_event_date` understands, usually `YYYY-MM-DD`
    #[serde(default)]
    pub when: String,

    #[serde(default, rename = "where")]
    pub location: String,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub official: bool,

    #[serde(default = "default_rounds")]
    pub rounds: Option<u32>,

    #[serde(default)]
    pub winners: Vec<WinnerDraft>,

    #[serde(default)]
    pub decks: Vec<DeckTally>,

    #[serde(default)]
    pub notes: String,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            host: String::new(),
            when: String::new(),
            location: String::new(),
            format: default_format(),
            official: false,
            rounds: default_rounds(),
            winners: Vec::new(),
            decks: Vec::new(),
            notes: String::new(),
        }
    }
}

impl EventDraft {
    /// Normalize into a record with a fresh id.
    pub fn into_record(self) -> Result<EventRecord, SubmissionError> {
        self.into_record_with_id(EventId::generate())
    }

    /// Normalize into a record with the given id.
    pub fn into_record_with_id(self, id: EventId) -> Result<EventRecord, SubmissionError> {
        if self.title.trim().is_empty() {
            return Err(SubmissionError::MissingField("title"));
        }
        if self.host.trim().is_empty() {
            return Err(SubmissionError::MissingField("host"));
        }
        if self.when.trim().is_empty() {
            return Err(SubmissionError::MissingField("when"));
        }
        let date = parse_event_date(&self.when)
            .ok_or_else(|| SubmissionError::InvalidDate(self.when.clone()))?;
        let when = date.format(SUBMISSION_DATE_FORMAT).to_string();

        let mut record = EventRecord::new(id, &self.title, &when)
            .with_host(&self.host)
            .with_location(&self.location)
            .with_format(&self.format, self.official);

        for (idx, winner) in self.winners.iter().enumerate() {
            let position = idx as u32 + 1;
            let mut entry = Winner::new(&winner.name, position, &winner.deck);
            entry.deck_image_path = format!("{}.webp", position);
            record = record.with_winner(entry);
        }

        let decks = self
            .decks
            .into_iter()
            .filter(|d| !d.name.trim().is_empty())
            .map(|d| DeckTally::new(&d.name, d.count.max(1)))
            .collect();
        record = record.with_decks(decks);

        if let Some(rounds) = self.rounds {
            record = record.with_rounds(rounds);
        }
        if !self.notes.trim().is_empty() {
            record = record.with_notes(&self.notes);
        }

        Ok(record)
    }
}

/// Pretty-printed JSON of a record, as pasted into a month file.
pub fn payload(record: &EventRecord) -> Result<String, SubmissionError> {
    serde_json::to_string_pretty(record).map_err(|e| SubmissionError::Json(e.to_string()))
}
