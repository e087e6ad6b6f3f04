//! Tournament event record, as stored in the monthly event files.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::EventId;

/// A placement on an event's winners list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    #[serde(default)]
    pub name: String,

    /// 1-based rank; 1 is the champion
    #[serde(default)]
    pub position: u32,

    #[serde(default)]
    pub deck: String,

    #[serde(default)]
    pub deck_image_path: String,
}

impl Winner {
    pub fn new(name: &str, position: u32, deck: &str) -> Self {
        Self {
            name: name.to_string(),
            position,
            deck: deck.to_string(),
            deck_image_path: String::new(),
        }
    }

    pub fn is_champion(&self) -> bool {
        self.position == 1
    }
}

fn default_tally_count() -> u32 {
    1
}

/// Deck participation tally: `count` players brought deck `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckTally {
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_tally_count")]
    pub count: u32,
}

impl DeckTally {
    pub fn new(name: &str, count: u32) -> Self {
        Self {
            name: name.to_string(),
            count,
        }
    }
}

/// Where deck participation for an event comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckSource {
    /// A non-empty deck tally was recorded
    Tally(Vec<DeckTally>),
    /// Only the winners list is available
    WinnersOnly,
}

impl DeckSource {
    fn from_decks(decks: Vec<DeckTally>) -> Self {
        if decks.is_empty() {
            DeckSource::WinnersOnly
        } else {
            DeckSource::Tally(decks)
        }
    }
}

/// Parse an event's `when` field.
///
/// Accepts `2025-10-04`, RFC 3339 timestamps and `Oct 04 2025` style dates.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    ["%b %d %Y", "%b %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// On-disk shape of an event. Every field but `id` may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventWire {
    id: EventId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    when: String,
    #[serde(default, rename = "where")]
    location: String,
    #[serde(default)]
    format: String,
    #[serde(default)]
    official: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rounds: Option<u32>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    winners: Option<Vec<Winner>>,
    #[serde(default)]
    decks: Option<Vec<DeckTally>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

/// A tournament event.
///
/// The event date and the deck source are resolved once, when the record is
/// built or deserialized. Serializes back to the file shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EventWire", into = "EventWire")]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    pub host: String,
    when: String,
    date: Option<NaiveDate>,
    /// Venue (`where` in the files)
    pub location: String,
    /// Tournament format label
    pub format: String,
    /// Sanctioned event
    pub official: bool,
    pub rounds: Option<u32>,
    pub images: Vec<String>,
    pub winners: Vec<Winner>,
    deck_source: DeckSource,
    pub notes: Option<String>,
}

impl From<EventWire> for EventRecord {
    fn from(wire: EventWire) -> Self {
        let date = parse_event_date(&wire.when);
        Self {
            id: wire.id,
            title: wire.title,
            host: wire.host,
            when: wire.when,
            date,
            location: wire.location,
            format: wire.format,
            official: wire.official.unwrap_or(false),
            rounds: wire.rounds,
            images: wire.images.unwrap_or_default(),
            winners: wire.winners.unwrap_or_default(),
            deck_source: DeckSource::from_decks(wire.decks.unwrap_or_default()),
            notes: wire.notes,
        }
    }
}

impl From<EventRecord> for EventWire {
    fn from(record: EventRecord) -> Self {
        let decks = match record.deck_source {
            DeckSource::Tally(decks) => decks,
            DeckSource::WinnersOnly => Vec::new(),
        };
        Self {
            id: record.id,
            title: record.title,
            host: record.host,
            when: record.when,
            location: record.location,
            format: record.format,
            official: Some(record.official),
            rounds: record.rounds,
            images: Some(record.images),
            winners: Some(record.winners),
            decks: Some(decks),
            notes: record.notes,
        }
    }
}

impl EventRecord {
    /// Create a record with the required fields; everything else empty.
    pub fn new(id: impl Into<EventId>, title: &str, when: &str) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            host: String::new(),
            when: when.to_string(),
            date: parse_event_date(when),
            location: String::new(),
            format: String::new(),
            official: false,
            rounds: None,
            images: Vec::new(),
            winners: Vec::new(),
            deck_source: DeckSource::WinnersOnly,
            notes: None,
        }
    }

    /// Raw `when` text as stored.
    pub fn when(&self) -> &str {
        &self.when
    }

    /// Parsed event date; `None` when `when` is unparsable.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Replace `when` and re-resolve the date.
    pub fn set_when(&mut self, when: &str) {
        self.when = when.to_string();
        self.date = parse_event_date(when);
    }

    pub fn deck_source(&self) -> &DeckSource {
        &self.deck_source
    }

    /// Deck tally entries, empty for winners-only events.
    pub fn decks(&self) -> &[DeckTally] {
        match &self.deck_source {
            DeckSource::Tally(decks) => decks,
            DeckSource::WinnersOnly => &[],
        }
    }

    /// Rank-1 entries of the winners list.
    pub fn champions(&self) -> impl Iterator<Item = &Winner> {
        self.winners.iter().filter(|w| w.is_champion())
    }

    /// Builder method to set the host.
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Builder method to set the venue.
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    /// Builder method to set format and official status.
    pub fn with_format(mut self, format: &str, official: bool) -> Self {
        self.format = format.to_string();
        self.official = official;
        self
    }

    /// Builder method to append a winner.
    pub fn with_winner(mut self, winner: Winner) -> Self {
        self.winners.push(winner);
        self
    }

    /// Builder method to set the deck tally.
    pub fn with_decks(mut self, decks: Vec<DeckTally>) -> Self {
        self.deck_source = DeckSource::from_decks(decks);
        self
    }

    /// Builder method to set the round count.
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Builder method to set notes.
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_event_date_formats() {
        assert_eq!(parse_event_date("2025-10-04"), Some(date(2025, 10, 4)));
        assert_eq!(
            parse_event_date("2025-10-04T10:00:00+08:00"),
            Some(date(2025, 10, 4))
        );
        assert_eq!(
            parse_event_date("2025-10-04T10:00:00"),
            Some(date(2025, 10, 4))
        );
        assert_eq!(parse_event_date("Oct 04 2025"), Some(date(2025, 10, 4)));
        assert_eq!(parse_event_date("Oct 4 2025"), Some(date(2025, 10, 4)));
        assert_eq!(parse_event_date("Oct 4, 2025"), Some(date(2025, 10, 4)));
    }

    #[test]
    fn test_parse_event_date_rejects_garbage() {
        assert_eq!(parse_event_date(""), None);
        assert_eq!(parse_event_date("TBA"), None);
        assert_eq!(parse_event_date("2025-13-01"), None);
        assert_eq!(parse_event_date("2025-02-30"), None);
    }

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{
            "id": "E1",
            "title": "Locals #12",
            "host": "Card Haven",
            "when": "Oct 04 2025",
            "where": "Quezon City",
            "format": "OCG",
            "official": true,
            "rounds": 5,
            "images": ["banner.webp"],
            "winners": [
                {"name": "Amir", "position": 1, "deck": "Kashtira", "deckImagePath": "1.webp"},
                {"name": "Zara", "position": 2, "deck": "Snake-Eye", "deckImagePath": "2.webp"}
            ],
            "decks": [{"name": "Kashtira", "count": 3}],
            "notes": "Top cut of 8"
        }"#;

        let event: EventRecord = serde_json::from_str(json).unwrap();

        assert_eq!(event.id.as_str(), "E1");
        assert_eq!(event.location, "Quezon City");
        assert_eq!(event.date(), Some(date(2025, 10, 4)));
        assert!(event.official);
        assert_eq!(event.rounds, Some(5));
        assert_eq!(event.winners[1].deck_image_path, "2.webp");
        assert_eq!(
            event.deck_source(),
            &DeckSource::Tally(vec![DeckTally::new("Kashtira", 3)])
        );
        assert_eq!(event.champions().count(), 1);
    }

    #[test]
    fn test_deserialize_minimal_record_defaults() {
        let json = r#"{"id": "E2", "winners": null, "official": null}"#;
        let event: EventRecord = serde_json::from_str(json).unwrap();

        assert_eq!(event.title, "");
        assert!(!event.official);
        assert!(event.winners.is_empty());
        assert!(event.decks().is_empty());
        assert_eq!(event.deck_source(), &DeckSource::WinnersOnly);
        assert_eq!(event.date(), None);
    }

    #[test]
    fn test_empty_deck_list_means_winners_only() {
        let json = r#"{"id": "E3", "decks": []}"#;
        let event: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(event.deck_source(), &DeckSource::WinnersOnly);
    }

    #[test]
    fn test_tally_count_defaults_to_one() {
        let json = r#"{"id": "E4", "decks": [{"name": "Yubel"}]}"#;
        let event: EventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(event.decks(), &[DeckTally::new("Yubel", 1)]);
    }

    #[test]
    fn test_serializes_back_to_file_shape() {
        let event = EventRecord::new("E5", "Regionals", "2025-06-01")
            .with_host("Hobby Hub")
            .with_location("Cebu")
            .with_format("TCG", true)
            .with_winner(Winner::new("Amir", 1, "Tenpai"))
            .with_decks(vec![DeckTally::new("Tenpai", 2)]);

        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["where"], "Cebu");
        assert_eq!(value["when"], "2025-06-01");
        assert_eq!(value["official"], true);
        assert_eq!(value["winners"][0]["deckImagePath"], "");
        assert_eq!(value["decks"][0]["count"], 2);
        assert!(value.get("date").is_none());
        assert!(value.get("notes").is_none());

        let back: EventRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_set_when_re_resolves_date() {
        let mut event = EventRecord::new("E6", "Weekly", "TBA");
        assert_eq!(event.date(), None);

        event.set_when("2025-07-19");
        assert_eq!(event.when(), "2025-07-19");
        assert_eq!(event.date(), Some(date(2025, 7, 19)));
    }
}
