//! Derived statistics models.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{EventId, Week, YearMonth};

/// Order `(format, official)` groups: official first, then format ascending.
pub fn compare_groups(a: (&str, bool), b: (&str, bool)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// A player's championship record within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub name: String,

    /// Number of rank-1 finishes
    pub wins: u32,

    /// Distinct decks used across those wins, sorted
    pub decks: Vec<String>,
}

/// Champion standings for one `(format, official)` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsGroup {
    pub format: String,
    pub official: bool,
    pub players: Vec<PlayerStanding>,
}

/// One deck played by one participant at one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub deck: String,

    /// Known only when the unit comes from a winners list
    pub player: Option<String>,

    pub event_id: EventId,

    /// Source event title
    pub event: String,

    pub date: NaiveDate,

    /// Month the unit was bucketed under
    pub month: YearMonth,
}

/// Occurrences of a deck within a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCount {
    pub name: String,
    pub count: u32,
}

impl DeckCount {
    pub fn new(name: &str, count: u32) -> Self {
        Self {
            name: name.to_string(),
            count,
        }
    }
}

/// Units of one calendar month within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    pub month: YearMonth,

    /// e.g. "October 2026"
    pub label: String,

    /// Sorted by date, newest first
    pub participants: Vec<Participation>,

    /// Sorted by count descending, then name ascending
    pub decks: Vec<DeckCount>,
}

impl MonthBucket {
    pub fn total(&self) -> u32 {
        self.decks.iter().map(|d| d.count).sum()
    }
}

/// Deck distribution for one `(format, official)` group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionGroup {
    pub format: String,
    pub official: bool,

    /// Every unit in the group, newest first
    pub participants: Vec<Participation>,

    /// Per-month partitions, most recent month first
    pub months: Vec<MonthBucket>,
}

impl DistributionGroup {
    /// Find the partition for a month.
    pub fn month(&self, month: YearMonth) -> Option<&MonthBucket> {
        self.months.iter().find(|b| b.month == month)
    }
}

/// Official and unofficial event counts in one table cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialSplit {
    pub official: u32,
    pub unofficial: u32,
}

impl OfficialSplit {
    pub fn record(&mut self, official: bool) {
        if official {
            self.official += 1;
        } else {
            self.unofficial += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.official + self.unofficial
    }
}

/// Formats run by one host in one week.
pub type FormatCounts = BTreeMap<String, OfficialSplit>;

/// One week column of the host/week table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekColumn {
    pub week: Week,
    pub label: String,

    /// host -> format -> counts
    pub hosts: BTreeMap<String, FormatCounts>,
}

/// Host-by-week summary of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTable {
    /// Ordered by week start, most recent first
    pub weeks: Vec<WeekColumn>,

    /// Every host seen in the input, sorted
    pub hosts: Vec<String>,
}

impl WeekTable {
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty() && self.hosts.is_empty()
    }

    /// Weeks oldest first.
    pub fn chronological(&self) -> impl Iterator<Item = &WeekColumn> {
        self.weeks.iter().rev()
    }

    /// Counts for a host in the week starting on `week_start`.
    pub fn cell(&self, week_start: NaiveDate, host: &str) -> Option<&FormatCounts> {
        self.weeks
            .iter()
            .find(|w| w.week.start == week_start)
            .and_then(|w| w.hosts.get(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_groups_official_first() {
        assert_eq!(compare_groups(("TCG", true), ("OCG", false)), Ordering::Less);
        assert_eq!(
            compare_groups(("OCG", false), ("TCG", true)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_groups_format_case_sensitive() {
        assert_eq!(compare_groups(("AE", true), ("OCG", true)), Ordering::Less);
        // Uppercase sorts before lowercase
        assert_eq!(compare_groups(("Zed", true), ("abc", true)), Ordering::Less);
    }

    #[test]
    fn test_official_split_record() {
        let mut split = OfficialSplit::default();
        split.record(true);
        split.record(false);
        split.record(false);
        assert_eq!(split.official, 1);
        assert_eq!(split.unofficial, 2);
        assert_eq!(split.total(), 3);
    }

    #[test]
    fn test_week_table_default_is_empty() {
        let table = WeekTable::default();
        assert!(table.is_empty());
        assert_eq!(table.chronological().count(), 0);
    }
}
