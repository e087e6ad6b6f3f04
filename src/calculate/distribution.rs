//! Deck distribution by format, official status and calendar month.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::models::{
    compare_groups, DeckCount, DeckSource, DistributionGroup, EventRecord, MonthBucket,
    Participation, YearMonth,
};

/// Trailing window used for champion decks.
pub const CHAMPION_WINDOW_MONTHS: u32 = 6;

/// Deck name recorded for a champion whose deck is unknown.
pub const UNKNOWN_DECK: &str = "?";

/// A deck played, with the player when known.
struct Unit {
    deck: String,
    player: Option<String>,
}

/// Participation units of an event: the deck tally when one was recorded,
/// otherwise one unit per winner. Blank deck names are skipped.
fn participation_units(event: &EventRecord) -> Vec<Unit> {
    match event.deck_source() {
        DeckSource::Tally(decks) => decks
            .iter()
            .filter(|d| !d.name.is_empty())
            .flat_map(|d| {
                (0..d.count).map(|_| Unit {
                    deck: d.name.clone(),
                    player: None,
                })
            })
            .collect(),
        DeckSource::WinnersOnly => event
            .winners
            .iter()
            .filter(|w| !w.deck.is_empty())
            .map(|w| Unit {
                deck: w.deck.clone(),
                player: Some(w.name.clone()),
            })
            .collect(),
    }
}

fn champion_units(event: &EventRecord) -> Vec<Unit> {
    event
        .champions()
        .map(|w| Unit {
            deck: if w.deck.is_empty() {
                UNKNOWN_DECK.to_string()
            } else {
                w.deck.clone()
            },
            player: Some(w.name.clone()),
        })
        .collect()
}

#[derive(Default)]
struct GroupAcc {
    participants: Vec<Participation>,
    by_month: BTreeMap<YearMonth, Vec<Participation>>,
}

/// Count decks, most played first, ties by name.
pub fn count_decks(participants: &[Participation]) -> Vec<DeckCount> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for p in participants {
        *counts.entry(p.deck.as_str()).or_default() += 1;
    }

    let mut decks: Vec<DeckCount> = counts
        .into_iter()
        .map(|(name, count)| DeckCount::new(name, count))
        .collect();
    decks.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    decks
}

fn sort_newest_first(participants: &mut [Participation]) {
    participants.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Bucket units of each of the last `months_back` calendar months.
///
/// Each month is matched exactly by year and month; groups only exist once
/// they receive a unit.
fn distribute<'a, I, F>(
    events: I,
    months_back: u32,
    now: NaiveDate,
    units_of: F,
) -> Vec<DistributionGroup>
where
    I: Iterator<Item = &'a EventRecord> + Clone,
    F: Fn(&EventRecord) -> Vec<Unit>,
{
    let current = YearMonth::from_date(now);
    let mut groups: HashMap<(String, bool), GroupAcc> = HashMap::new();

    for i in 0..months_back {
        let month = current.months_back(i);

        for event in events.clone() {
            let Some(date) = event.date().filter(|d| month.contains(*d)) else {
                continue;
            };

            for unit in units_of(event) {
                let group = groups
                    .entry((event.format.clone(), event.official))
                    .or_default();

                let participation = Participation {
                    deck: unit.deck,
                    player: unit.player,
                    event_id: event.id.clone(),
                    event: event.title.clone(),
                    date,
                    month,
                };
                group
                    .by_month
                    .entry(month)
                    .or_default()
                    .push(participation.clone());
                group.participants.push(participation);
            }
        }
    }

    let mut result: Vec<DistributionGroup> = groups
        .into_iter()
        .map(|((format, official), mut acc)| {
            sort_newest_first(&mut acc.participants);

            let months = acc
                .by_month
                .into_iter()
                .rev()
                .map(|(month, mut participants)| {
                    sort_newest_first(&mut participants);
                    let decks = count_decks(&participants);
                    MonthBucket {
                        month,
                        label: month.label(),
                        participants,
                        decks,
                    }
                })
                .collect();

            DistributionGroup {
                format,
                official,
                participants: acc.participants,
                months,
            }
        })
        .collect();

    result.sort_by(|a, b| compare_groups((&a.format, a.official), (&b.format, b.official)));
    result
}

/// Deck participation over the last `months_back` months, optionally
/// restricted to official events.
pub fn deck_distribution(
    events: &[EventRecord],
    months_back: u32,
    official_only: bool,
    now: NaiveDate,
) -> Vec<DistributionGroup> {
    let filtered = events.iter().filter(|e| !official_only || e.official);
    distribute(filtered, months_back, now, participation_units)
}

/// Champion decks over the last six months.
pub fn champion_deck_distribution(
    events: &[EventRecord],
    now: NaiveDate,
) -> Vec<DistributionGroup> {
    distribute(events.iter(), CHAMPION_WINDOW_MONTHS, now, champion_units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeckTally, Winner};
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn event(id: &str, when: &str, format: &str, official: bool) -> EventRecord {
        EventRecord::new(id, &format!("Event {}", id), when).with_format(format, official)
    }

    fn decks_of(bucket: &MonthBucket) -> Vec<(&str, u32)> {
        bucket.decks.iter().map(|d| (d.name.as_str(), d.count)).collect()
    }

    #[test]
    fn test_tally_takes_precedence_over_winners() {
        let now = date("2026-10-16");
        let events = vec![event("e1", "2026-10-04", "OCG", true)
            .with_winner(Winner::new("Amir", 1, "Yubel"))
            .with_winner(Winner::new("Zara", 2, "Tenpai"))
            .with_decks(vec![DeckTally::new("Kashtira", 3)])];

        let groups = deck_distribution(&events, 1, false, now);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].participants.len(), 3);
        assert!(groups[0].participants.iter().all(|p| p.deck == "Kashtira"));
        assert!(groups[0].participants.iter().all(|p| p.player.is_none()));
    }

    #[test]
    fn test_winners_fallback_skips_blank_decks() {
        let now = date("2026-10-16");
        let events = vec![event("e1", "2026-10-04", "OCG", true)
            .with_winner(Winner::new("Amir", 1, "Yubel"))
            .with_winner(Winner::new("Zara", 2, ""))
            .with_winner(Winner::new("Bea", 3, "Tenpai"))];

        let groups = deck_distribution(&events, 1, false, now);
        let players: Vec<Option<&str>> = groups[0]
            .participants
            .iter()
            .map(|p| p.player.as_deref())
            .collect();

        assert_eq!(players.len(), 2);
        assert!(players.contains(&Some("Amir")));
        assert!(players.contains(&Some("Bea")));
    }

    #[test]
    fn test_blank_tally_names_are_skipped() {
        let now = date("2026-10-16");
        let events = vec![event("e1", "2026-10-04", "OCG", true)
            .with_decks(vec![DeckTally::new("", 4), DeckTally::new("Yubel", 2)])];

        let groups = deck_distribution(&events, 1, false, now);

        assert_eq!(groups[0].participants.len(), 2);
    }

    #[test]
    fn test_months_are_matched_exactly() {
        let now = date("2026-10-16");
        let events = vec![
            event("oct", "2026-10-01", "OCG", true).with_decks(vec![DeckTally::new("Yubel", 1)]),
            event("sep", "2026-09-30", "OCG", true).with_decks(vec![DeckTally::new("Tenpai", 2)]),
            event("aug", "2026-08-15", "OCG", true).with_decks(vec![DeckTally::new("Kashtira", 1)]),
            event("future", "2026-11-02", "OCG", true)
                .with_decks(vec![DeckTally::new("Ryzeal", 1)]),
        ];

        let groups = deck_distribution(&events, 2, false, now);
        let group = &groups[0];

        let months: Vec<YearMonth> = group.months.iter().map(|b| b.month).collect();
        assert_eq!(months, vec![ym("2026-10"), ym("2026-09")]);
        assert_eq!(group.months[0].label, "October 2026");
        assert_eq!(group.months[1].label, "September 2026");
        assert_eq!(group.participants.len(), 3);
        assert!(group.participants.iter().all(|p| p.deck != "Kashtira" && p.deck != "Ryzeal"));
    }

    #[test]
    fn test_months_back_crosses_year_boundary() {
        let now = date("2026-01-10");
        let events = vec![
            event("dec", "2025-12-20", "OCG", true).with_decks(vec![DeckTally::new("Yubel", 1)]),
        ];

        let groups = deck_distribution(&events, 2, false, now);

        assert_eq!(groups[0].months[0].month, ym("2025-12"));
        assert_eq!(groups[0].months[0].label, "December 2025");
    }

    #[test]
    fn test_partitions_sorted_newest_first_and_counted() {
        let now = date("2026-10-16");
        let events = vec![
            event("a", "2026-10-02", "OCG", true)
                .with_decks(vec![DeckTally::new("Yubel", 1), DeckTally::new("Tenpai", 2)]),
            event("b", "2026-10-09", "OCG", true)
                .with_decks(vec![DeckTally::new("Yubel", 1), DeckTally::new("Kashtira", 2)]),
        ];

        let groups = deck_distribution(&events, 1, false, now);
        let bucket = &groups[0].months[0];

        assert_eq!(bucket.participants[0].date, date("2026-10-09"));
        assert_eq!(bucket.participants.last().unwrap().date, date("2026-10-02"));
        assert_eq!(
            decks_of(bucket),
            vec![("Kashtira", 2), ("Tenpai", 2), ("Yubel", 2)]
        );
        assert_eq!(bucket.total(), 6);
        assert_eq!(groups[0].participants[0].date, date("2026-10-09"));
    }

    #[test]
    fn test_official_only_filter() {
        let now = date("2026-10-16");
        let events = vec![
            event("a", "2026-10-02", "OCG", true).with_decks(vec![DeckTally::new("Yubel", 1)]),
            event("b", "2026-10-03", "OCG", false).with_decks(vec![DeckTally::new("Tenpai", 1)]),
        ];

        assert_eq!(deck_distribution(&events, 1, false, now).len(), 2);

        let official = deck_distribution(&events, 1, true, now);
        assert_eq!(official.len(), 1);
        assert!(official[0].official);
    }

    #[test]
    fn test_group_ordering() {
        let now = date("2026-10-16");
        let events = vec![
            event("a", "2026-10-02", "TCG", false).with_decks(vec![DeckTally::new("Yubel", 1)]),
            event("b", "2026-10-03", "OCG", true).with_decks(vec![DeckTally::new("Tenpai", 1)]),
        ];

        let groups = deck_distribution(&events, 1, false, now);

        assert_eq!(groups[0].format, "OCG");
        assert!(groups[0].official);
        assert_eq!(groups[1].format, "TCG");
    }

    #[test]
    fn test_event_without_units_opens_no_group() {
        let now = date("2026-10-16");
        let events = vec![event("a", "2026-10-02", "OCG", true)];

        assert!(deck_distribution(&events, 1, false, now).is_empty());
    }

    #[test]
    fn test_champion_distribution_uses_rank_one_only() {
        let now = date("2026-10-16");
        let events = vec![
            event("a", "2026-10-02", "OCG", true)
                .with_winner(Winner::new("Amir", 1, "Yubel"))
                .with_winner(Winner::new("Zara", 2, "Tenpai"))
                .with_decks(vec![DeckTally::new("Kashtira", 5)]),
            event("b", "2026-09-02", "OCG", true).with_winner(Winner::new("Zara", 1, "")),
        ];

        let groups = champion_deck_distribution(&events, now);
        let group = &groups[0];

        assert_eq!(group.participants.len(), 2);
        assert_eq!(group.participants[0].deck, "Yubel");
        assert_eq!(group.participants[0].player.as_deref(), Some("Amir"));
        assert_eq!(group.participants[1].deck, UNKNOWN_DECK);
        assert_eq!(group.months.len(), 2);
    }

    #[test]
    fn test_champion_distribution_six_month_window() {
        let now = date("2026-10-16");
        let events = vec![
            event("in", "2026-05-01", "OCG", true).with_winner(Winner::new("Amir", 1, "Yubel")),
            event("out", "2026-04-30", "OCG", true).with_winner(Winner::new("Zara", 1, "Tenpai")),
        ];

        let groups = champion_deck_distribution(&events, now);

        assert_eq!(groups[0].participants.len(), 1);
        assert_eq!(groups[0].participants[0].player.as_deref(), Some("Amir"));
        assert!(groups[0].month(ym("2026-05")).is_some());
    }

    #[test]
    fn test_empty_inputs() {
        let now = date("2026-10-16");
        assert!(deck_distribution(&[], 6, false, now).is_empty());
        assert!(champion_deck_distribution(&[], now).is_empty());

        let events = vec![
            event("a", "2026-10-02", "OCG", true).with_decks(vec![DeckTally::new("Yubel", 1)]),
        ];
        assert!(deck_distribution(&events, 0, false, now).is_empty());
    }
}
