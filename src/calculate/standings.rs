//! Champion standings: who won the most events in a trailing window.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::models::{compare_groups, EventRecord, PlayerStanding, StandingsGroup, YearMonth};

/// Whether `date` lies within `window_months` calendar months of `now`.
///
/// Distance is counted in whole months, ignoring day of month; the
/// comparison is strict, so an event exactly `window_months` back is out.
pub fn within_month_window(date: NaiveDate, now: NaiveDate, window_months: u32) -> bool {
    YearMonth::from_date(now).months_since(YearMonth::from_date(date)) < window_months as i64
}

#[derive(Default)]
struct PlayerTally {
    wins: u32,
    decks: BTreeSet<String>,
}

#[derive(Default)]
struct GroupTally {
    players: HashMap<String, PlayerTally>,
}

/// Rank champions per `(format, official)` group over the last `window_months`.
///
/// Every event in the window opens its group, so groups without any rank-1
/// entry are still returned with an empty player list.
pub fn rank_top_players(
    events: &[EventRecord],
    window_months: u32,
    now: NaiveDate,
) -> Vec<StandingsGroup> {
    let mut groups: HashMap<(String, bool), GroupTally> = HashMap::new();

    for event in events {
        let Some(date) = event.date() else {
            continue;
        };
        if !within_month_window(date, now, window_months) {
            continue;
        }

        let group = groups
            .entry((event.format.clone(), event.official))
            .or_default();

        for champion in event.champions() {
            let player = group.players.entry(champion.name.clone()).or_default();
            player.wins += 1;
            if !champion.deck.is_empty() {
                player.decks.insert(champion.deck.clone());
            }
        }
    }

    let mut standings: Vec<StandingsGroup> = groups
        .into_iter()
        .map(|((format, official), tally)| {
            let mut players: Vec<PlayerStanding> = tally
                .players
                .into_iter()
                .map(|(name, p)| PlayerStanding {
                    name,
                    wins: p.wins,
                    decks: p.decks.into_iter().collect(),
                })
                .collect();
            players.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.name.cmp(&b.name)));

            StandingsGroup {
                format,
                official,
                players,
            }
        })
        .collect();

    standings.sort_by(|a, b| compare_groups((&a.format, a.official), (&b.format, b.official)));
    standings
}
