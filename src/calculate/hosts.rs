//! Host-by-week event summary.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{EventRecord, FormatCounts, Week, WeekColumn, WeekTable};

/// Count events per `(week, host, format)`, split by official status.
///
/// Weeks run Monday to Sunday and are ordered by their start date, most
/// recent first. Hosts include every host in the input, even those whose
/// events have no usable date.
pub fn host_weekly_extract(events: &[EventRecord]) -> WeekTable {
    let mut weeks: BTreeMap<Week, BTreeMap<String, FormatCounts>> = BTreeMap::new();
    let mut hosts: BTreeSet<String> = BTreeSet::new();

    for event in events {
        hosts.insert(event.host.clone());

        let Some(week) = event.date().and_then(Week::containing) else {
            continue;
        };

        weeks
            .entry(week)
            .or_default()
            .entry(event.host.clone())
            .or_default()
            .entry(event.format.clone())
            .or_default()
            .record(event.official);
    }

    WeekTable {
        weeks: weeks
            .into_iter()
            .rev()
            .map(|(week, by_host)| WeekColumn {
                label: week.label(),
                week,
                hosts: by_host,
            })
            .collect(),
        hosts: hosts.into_iter().collect(),
    }
}
