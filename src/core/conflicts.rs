//! Time-overlap detection between dated events.
//!
//! Two events conflict when they share a date and their half-open intervals
//! `[start, end)` overlap: `start_a < end_b && end_a > start_b`. An event that
//! ends exactly when another starts is not a conflict.
//!
//! Events with an empty date, an unparseable `HH:MM` time or `end <= start`
//! are left out silently; scraped catalogs contain such rows and they must not
//! break the rest of the schedule.

use crate::core::catalog::Catalog;
use crate::domain::model::{ConflictPair, Event, SelectionSet};
use std::collections::HashMap;

/// Minutes since midnight, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: u32,
    pub end: u32,
}

impl TimeSpan {
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// Parses `HH:MM` (hours 0-23, minutes 0-59) into minutes since midnight.
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (h, m) = value.trim().split_once(':')?;
    let (h, m) = (h.trim(), m.trim());
    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !is_number(h) || !is_number(m) {
        return None;
    }
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Date and time span of an event, or `None` if it cannot take part in conflict detection.
pub fn usable_span(event: &Event) -> Option<(&str, TimeSpan)> {
    let date = event.date.trim();
    if date.is_empty() {
        return None;
    }
    let start = parse_hhmm(&event.start)?;
    let end = parse_hhmm(&event.end)?;
    if end <= start {
        return None;
    }
    Some((date, TimeSpan { start, end }))
}

/// Finds every overlapping pair once, ordered by the input position of both events.
///
/// Usable events are bucketed per date and swept in start order, so the cost
/// is `O(n log n + k)` for `k` conflicts. The result matches the naive
/// all-pairs scan, including its order.
pub fn find_conflicts<'a, I>(events: I) -> Vec<ConflictPair<'a>>
where
    I: IntoIterator<Item = &'a Event>,
{
    let events: Vec<&'a Event> = events.into_iter().collect();

    let mut by_date: HashMap<&'a str, Vec<(usize, TimeSpan)>> = HashMap::new();
    for (idx, event) in events.iter().copied().enumerate() {
        if let Some((date, span)) = usable_span(event) {
            by_date.entry(date).or_default().push((idx, span));
        }
    }

    let mut found: Vec<(usize, usize)> = Vec::new();
    for slots in by_date.values_mut() {
        slots.sort_by_key(|(idx, span)| (span.start, *idx));
        for (i, (idx_a, span_a)) in slots.iter().enumerate() {
            for (idx_b, span_b) in &slots[i + 1..] {
                if span_b.start >= span_a.end {
                    break;
                }
                found.push(((*idx_a).min(*idx_b), (*idx_a).max(*idx_b)));
            }
        }
    }

    found.sort_unstable();
    found
        .into_iter()
        .map(|(a, b)| ConflictPair::new(events[a], events[b]))
        .collect()
}

/// Conflicts that adding `candidate_id` would introduce against the current selection.
///
/// Every returned pair is oriented `(candidate event, selected event)`. Overlaps
/// among already selected courses and overlaps inside the candidate itself are
/// not part of this view.
pub fn preview_add<'a>(
    catalog: &'a Catalog,
    selection: &SelectionSet,
    candidate_id: &str,
) -> Vec<ConflictPair<'a>> {
    let candidate_events = catalog.events_for(candidate_id);
    let Some(candidate) = candidate_events.first().map(|e| e.course_id.as_str()) else {
        return Vec::new();
    };

    let selected: Vec<&'a Event> = selection
        .iter()
        .filter(|cid| *cid != candidate)
        .flat_map(|cid| catalog.events_for(cid))
        .collect();
    if selected.is_empty() {
        return Vec::new();
    }

    find_conflicts(selected.into_iter().chain(candidate_events))
        .into_iter()
        .filter_map(|pair| {
            let a_is_candidate = pair.first.course_id == candidate;
            let b_is_candidate = pair.second.course_id == candidate;
            match (a_is_candidate, b_is_candidate) {
                (true, false) => Some(pair),
                (false, true) => Some(pair.swapped()),
                _ => None,
            }
        })
        .collect()
}

/// Sorts pairs by the date and start time of their first event.
pub fn sort_for_display(pairs: &mut [ConflictPair<'_>]) {
    pairs.sort_by(|a, b| a.first.chrono_key().cmp(&b.first.chrono_key()));
}
