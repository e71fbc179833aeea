use crate::core::catalog::Catalog;
use crate::core::conflicts::{find_conflicts, sort_for_display};
use crate::domain::model::{ConflictPair, Course, Event, EventKey, SelectionSet};
use crate::utils::error::{Result, ScheduleError};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Weekdays shown in the timetable grid.
pub const TIMETABLE_DAYS: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn parse_event_date(event: &Event) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(event.date.trim(), "%Y-%m-%d").ok()
}

/// ISO calendar week, Monday to Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn monday(&self) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon).unwrap_or_default()
    }

    pub fn sunday(&self) -> NaiveDate {
        self.monday() + Duration::days(6)
    }

    /// `2026-W08 (2026-02-16 → 2026-02-22)`
    pub fn range_label(&self) -> String {
        format!("{} ({} → {})", self, self.monday(), self.sunday())
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

pub fn weekday_short(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Events of every selected course, sorted by `(date, start)`.
pub fn selected_events<'a>(catalog: &'a Catalog, selection: &SelectionSet) -> Vec<&'a Event> {
    let mut events: Vec<&'a Event> = selection
        .iter()
        .flat_map(|cid| catalog.events_for(cid))
        .collect();
    events.sort_by(|a, b| a.chrono_key().cmp(&b.chrono_key()));
    events
}

/// Identities of every event that takes part in at least one of `pairs`.
pub fn conflict_keys(pairs: &[ConflictPair<'_>]) -> HashSet<EventKey> {
    pairs
        .iter()
        .flat_map(|p| [p.first.conflict_key(), p.second.conflict_key()])
        .collect()
}

#[derive(Debug, Clone)]
pub struct AgendaDay<'a> {
    pub date: NaiveDate,
    pub events: Vec<&'a Event>,
}

#[derive(Debug, Clone)]
pub struct AgendaWeek<'a> {
    pub key: WeekKey,
    pub days: Vec<AgendaDay<'a>>,
}

#[derive(Debug, Clone, Default)]
pub struct Agenda<'a> {
    pub weeks: Vec<AgendaWeek<'a>>,
    pub conflicting: HashSet<EventKey>,
}

impl<'a> Agenda<'a> {
    pub fn is_conflicting(&self, event: &Event) -> bool {
        self.conflicting.contains(&event.conflict_key())
    }

    pub fn event_count(&self) -> usize {
        self.weeks
            .iter()
            .flat_map(|w| &w.days)
            .map(|d| d.events.len())
            .sum()
    }

    /// Weeks `[page * per_page, (page + 1) * per_page)`.
    pub fn page(&self, page: usize, per_page: usize) -> &[AgendaWeek<'a>] {
        let per_page = per_page.max(1);
        let start = (page * per_page).min(self.weeks.len());
        let end = (start + per_page).min(self.weeks.len());
        &self.weeks[start..end]
    }

    pub fn page_count(&self, per_page: usize) -> usize {
        self.weeks.len().div_ceil(per_page.max(1))
    }
}

/// Groups events by ISO week and date. Events without a parseable date are dropped.
pub fn build_agenda<'a>(events: &[&'a Event]) -> Agenda<'a> {
    let pairs = find_conflicts(events.iter().copied());

    let mut by_date: BTreeMap<NaiveDate, Vec<&'a Event>> = BTreeMap::new();
    for event in events.iter().copied() {
        if let Some(date) = parse_event_date(event) {
            by_date.entry(date).or_default().push(event);
        }
    }

    let mut weeks: Vec<AgendaWeek<'a>> = Vec::new();
    for (date, mut day_events) in by_date {
        day_events.sort_by(|a, b| a.start.trim().cmp(b.start.trim()));
        let key = WeekKey::of(date);
        let day = AgendaDay {
            date,
            events: day_events,
        };
        match weeks.last_mut() {
            Some(week) if week.key == key => week.days.push(day),
            _ => weeks.push(AgendaWeek {
                key,
                days: vec![day],
            }),
        }
    }

    Agenda {
        weeks,
        conflicting: conflict_keys(&pairs),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekSummary {
    pub key: WeekKey,
    pub event_count: usize,
    pub conflict_count: usize,
}

/// Every ISO week that has at least one dated event, with its conflict count.
pub fn available_weeks(events: &[&Event]) -> Vec<WeekSummary> {
    let mut by_week: BTreeMap<WeekKey, Vec<&Event>> = BTreeMap::new();
    for event in events.iter().copied() {
        if let Some(date) = parse_event_date(event) {
            by_week.entry(WeekKey::of(date)).or_default().push(event);
        }
    }

    by_week
        .into_iter()
        .map(|(key, week_events)| WeekSummary {
            key,
            event_count: week_events.len(),
            conflict_count: find_conflicts(week_events).len(),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct WeeklyTimetable<'a> {
    pub key: WeekKey,
    /// One bucket per entry of [`TIMETABLE_DAYS`], chronological inside each bucket.
    pub columns: Vec<(Weekday, Vec<&'a Event>)>,
    pub conflicts: Vec<ConflictPair<'a>>,
    pub conflicting: HashSet<EventKey>,
}

impl<'a> WeeklyTimetable<'a> {
    pub fn is_conflicting(&self, event: &Event) -> bool {
        self.conflicting.contains(&event.conflict_key())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|(_, events)| events.is_empty())
    }
}

/// Events of one ISO week bucketed Monday to Saturday.
///
/// Conflicts are computed over the whole week, Sunday included, even though
/// Sunday has no column.
pub fn weekly_timetable<'a>(events: &[&'a Event], key: WeekKey) -> WeeklyTimetable<'a> {
    let mut week_events: Vec<(NaiveDate, &'a Event)> = events
        .iter()
        .copied()
        .filter_map(|e| parse_event_date(e).map(|d| (d, e)))
        .filter(|(d, _)| WeekKey::of(*d) == key)
        .collect();
    week_events.sort_by(|(_, a), (_, b)| a.chrono_key().cmp(&b.chrono_key()));

    let conflicts = find_conflicts(week_events.iter().map(|(_, e)| *e));
    let conflicting = conflict_keys(&conflicts);

    let columns = TIMETABLE_DAYS
        .iter()
        .map(|day| {
            let bucket = week_events
                .iter()
                .filter(|(d, _)| d.weekday() == *day)
                .map(|(_, e)| *e)
                .collect();
            (*day, bucket)
        })
        .collect();

    WeeklyTimetable {
        key,
        columns,
        conflicts,
        conflicting,
    }
}

#[derive(Debug, Clone)]
pub struct CoursePairConflicts<'a> {
    pub courses: (String, String),
    pub pairs: Vec<ConflictPair<'a>>,
}

#[derive(Debug, Clone, Default)]
pub struct ConflictReport<'a> {
    pub total: usize,
    /// Every pair, sorted by date and start of its first event.
    pub all: Vec<ConflictPair<'a>>,
    pub by_course_pair: Vec<CoursePairConflicts<'a>>,
    pub involved_courses: usize,
}

/// Groups conflicts by unordered course pair, most conflicts first.
pub fn group_conflicts<'a>(mut pairs: Vec<ConflictPair<'a>>) -> ConflictReport<'a> {
    sort_for_display(&mut pairs);

    let mut grouped: HashMap<(String, String), Vec<ConflictPair<'a>>> = HashMap::new();
    let mut involved: HashSet<&str> = HashSet::new();
    for pair in &pairs {
        if pair.first.course_id.is_empty() || pair.second.course_id.is_empty() {
            continue;
        }
        involved.insert(&pair.first.course_id);
        involved.insert(&pair.second.course_id);
        grouped.entry(pair.course_pair()).or_default().push(*pair);
    }
    let involved_courses = involved.len();

    let mut by_course_pair: Vec<CoursePairConflicts<'a>> = grouped
        .into_iter()
        .map(|(courses, pairs)| CoursePairConflicts { courses, pairs })
        .collect();
    by_course_pair.sort_by(|a, b| {
        b.pairs
            .len()
            .cmp(&a.pairs.len())
            .then_with(|| a.courses.cmp(&b.courses))
    });

    ConflictReport {
        total: pairs.len(),
        all: pairs,
        by_course_pair,
        involved_courses,
    }
}

#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    pub matches: Vec<&'a Course>,
    /// Number of matches before the limit was applied.
    pub total: usize,
}

/// Case-insensitive substring search over course id, title and instructors.
pub fn search_courses<'a>(catalog: &'a Catalog, query: &str, limit: usize) -> Result<SearchResults<'a>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Err(ScheduleError::invalid_input("Please provide a search text."));
    }

    let all: Vec<&'a Course> = catalog
        .courses()
        .iter()
        .filter(|c| {
            let haystack = format!("{} {} {}", c.course_id, c.title, c.instructors.join(" "));
            haystack.to_lowercase().contains(&needle)
        })
        .collect();

    let total = all.len();
    Ok(SearchResults {
        matches: all.into_iter().take(limit).collect(),
        total,
    })
}

/// Selected events de-duplicated by event id, or by course/date/start/end when the id is empty.
pub fn export_events<'a>(events: &[&'a Event]) -> Vec<&'a Event> {
    let mut seen = HashSet::new();
    events
        .iter()
        .copied()
        .filter(|e| seen.insert(e.export_key()))
        .collect()
}
