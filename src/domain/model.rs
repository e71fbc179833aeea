use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// Upstream JSON writes `null` where a value is unknown.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trims and upper-cases a course identifier. Returns `None` when nothing is left.
pub fn normalize_course_id(raw: &str) -> Option<String> {
    let id = raw.trim().to_uppercase();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Course {
    #[serde(deserialize_with = "null_as_default")]
    pub course_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    pub semester: Option<String>,
    #[serde(rename = "type")]
    pub course_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub instructors: Vec<String>,
    pub department: Option<String>,
    pub study_level: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub source_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Lecture,
    Exam,
    #[serde(other)]
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Lecture => "lecture",
            EventKind::Exam => "exam",
            EventKind::Other => "other",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete, dated course occurrence.
///
/// `date`, `start` and `end` keep the raw strings from the catalog files
/// (`YYYY-MM-DD` and `HH:MM`). Malformed values are tolerated here and
/// filtered out by the conflict engine and the date-based views.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    #[serde(deserialize_with = "null_as_default")]
    pub event_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub course_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub kind: EventKind,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub start: String,
    #[serde(deserialize_with = "null_as_default")]
    pub end: String,
    pub location: Option<String>,
    pub note: Option<String>,
}

impl Event {
    /// Identifier derived from course, date and start time, e.g. `FS261110__2026-02-19T1015`.
    pub fn derived_id(&self) -> String {
        format!(
            "{}__{}T{}",
            self.course_id,
            self.date.trim(),
            self.start.trim().replace(':', "")
        )
    }

    /// Sort key used for chronological display.
    pub fn chrono_key(&self) -> (&str, &str) {
        (self.date.trim(), self.start.trim())
    }

    /// Identity used to mark conflicting events in agenda and timetable output.
    pub fn conflict_key(&self) -> EventKey {
        EventKey {
            date: self.date.trim().to_string(),
            start: self.start.trim().to_string(),
            end: self.end.trim().to_string(),
            course_id: self.course_id.clone(),
        }
    }

    /// De-duplication key for calendar export.
    pub fn export_key(&self) -> String {
        let id = self.event_id.trim();
        if id.is_empty() {
            format!(
                "{}|{}|{}|{}",
                self.course_id,
                self.date.trim(),
                self.start.trim(),
                self.end.trim()
            )
        } else {
            id.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub date: String,
    pub start: String,
    pub end: String,
    pub course_id: String,
}

/// Two overlapping events, `first` being the one encountered earlier in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictPair<'a> {
    pub first: &'a Event,
    pub second: &'a Event,
}

impl<'a> ConflictPair<'a> {
    pub fn new(first: &'a Event, second: &'a Event) -> Self {
        Self { first, second }
    }

    pub fn swapped(self) -> Self {
        Self {
            first: self.second,
            second: self.first,
        }
    }

    /// Unordered course pair, smaller id first.
    pub fn course_pair(&self) -> (String, String) {
        let a = self.first.course_id.clone();
        let b = self.second.course_id.clone();
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// The user's chosen course identifiers. Every id is normalized on insert.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the id was not yet selected. Empty ids are ignored.
    pub fn insert(&mut self, raw: &str) -> bool {
        match normalize_course_id(raw) {
            Some(id) => self.ids.insert(id),
            None => false,
        }
    }

    pub fn remove(&mut self, raw: &str) -> bool {
        match normalize_course_id(raw) {
            Some(id) => self.ids.remove(&id),
            None => false,
        }
    }

    pub fn contains(&self, raw: &str) -> bool {
        normalize_course_id(raw).is_some_and(|id| self.ids.contains(&id))
    }

    /// Sorted iteration over the normalized ids.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_sorted_vec(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SelectionSet::new();
        for raw in iter {
            set.insert(raw.as_ref());
        }
        set
    }
}

/// Persisted shape of the selection file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionRecord {
    #[serde(default)]
    pub selected_course_ids: Vec<String>,
}

/// Summary written after each successful catalog refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogMetadata {
    pub last_scraped: String,
    pub semester: String,
    pub courses: usize,
    pub events: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success { courses: usize, events: usize },
    Failed { reason: String },
    Cancelled,
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshOutcome::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_course_id() {
        assert_eq!(normalize_course_id(" fs261059 "), Some("FS261059".to_string()));
        assert_eq!(normalize_course_id("   "), None);
    }

    #[test]
    fn test_selection_set_normalizes_and_deduplicates() {
        let mut set: SelectionSet = ["fs261059", " FS261110 ", "FS261059", ""].into_iter().collect();
        assert_eq!(set.to_sorted_vec(), vec!["FS261059", "FS261110"]);

        assert!(!set.insert("Fs261059"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(" fs261110"));
        assert!(set.remove("fs261110"));
        assert!(!set.remove("fs261110"));
    }

    #[test]
    fn test_event_kind_unknown_maps_to_other() {
        let ev: Event = serde_json::from_value(serde_json::json!({
            "course_id": "A",
            "kind": "seminar"
        }))
        .unwrap();
        assert_eq!(ev.kind, EventKind::Other);
        assert_eq!(ev.location, None);
    }

    #[test]
    fn test_event_keys() {
        let ev = Event {
            course_id: "FS261110".to_string(),
            date: "2026-02-19".to_string(),
            start: "10:15".to_string(),
            end: "12:00".to_string(),
            ..Default::default()
        };
        assert_eq!(ev.derived_id(), "FS261110__2026-02-19T1015");
        assert_eq!(ev.export_key(), "FS261110|2026-02-19|10:15|12:00");
    }
}
