use crate::domain::model::{CatalogMetadata, Course, Event};
use crate::domain::ports::{CatalogSource, Storage};
use crate::utils::error::Result;
use serde::de::DeserializeOwned;

pub const COURSES_FILE: &str = "courses.json";
pub const EVENTS_FILE: &str = "events.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Reads `courses.json`, `events.json` and `metadata.json` from a storage root.
///
/// A missing or broken file reads as an empty list, and a single malformed
/// record is skipped without affecting the others.
#[derive(Debug, Clone)]
pub struct JsonCatalogSource<S: Storage> {
    storage: S,
    courses_file: String,
    events_file: String,
    metadata_file: String,
}

impl<S: Storage> JsonCatalogSource<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            courses_file: COURSES_FILE.to_string(),
            events_file: EVENTS_FILE.to_string(),
            metadata_file: METADATA_FILE.to_string(),
        }
    }

    pub fn with_file_names(
        mut self,
        courses_file: impl Into<String>,
        events_file: impl Into<String>,
        metadata_file: impl Into<String>,
    ) -> Self {
        self.courses_file = courses_file.into();
        self.events_file = events_file.into();
        self.metadata_file = metadata_file.into();
        self
    }

    pub fn write_metadata(&self, metadata: &CatalogMetadata) -> Result<()> {
        let data = serde_json::to_vec_pretty(metadata)?;
        self.storage.write_file(&self.metadata_file, &data)
    }

    /// Number of records in each catalog file, as written by the parser.
    pub fn record_counts(&self) -> (usize, usize) {
        (
            self.read_array(&self.courses_file).len(),
            self.read_array(&self.events_file).len(),
        )
    }

    fn read_array(&self, file: &str) -> Vec<serde_json::Value> {
        if !self.storage.exists(file) {
            tracing::debug!("{} does not exist yet", file);
            return Vec::new();
        }
        let parsed = self
            .storage
            .read_file(file)
            .and_then(|bytes| Ok(serde_json::from_slice::<serde_json::Value>(&bytes)?));
        match parsed {
            Ok(serde_json::Value::Array(items)) => items,
            Ok(_) => {
                tracing::warn!("{} is not a JSON array, ignoring it", file);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Could not load {}: {}", file, e);
                Vec::new()
            }
        }
    }

    fn read_records<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
        let items = self.read_array(file);
        let total = items.len();
        let records: Vec<T> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::debug!("Skipping malformed record in {}: {}", file, e);
                    None
                }
            })
            .collect();
        if records.len() < total {
            tracing::warn!("Skipped {} malformed record(s) in {}", total - records.len(), file);
        }
        records
    }
}

impl<S: Storage> CatalogSource for JsonCatalogSource<S> {
    fn has_data(&self) -> bool {
        self.storage.exists(&self.courses_file) && self.storage.exists(&self.events_file)
    }

    fn load_courses(&self) -> Vec<Course> {
        self.read_records(&self.courses_file)
    }

    fn load_events(&self) -> Vec<Event> {
        self.read_records(&self.events_file)
    }

    fn read_metadata(&self) -> Option<CatalogMetadata> {
        let bytes = self.storage.read_file(&self.metadata_file).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::domain::model::EventKind;

    #[test]
    fn test_missing_files_read_empty() {
        let source = JsonCatalogSource::new(MemoryStorage::new());
        assert!(!source.has_data());
        assert!(source.load_courses().is_empty());
        assert!(source.load_events().is_empty());
        assert!(source.read_metadata().is_none());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let storage = MemoryStorage::new();
        storage.put_file(
            COURSES_FILE,
            br#"[
                {"course_id": "FS261110", "title": "Public Economics", "semester": "FS26",
                 "type": "Vorlesung", "instructors": ["Prof. A"], "department": null,
                 "study_level": "Master", "source_url": "https://example.org/details?code=FS261110"},
                {"course_id": "FS261111", "instructors": "not a list"},
                "garbage",
                {"course_id": null, "title": null}
            ]"#,
        );
        storage.put_file(
            EVENTS_FILE,
            br#"[
                {"event_id": "FS261110__2026-02-19T1015", "course_id": "FS261110",
                 "title": "Public Economics", "kind": "lecture", "date": "2026-02-19",
                 "start": "10:15", "end": "12:00", "location": "HS 8", "note": null},
                {"course_id": "FS261110", "kind": "exam", "date": "2026-03-20",
                 "start": "09:15", "end": "11:15", "note": "Pruefung"}
            ]"#,
        );
        let source = JsonCatalogSource::new(storage);

        let courses = source.load_courses();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].course_type.as_deref(), Some("Vorlesung"));
        assert_eq!(courses[1].course_id, "");

        let events = source.load_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, EventKind::Exam);
        assert_eq!(events[1].location, None);
        assert_eq!(events[1].note.as_deref(), Some("Pruefung"));
        assert!(source.has_data());
    }

    #[test]
    fn test_non_array_file_reads_empty() {
        let storage = MemoryStorage::new();
        storage.put_file(COURSES_FILE, br#"{"courses": []}"#);
        storage.put_file(EVENTS_FILE, b"not json at all");
        let source = JsonCatalogSource::new(storage);
        assert!(source.load_courses().is_empty());
        assert!(source.load_events().is_empty());
    }

    #[test]
    fn test_metadata_round_trip() {
        let source = JsonCatalogSource::new(MemoryStorage::new());
        let metadata = CatalogMetadata {
            last_scraped: "2026-02-01T10:00:00".into(),
            semester: "FS26".into(),
            courses: 12,
            events: 140,
        };
        source.write_metadata(&metadata).unwrap();
        assert_eq!(source.read_metadata(), Some(metadata));
    }
}
