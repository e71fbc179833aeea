#![allow(dead_code)]

use myschedule::AppConfig;
use std::path::Path;
use tempfile::TempDir;

pub const COURSES: &str = r#"[
  {"course_id": "FS261059", "title": "Corporate Finance", "semester": "FS26", "type": "Vorlesung",
   "instructors": ["Prof. Dr. Anna Muster / Executive MBA", "Dr. Ben Beispiel"],
   "department": null, "study_level": "Master", "source_url": "https://example.org/?code=FS261059"},
  {"course_id": "fs261110", "title": "Public Economics", "semester": "FS26", "type": "Seminar",
   "instructors": ["Prof. Carla Test"]},
  {"course_id": "FS261107", "title": "Econometrics", "instructors": []},
  {"course_id": "FS261200", "title": "Financial Accounting", "instructors": ["Dr. Dora"]}
]"#;

pub const EVENTS: &str = r#"[
  {"event_id": "FS261059__2026-02-19T1000", "course_id": "FS261059", "title": "Corporate Finance",
   "kind": "lecture", "date": "2026-02-19", "start": "10:00", "end": "11:00", "location": "HS 1"},
  {"event_id": "FS261059__2026-02-26T1000", "course_id": "FS261059", "title": "Corporate Finance",
   "kind": "lecture", "date": "2026-02-26", "start": "10:00", "end": "11:00", "location": "HS 1"},
  {"event_id": "FS261110__2026-02-19T1030", "course_id": "FS261110", "title": "Public Economics",
   "kind": "lecture", "date": "2026-02-19", "start": "10:30", "end": "12:00", "location": "HS 8"},
  {"event_id": "FS261107__2026-02-19T1100", "course_id": "FS261107", "title": "Econometrics",
   "kind": "lecture", "date": "2026-02-19", "start": "11:00", "end": "12:00"},
  {"event_id": "FS261200__2026-02-20T0800", "course_id": "FS261200", "title": "Financial Accounting",
   "kind": "exam", "date": "2026-02-20", "start": "08:00", "end": "10:00", "note": "Open book"},
  {"course_id": "FS261200", "title": "Financial Accounting", "kind": "lecture",
   "date": "not a date", "start": "08:00", "end": "10:00"}
]"#;

pub fn write_catalog(dir: &Path) {
    std::fs::write(dir.join("courses.json"), COURSES).unwrap();
    std::fs::write(dir.join("events.json"), EVENTS).unwrap();
}

/// Config pointing at a fresh temp data directory with the fixture catalog.
pub fn fixture() -> (TempDir, AppConfig) {
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path());
    let mut config = AppConfig::default();
    config.data.dir = dir.path().to_string_lossy().into_owned();
    (dir, config)
}
