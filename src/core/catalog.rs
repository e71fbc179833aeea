use crate::domain::model::{normalize_course_id, Course, Event};
use std::collections::HashMap;

/// Read-only snapshot of the course catalog with its lookup indexes.
///
/// Identifiers are normalized once here, so every read site can compare
/// `course_id` values directly. A refreshed catalog is built as a new value
/// and swapped in by the owner; the indexes are never patched in place.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    course_by_id: HashMap<String, usize>,
    events_by_course_id: HashMap<String, Vec<Event>>,
    event_count: usize,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(courses: Vec<Course>, events: Vec<Event>) -> Self {
        let mut catalog = Catalog::empty();

        for mut course in courses {
            let Some(cid) = normalize_course_id(&course.course_id) else {
                tracing::debug!("Dropping course without course_id: {:?}", course.title);
                continue;
            };
            course.course_id = cid.clone();

            // later duplicates replace the earlier record but keep its position
            match catalog.course_by_id.get(&cid) {
                Some(&idx) => catalog.courses[idx] = course,
                None => {
                    catalog.course_by_id.insert(cid, catalog.courses.len());
                    catalog.courses.push(course);
                }
            }
        }

        for mut event in events {
            let Some(cid) = normalize_course_id(&event.course_id) else {
                tracing::debug!("Dropping event without course_id: {:?}", event.title);
                continue;
            };
            event.course_id = cid.clone();
            if event.event_id.trim().is_empty() {
                event.event_id = event.derived_id();
            }
            catalog.events_by_course_id.entry(cid).or_default().push(event);
            catalog.event_count += 1;
        }

        tracing::debug!(
            "Catalog built: {} courses, {} events",
            catalog.courses.len(),
            catalog.event_count
        );
        catalog
    }

    /// Courses in first-seen order, one per identifier.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        let cid = normalize_course_id(course_id)?;
        self.course_by_id.get(&cid).map(|&idx| &self.courses[idx])
    }

    pub fn contains_course(&self, course_id: &str) -> bool {
        self.course(course_id).is_some()
    }

    /// Events of one course in load order. Unknown courses yield an empty slice.
    pub fn events_for(&self, course_id: &str) -> &[Event] {
        normalize_course_id(course_id)
            .and_then(|cid| self.events_by_course_id.get(&cid))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty() && self.event_count == 0
    }
}
