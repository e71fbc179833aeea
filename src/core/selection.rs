use crate::domain::model::{normalize_course_id, SelectionRecord, SelectionSet};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, ScheduleError};

pub const DEFAULT_SELECTION_FILE: &str = "selected_courses.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Added,
    AlreadySelected,
    Removed,
    NotSelected,
}

/// Persists the selection as `{"selected_course_ids": [...]}`.
///
/// Nothing is cached between calls: every mutation reads the file, applies the
/// change and writes it back.
#[derive(Debug, Clone)]
pub struct SelectionStore<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> SelectionStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_file_name(storage, DEFAULT_SELECTION_FILE)
    }

    pub fn with_file_name(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Missing or unreadable files yield an empty selection.
    pub fn load(&self) -> SelectionSet {
        if !self.storage.exists(&self.file_name) {
            return SelectionSet::new();
        }

        let bytes = match self.storage.read_file(&self.file_name) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Could not read {}: {}", self.file_name, e);
                return SelectionSet::new();
            }
        };

        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring corrupt selection file {}: {}", self.file_name, e);
                return SelectionSet::new();
            }
        };

        // non-string entries are skipped, a non-list field means "nothing selected"
        match value.get("selected_course_ids").and_then(|ids| ids.as_array()) {
            Some(ids) => ids.iter().filter_map(|id| id.as_str()).collect(),
            None => SelectionSet::new(),
        }
    }

    pub fn save(&self, selection: &SelectionSet) -> Result<()> {
        let record = SelectionRecord {
            selected_course_ids: selection.to_sorted_vec(),
        };
        let data = serde_json::to_vec_pretty(&record)?;
        self.storage.write_file(&self.file_name, &data)?;
        tracing::debug!(
            "Saved {} selected course(s) to {}",
            record.selected_course_ids.len(),
            self.file_name
        );
        Ok(())
    }

    pub fn add(&self, course_id: &str) -> Result<SelectionChange> {
        let cid = require_course_id(course_id)?;
        let mut selection = self.load();
        if !selection.insert(&cid) {
            return Ok(SelectionChange::AlreadySelected);
        }
        self.save(&selection)?;
        Ok(SelectionChange::Added)
    }

    pub fn remove(&self, course_id: &str) -> Result<SelectionChange> {
        let cid = require_course_id(course_id)?;
        let mut selection = self.load();
        if !selection.remove(&cid) {
            return Ok(SelectionChange::NotSelected);
        }
        self.save(&selection)?;
        Ok(SelectionChange::Removed)
    }
}

fn require_course_id(raw: &str) -> Result<String> {
    normalize_course_id(raw).ok_or_else(|| ScheduleError::invalid_input("Please provide a course_id."))
}
