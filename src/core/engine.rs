use crate::core::catalog::Catalog;
use crate::core::conflicts::{find_conflicts, preview_add};
use crate::core::selection::{SelectionChange, SelectionStore};
use crate::core::views::{self, ConflictReport, SearchResults};
use crate::domain::model::{normalize_course_id, ConflictPair, Event, SelectionSet};
use crate::domain::ports::{CatalogSource, Storage};
use crate::utils::error::{Result, ScheduleError};

/// Outcome of an add request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddResult {
    pub course_id: String,
    pub change: SelectionChange,
    /// The id is not in the catalog; it is stored anyway.
    pub unknown_course: bool,
    pub selected_count: usize,
}

/// Session context: one catalog snapshot plus the selection store.
///
/// Every query reads the selection fresh from the store. Refreshing the
/// catalog replaces the snapshot as a whole.
pub struct ScheduleEngine<S: Storage> {
    catalog: Catalog,
    selection: SelectionStore<S>,
}

impl<S: Storage> ScheduleEngine<S> {
    pub fn new(catalog: Catalog, selection: SelectionStore<S>) -> Self {
        Self { catalog, selection }
    }

    pub fn from_source<C: CatalogSource>(source: &C, selection: SelectionStore<S>) -> Self {
        let catalog = Catalog::build(source.load_courses(), source.load_events());
        Self::new(catalog, selection)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &SelectionStore<S> {
        &self.selection
    }

    pub fn replace_catalog(&mut self, catalog: Catalog) {
        tracing::info!(
            "Catalog reloaded: {} courses, {} events",
            catalog.course_count(),
            catalog.event_count()
        );
        self.catalog = catalog;
    }

    pub fn selection(&self) -> SelectionSet {
        self.selection.load()
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<SearchResults<'_>> {
        views::search_courses(&self.catalog, query, limit)
    }

    pub fn add_course(&self, course_id: &str) -> Result<AddResult> {
        let cid = normalize_course_id(course_id)
            .ok_or_else(|| ScheduleError::invalid_input("Please provide a course_id."))?;
        let unknown_course = !self.catalog.contains_course(&cid);
        if unknown_course {
            tracing::warn!("course_id '{}' not found in catalog, adding anyway", cid);
        }
        let change = self.selection.add(&cid)?;
        Ok(AddResult {
            selected_count: self.selection.load().len(),
            course_id: cid,
            change,
            unknown_course,
        })
    }

    pub fn remove_course(&self, course_id: &str) -> Result<(String, SelectionChange)> {
        let cid = normalize_course_id(course_id)
            .ok_or_else(|| ScheduleError::invalid_input("Please provide a course_id."))?;
        let change = self.selection.remove(&cid)?;
        Ok((cid, change))
    }

    pub fn selected_events(&self) -> Vec<&Event> {
        views::selected_events(&self.catalog, &self.selection.load())
    }

    pub fn conflicts(&self) -> ConflictReport<'_> {
        views::group_conflicts(find_conflicts(self.selected_events()))
    }

    pub fn preview_add(&self, candidate_id: &str) -> Vec<ConflictPair<'_>> {
        preview_add(&self.catalog, &self.selection.load(), candidate_id)
    }

    pub fn export_events(&self) -> Vec<&Event> {
        views::export_events(&self.selected_events())
    }
}
