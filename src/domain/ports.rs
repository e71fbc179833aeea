use crate::domain::model::{CatalogMetadata, Course, Event, RefreshOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Byte-level persistence used by the selection store and the catalog loader.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
    fn exists(&self, path: &str) -> bool;
}

/// Hands a flat, de-duplicated event list to a calendar file writer.
pub trait CalendarExporter {
    /// Returns the number of events written.
    fn export(&self, events: &[&Event], out: &Path) -> Result<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub semester: String,
    /// Re-download every course page instead of only the missing ones.
    pub refresh: bool,
}

/// Rebuilds the catalog files from the remote source.
///
/// Implementations stop their work and report `Cancelled` once `cancel` fires.
#[async_trait]
pub trait CatalogRefresher: Send + Sync {
    async fn refresh(&self, request: &RefreshRequest, cancel: CancellationToken) -> RefreshOutcome;
}

/// Reads the catalog snapshot files.
pub trait CatalogSource {
    fn has_data(&self) -> bool;
    fn load_courses(&self) -> Vec<Course>;
    fn load_events(&self) -> Vec<Event>;
    fn read_metadata(&self) -> Option<CatalogMetadata>;
}
