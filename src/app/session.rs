use crate::adapters::json_catalog::JsonCatalogSource;
use crate::adapters::refresh::CommandRefresher;
use crate::adapters::storage::LocalStorage;
use crate::config::AppConfig;
use crate::core::catalog::Catalog;
use crate::core::engine::ScheduleEngine;
use crate::core::selection::SelectionStore;
use crate::domain::model::CatalogMetadata;
use crate::domain::ports::{CatalogSource, Storage};

/// Everything a command or the menu works with: engine, catalog files and settings.
pub struct Session<S: Storage + Clone> {
    pub engine: ScheduleEngine<S>,
    pub source: JsonCatalogSource<S>,
    pub config: AppConfig,
}

impl Session<LocalStorage> {
    /// Opens the data directory named in the config.
    pub fn open(config: AppConfig) -> Self {
        let storage = LocalStorage::new(config.data_dir());
        tracing::debug!("Using data directory {}", storage.base_path().display());
        Self::with_storage(storage, config)
    }

    pub fn command_refresher(&self) -> CommandRefresher<LocalStorage> {
        CommandRefresher::new(
            self.config.refresh.scrape_command.clone(),
            self.config.refresh.parse_command.clone(),
            self.config.data_dir(),
            self.source.clone(),
        )
    }
}

impl<S: Storage + Clone> Session<S> {
    pub fn with_storage(storage: S, config: AppConfig) -> Self {
        let source = JsonCatalogSource::new(storage.clone()).with_file_names(
            config.data.courses_file.clone(),
            config.data.events_file.clone(),
            config.data.metadata_file.clone(),
        );
        let store = SelectionStore::with_file_name(storage, config.data.selection_file.clone());
        let engine = ScheduleEngine::from_source(&source, store);
        tracing::info!(
            "Loaded catalog: {} courses, {} events",
            engine.catalog().course_count(),
            engine.catalog().event_count()
        );

        Self {
            engine,
            source,
            config,
        }
    }

    /// Swaps in a freshly built catalog; the selection file is untouched.
    pub fn reload(&mut self) {
        let catalog = Catalog::build(self.source.load_courses(), self.source.load_events());
        self.engine.replace_catalog(catalog);
    }

    pub fn has_data(&self) -> bool {
        self.source.has_data()
    }

    pub fn metadata(&self) -> Option<CatalogMetadata> {
        self.source.read_metadata()
    }
}
