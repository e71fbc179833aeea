pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliCommand, CliConfig};

pub use adapters::{IcsExporter, JsonCatalogSource, LocalStorage, MemoryStorage};
pub use app::Session;
pub use config::AppConfig;
pub use core::{catalog::Catalog, engine::ScheduleEngine, selection::SelectionStore};
pub use utils::error::{Result, ScheduleError};
