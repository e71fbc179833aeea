pub mod ics;
pub mod json_catalog;
pub mod refresh;
pub mod storage;

pub use ics::IcsExporter;
pub use json_catalog::JsonCatalogSource;
pub use refresh::CommandRefresher;
pub use storage::{LocalStorage, MemoryStorage};
