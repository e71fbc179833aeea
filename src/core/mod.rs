pub mod catalog;
pub mod conflicts;
pub mod engine;
pub mod selection;
pub mod views;

pub use crate::domain::model::{ConflictPair, Course, Event, SelectionSet};
pub use crate::domain::ports::{CatalogSource, Storage};
pub use crate::utils::error::Result;
