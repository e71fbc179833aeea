pub mod commands;
pub mod format;
pub mod interactive;
pub mod render;
pub mod session;

pub use render::{AnsiRenderer, PlainRenderer, Renderer, Table};
pub use session::Session;
