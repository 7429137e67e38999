//! Command-line surface: argument parsing and the handler that maps each
//! subcommand onto the note store and query engine.
mod app;
mod main;

pub use app::*;
pub use main::*;
