//! JSON-backed note store library
//!
//! This library provides functionality for adding, listing, updating, deleting
//! and searching short notes kept in a single JSON file, with summaries,
//! exports and a small web front end.

mod cli;
mod config;
mod errors;
mod export;
mod helper;
mod highlight;
mod note;
mod query;
mod stats;
mod storage;
mod types;
mod validate;
mod web;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use export::*;
pub use helper::*;
pub use highlight::*;
pub use note::*;
pub use query::*;
pub use stats::*;
pub use storage::*;
pub use types::*;
pub use validate::*;
pub use web::*;
