#![forbid(unsafe_code)]

//! Core domain model and business logic for the liftlog fitness logbook.
//!
//! This crate provides:
//! - Domain types (weight logs, body stats, exercise logs, catalog, routines)
//! - Import pipeline (parser, classifier, merge engine)
//! - CSV export
//! - Persistence through an injected key-value store

pub mod types;
pub mod error;
pub mod slug;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod state;
pub mod parser;
pub mod classifier;
pub mod merge;
pub mod import;
pub mod export;
pub mod journal;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_catalog, Catalog};
pub use config::Config;
pub use state::Logbook;
pub use store::{FileStore, MemoryStore, Store};
pub use parser::{parse, InputFormat, ParsedInput};
pub use classifier::{classify, ClassifiedRow};
pub use merge::{merge, merge_in_chunks, MergeOutcome, MergeReport};
pub use import::{import_file, ImportOutcome, ImportPreview, PreparedImport};
pub use export::{export_weight_log, export_workout_log};
