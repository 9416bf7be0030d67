//! Weighted spaced repetition for note images
//!
//! This module provides:
//! - Item keys and per-item review state
//! - The feedback update rule and weighted review selection
//! - A JSON-backed state store with atomic saves
//! - Review statistics per collection

pub mod algorithm;
pub mod models;
pub mod scheduler;
pub mod stats;
pub mod storage;

pub use models::*;
pub use scheduler::Scheduler;
pub use stats::{CollectionStats, Familiarity, ReviewStats};
pub use storage::ItemStateStore;
