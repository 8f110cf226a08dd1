#![forbid(unsafe_code)]

//! Core domain model and business logic for gymlog.
//!
//! This crate provides:
//! - Domain types (routines, set logs, workouts, sessions, preferences)
//! - Exercise catalog and seed routines
//! - Provider contracts for auth, storage, payments and ads
//! - File-backed and in-memory storage adapters
//! - Workout tracking, personal records and statistics

pub mod types;
pub mod error;
pub mod preferences;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod state;
pub mod wal;
pub mod providers;
pub mod local_storage;
pub mod memory_storage;
pub mod workout;
pub mod tracker;
pub mod pr;
pub mod stats;
pub mod routine_form;
pub mod export;
pub mod ad_policy;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use preferences::*;
pub use catalog::{get_default_catalog, initial_routines, ExerciseCatalog, INITIAL_ROUTINES};
pub use config::Config;
pub use local_storage::LocalStorage;
pub use memory_storage::MemoryStorage;
pub use tracker::Tracker;
pub use pr::check_pr;
pub use stats::ChartRange;
pub use routine_form::{FormMode, RoutineDraft, RoutineForm};
pub use export::export_sessions;
pub use ad_policy::{AdOutcome, AdScheduler};
