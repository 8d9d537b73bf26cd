#![forbid(unsafe_code)]

//! Core domain model and business logic for MedLedger.
//!
//! This crate provides:
//! - Domain types (medications, intake log, goals, units)
//! - Supply transactions (take, refill, restock, log edits)
//! - Derived metrics, intake statistics and the goal engine
//! - Persistence (JSON file store with cross-process locking)
//! - Widget projection, quick actions and log export

pub mod types;
pub mod error;
pub mod units;
pub mod calendar;
pub mod actions;
pub mod metrics;
pub mod intake;
pub mod goals;
pub mod store;
pub mod engine;
pub mod projection;
pub mod quick;
pub mod export;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use units::to_mg;
pub use calendar::Calendar;
pub use actions::Dose;
pub use goals::MAX_STREAK_PERIODS;
pub use store::{JsonFileStore, MedicationStore, MemoryStore};
pub use projection::MedicationSnapshot;
pub use quick::QuickAction;
pub use export::ExportFormat;
pub use config::Config;
