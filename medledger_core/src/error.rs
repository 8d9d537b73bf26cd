//! Error types for the medledger_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medledger_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A prescription-only action was attempted on a non-prescription medication
    #[error("{action} is only available for prescription medications")]
    NotApplicableForNonPrescription { action: &'static str },

    /// A non-prescription-only action was attempted on a prescription medication
    #[error("{action} is only available for non-prescription medications")]
    NotApplicableForPrescription { action: &'static str },

    /// No medication with the given id exists in the store
    #[error("Medication not found: {0}")]
    MedicationNotFound(String),

    /// No log entry with the given id exists on the medication
    #[error("Log entry {entry_id} not found on medication {medication_id}")]
    LogEntryNotFound {
        medication_id: String,
        entry_id: String,
    },

    /// A medication with the same id is already stored
    #[error("Medication id already in use: {0}")]
    DuplicateId(String),

    /// The stored record changed since it was fetched
    #[error("Medication {id} was modified concurrently (expected revision {expected}, found {found})")]
    Conflict { id: String, expected: u64, found: u64 },

    /// Validation or parse failure on user input
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for the type-applicability violations raised by refill/restock
    pub fn is_not_applicable(&self) -> bool {
        matches!(
            self,
            Error::NotApplicableForNonPrescription { .. }
                | Error::NotApplicableForPrescription { .. }
        )
    }
}
