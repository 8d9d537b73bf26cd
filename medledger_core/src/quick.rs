//! Fire-and-forget actions for shortcuts and widget buttons.
//!
//! These resolve a medication by id, apply one transaction and persist it.
//! Failures are logged and swallowed; a failed action leaves the store as it
//! was.

use crate::engine;
use crate::store::MedicationStore;
use crate::{Dose, Error, Medication};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuickAction {
    /// One pill
    TakeFullDose,
    /// Half a pill
    TakeHalfDose,
    Refill,
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuickAction::TakeFullDose => "take-full",
            QuickAction::TakeHalfDose => "take-half",
            QuickAction::Refill => "refill",
        };
        f.write_str(label)
    }
}

impl FromStr for QuickAction {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "take-full" | "take_full" | "full" => Ok(QuickAction::TakeFullDose),
            "take-half" | "take_half" | "half" => Ok(QuickAction::TakeHalfDose),
            "refill" => Ok(QuickAction::Refill),
            other => Err(Error::Invalid(format!("unknown quick action: {}", other))),
        }
    }
}

/// Run `action` against medication `id`
///
/// Returns the committed medication, or `None` if anything failed.
pub fn perform<S: MedicationStore>(
    store: &mut S,
    id: &str,
    action: QuickAction,
    now: DateTime<Utc>,
) -> Option<Medication> {
    let result = match action {
        QuickAction::TakeFullDose => engine::take_medication(store, id, Dose::pills(1.0), now),
        QuickAction::TakeHalfDose => engine::take_medication(store, id, Dose::half_pill(), now),
        QuickAction::Refill => engine::refill_medication(store, id, now),
    };

    match result {
        Ok(med) => Some(med),
        Err(e) => {
            tracing::warn!("Quick action {} on {} failed: {}", action, id, e);
            None
        }
    }
}
