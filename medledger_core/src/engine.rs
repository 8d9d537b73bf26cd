//! Store-backed medication operations.
//!
//! Each operation loads one medication, applies a transaction from
//! [`crate::actions`] and persists it as a single durable write through
//! [`MedicationStore::transact`]. A rejected transaction (wrong medication
//! type, unknown log entry) leaves the store untouched.

use crate::store::MedicationStore;
use crate::{Dose, Error, IntakeGoal, Medication, Result};
use chrono::{DateTime, Utc};

// serde_json writes NaN and infinities as null, which the store cannot read back
fn ensure_finite(what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::Invalid(format!("{} must be a finite number (got {})", what, value)))
    }
}

fn ensure_valid(medication: &Medication) -> Result<()> {
    let errors = medication.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Invalid(errors.join("; ")))
    }
}

/// Validate and store a new medication
pub fn add_medication<S: MedicationStore>(store: &mut S, medication: Medication) -> Result<Medication> {
    ensure_valid(&medication)?;
    tracing::info!(
        "Adding {} medication {} ({})",
        medication.medication_type(),
        medication.name,
        medication.id
    );
    store.insert(medication.clone())?;
    Ok(medication)
}

/// Fetch a medication or fail with [`Error::MedicationNotFound`]
pub fn get_medication<S: MedicationStore>(store: &S, id: &str) -> Result<Medication> {
    store
        .fetch(id)?
        .ok_or_else(|| Error::MedicationNotFound(id.to_string()))
}

/// Delete a medication together with its intake log
pub fn delete_medication<S: MedicationStore>(store: &mut S, id: &str) -> Result<Medication> {
    let removed = store.delete(id)?;
    tracing::info!(
        "Deleted medication {} ({}) and {} log entries",
        removed.name,
        removed.id,
        removed.log.len()
    );
    Ok(removed)
}

pub fn take_medication<S: MedicationStore>(
    store: &mut S,
    id: &str,
    dose: Dose,
    now: DateTime<Utc>,
) -> Result<Medication> {
    ensure_finite("dose", dose.amount)?;
    let med = store.transact(id, |med| {
        med.take_medication(dose, now);
        Ok(())
    })?;
    tracing::info!(
        "Took {} {} of {}, {:.1} mg remaining",
        dose.amount,
        dose.unit,
        med.name,
        med.total_mg_remaining
    );
    Ok(med)
}

pub fn refill_medication<S: MedicationStore>(
    store: &mut S,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Medication> {
    let med = store.transact(id, |med| med.refill_medication(now).map(|_| ()))?;
    tracing::info!(
        "Refilled {}, {:.1} mg remaining",
        med.name,
        med.total_mg_remaining
    );
    Ok(med)
}

pub fn restock_bottle<S: MedicationStore>(
    store: &mut S,
    id: &str,
    quantity: f64,
    now: DateTime<Utc>,
) -> Result<Medication> {
    let med = store.transact(id, |med| med.restock_bottle(quantity, now).map(|_| ()))?;
    tracing::info!(
        "Restocked {} with {} pills, {:.1} mg remaining",
        med.name,
        quantity,
        med.total_mg_remaining
    );
    Ok(med)
}

pub fn edit_log_entry<S: MedicationStore>(
    store: &mut S,
    id: &str,
    entry_id: &str,
    timestamp: Option<DateTime<Utc>>,
    mg_intake: Option<f64>,
) -> Result<Medication> {
    if let Some(mg_intake) = mg_intake {
        ensure_finite("mg intake", mg_intake)?;
    }
    let med = store.transact(id, |med| {
        med.edit_log_entry(entry_id, timestamp, mg_intake).map(|_| ())
    })?;
    tracing::info!("Edited log entry {} of {}", entry_id, med.name);
    Ok(med)
}

/// Replace or clear the intake goal
pub fn set_goal<S: MedicationStore>(
    store: &mut S,
    id: &str,
    goal: Option<IntakeGoal>,
) -> Result<Medication> {
    let med = store.transact(id, |med| {
        med.intake_goal = goal;
        ensure_valid(med)
    })?;
    match &med.intake_goal {
        Some(goal) => tracing::info!(
            "Set goal on {}: {:?} {} {:?}",
            med.name,
            goal.constraint,
            goal.target_doses,
            goal.period
        ),
        None => tracing::info!("Cleared goal on {}", med.name),
    }
    Ok(med)
}
