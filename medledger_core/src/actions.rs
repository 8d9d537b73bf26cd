//! Supply transactions on a single medication.
//!
//! Each operation mutates the remaining balance and appends the matching log
//! entry in one step, or (when the medication type does not allow it)
//! returns an error without touching anything. Persisting the result is the
//! job of [`crate::engine`].

use crate::units::to_mg;
use crate::{DosageUnit, Error, IntakeLogEntry, Medication, MedicationDetails, Result};
use chrono::{DateTime, Days, Utc};

/// A dose amount in a given unit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dose {
    pub amount: f64,
    pub unit: DosageUnit,
}

impl Default for Dose {
    /// One pill
    fn default() -> Self {
        Self::pills(1.0)
    }
}

impl Dose {
    pub fn new(amount: f64, unit: DosageUnit) -> Self {
        Self { amount, unit }
    }

    pub fn pills(amount: f64) -> Self {
        Self::new(amount, DosageUnit::Pill)
    }

    pub fn half_pill() -> Self {
        Self::pills(0.5)
    }
}

impl Medication {
    /// Take a dose: lower the balance and log the negative intake
    ///
    /// The balance is not floored at zero.
    pub fn take_medication(&mut self, dose: Dose, now: DateTime<Utc>) -> &IntakeLogEntry {
        let dose_in_mg = to_mg(dose.amount, dose.unit, self.mg_per_pill);
        self.total_mg_remaining -= dose_in_mg;
        self.append_log(-dose_in_mg, now)
    }

    /// Refill a prescription with one full supply and roll the fill dates forward
    pub fn refill_medication(&mut self, now: DateTime<Utc>) -> Result<&IntakeLogEntry> {
        let refill_amount = self.initial_pill_count * self.mg_per_pill;
        let MedicationDetails::Prescription(details) = &mut self.details else {
            return Err(Error::NotApplicableForNonPrescription { action: "Refill" });
        };

        // Whole days, as a calendar "add N days" would. Past chrono's range
        // the next fill date falls back to today.
        let days = details.days_supply().trunc().max(0.0) as u64;
        details.last_filled_on = Some(now);
        details.next_fill_date = Some(now.checked_add_days(Days::new(days)).unwrap_or(now));
        if let Some(remaining) = details.refills_remaining {
            if remaining > 0 {
                details.refills_remaining = Some(remaining - 1);
            }
        }

        self.total_mg_remaining += refill_amount;
        Ok(self.append_log(refill_amount, now))
    }

    /// Restock an over-the-counter bottle with `quantity` pills
    ///
    /// Fill dates are left alone.
    pub fn restock_bottle(&mut self, quantity: f64, now: DateTime<Utc>) -> Result<&IntakeLogEntry> {
        if !matches!(self.details, MedicationDetails::NonPrescription(_)) {
            return Err(Error::NotApplicableForPrescription { action: "Restock" });
        }
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(Error::Invalid(format!(
                "restock quantity must be >= 0 (got {})",
                quantity
            )));
        }

        let restock_amount = quantity * self.mg_per_pill;
        self.total_mg_remaining += restock_amount;
        Ok(self.append_log(restock_amount, now))
    }

    /// Correct a log entry after the fact
    ///
    /// Only the audit record changes; the live balance and the entry's own
    /// balance snapshot are left as they were.
    pub fn edit_log_entry(
        &mut self,
        entry_id: &str,
        timestamp: Option<DateTime<Utc>>,
        mg_intake: Option<f64>,
    ) -> Result<&IntakeLogEntry> {
        let medication_id = self.id.clone();
        let entry = self
            .log
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| Error::LogEntryNotFound {
                medication_id,
                entry_id: entry_id.to_string(),
            })?;

        if let Some(timestamp) = timestamp {
            entry.timestamp = timestamp;
        }
        if let Some(mg_intake) = mg_intake {
            entry.mg_intake = mg_intake;
        }
        Ok(entry)
    }

    fn append_log(&mut self, mg_intake: f64, now: DateTime<Utc>) -> &IntakeLogEntry {
        self.log
            .push(IntakeLogEntry::new(mg_intake, self.total_mg_remaining, now));
        // Just pushed, so the log is non-empty
        &self.log[self.log.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NonPrescriptionDetails, PrescriptionDetails};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 9, 0, 0).unwrap()
    }

    fn rx() -> Medication {
        let mut med = Medication::prescription("Lisinopril", 20.0, 30.0);
        if let Some(details) = med.prescription_details_mut() {
            details.refills_remaining = Some(3);
        }
        med
    }

    #[test]
    fn test_take_one_pill() {
        let mut med = rx();
        let entry = med.take_medication(Dose::default(), now()).clone();

        assert_eq!(med.total_mg_remaining, 580.0);
        assert_eq!(med.log.len(), 1);
        assert_eq!(entry.mg_intake, -20.0);
        assert_eq!(entry.total_mg_remaining, 580.0);
        assert_eq!(entry.timestamp, now());
    }

    #[test]
    fn test_take_sequence_conserves_supply() {
        let mut med = rx();
        let doses = [
            Dose::pills(1.0),
            Dose::half_pill(),
            Dose::new(15.0, DosageUnit::Mg),
            Dose::new(2.0, DosageUnit::Drop),
        ];
        for dose in doses {
            med.take_medication(dose, now());
        }

        let taken: f64 = 20.0 + 10.0 + 15.0 + 40.0;
        assert_eq!(med.total_mg_remaining, 600.0 - taken);
        assert_eq!(med.log.len(), doses.len());
        assert_eq!(
            med.log.iter().map(|e| e.mg_intake).collect::<Vec<_>>(),
            vec![-20.0, -10.0, -15.0, -40.0]
        );
        // Each snapshot is the previous one plus this entry's delta
        let mut balance = 600.0;
        for entry in &med.log {
            balance += entry.mg_intake;
            assert_eq!(entry.total_mg_remaining, balance);
        }
    }

    #[test]
    fn test_take_can_go_negative() {
        let mut med = Medication::prescription("Rx", 20.0, 1.0);
        med.take_medication(Dose::pills(1.0), now());
        med.take_medication(Dose::pills(1.0), now());
        assert_eq!(med.total_mg_remaining, -20.0);
        assert_eq!(med.log[1].total_mg_remaining, -20.0);
    }

    #[test]
    fn test_refill_prescription() {
        let mut med = rx();
        med.take_medication(Dose::default(), now());
        let entry = med.refill_medication(now()).unwrap().clone();

        assert_eq!(med.total_mg_remaining, 1180.0);
        assert_eq!(entry.mg_intake, 600.0);
        assert!(entry.is_refill());

        let details = med.prescription_details().unwrap();
        assert_eq!(details.refills_remaining, Some(2));
        assert_eq!(details.last_filled_on, Some(now()));
        assert_eq!(details.next_fill_date, Some(now() + Duration::days(30)));
    }

    #[test]
    fn test_refill_uses_days_supply() {
        let mut med = rx();
        if let Some(details) = med.prescription_details_mut() {
            details.number_of_days_supply = Some(90.0);
        }
        med.refill_medication(now()).unwrap();
        let details = med.prescription_details().unwrap();
        assert_eq!(details.next_fill_date, Some(now() + Duration::days(90)));
    }

    #[test]
    fn test_refill_past_calendar_range_keeps_today() {
        let mut med = rx();
        if let Some(details) = med.prescription_details_mut() {
            details.number_of_days_supply = Some(1e9);
        }
        assert!(med.validate().is_empty());

        med.refill_medication(now()).unwrap();
        let details = med.prescription_details().unwrap();
        assert_eq!(details.last_filled_on, Some(now()));
        assert_eq!(details.next_fill_date, Some(now()));
        assert_eq!(med.total_mg_remaining, 1200.0);
    }

    #[test]
    fn test_refill_never_goes_below_zero_refills() {
        let mut med = rx();
        if let Some(details) = med.prescription_details_mut() {
            details.refills_remaining = Some(0);
        }
        med.refill_medication(now()).unwrap();
        assert_eq!(med.prescription_details().unwrap().refills_remaining, Some(0));

        // Untracked refills stay untracked
        let mut med = Medication::prescription("Rx", 20.0, 30.0);
        med.refill_medication(now()).unwrap();
        assert_eq!(med.prescription_details().unwrap().refills_remaining, None);
    }

    #[test]
    fn test_refill_rejected_for_non_prescription() {
        let mut med = Medication::non_prescription("Vitamin D", 20.0, 100.0);
        let before = med.clone();

        let err = med.refill_medication(now()).unwrap_err();
        assert!(matches!(err, Error::NotApplicableForNonPrescription { .. }));
        assert_eq!(med, before);
    }

    #[test]
    fn test_restock_non_prescription() {
        let mut med = Medication::non_prescription("Vitamin D", 20.0, 100.0);
        let entry = med.restock_bottle(50.0, now()).unwrap().clone();

        assert_eq!(med.total_mg_remaining, 3000.0);
        assert_eq!(entry.mg_intake, 1000.0);
        assert_eq!(entry.total_mg_remaining, 3000.0);
        assert_eq!(
            med.details,
            MedicationDetails::NonPrescription(NonPrescriptionDetails::default())
        );
    }

    #[test]
    fn test_restock_rejected_for_prescription() {
        let mut med = rx();
        let before = med.clone();

        let err = med.restock_bottle(10.0, now()).unwrap_err();
        assert!(matches!(err, Error::NotApplicableForPrescription { .. }));
        assert!(err.is_not_applicable());
        assert_eq!(med, before);
        assert_eq!(
            med.details,
            MedicationDetails::Prescription(PrescriptionDetails {
                refills_remaining: Some(3),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_restock_type_checked_before_quantity() {
        let mut med = rx();
        let before = med.clone();
        for quantity in [-1.0, f64::NAN] {
            let err = med.restock_bottle(quantity, now()).unwrap_err();
            assert!(matches!(err, Error::NotApplicableForPrescription { .. }));
        }
        assert_eq!(med, before);

        let mut med = Medication::non_prescription("Vitamin D", 20.0, 100.0);
        let before = med.clone();
        for quantity in [-1.0, f64::INFINITY] {
            let err = med.restock_bottle(quantity, now()).unwrap_err();
            assert!(matches!(err, Error::Invalid(_)));
        }
        assert_eq!(med, before);
    }

    #[test]
    fn test_edit_log_entry_leaves_balance() {
        let mut med = rx();
        let id = med.take_medication(Dose::default(), now()).id.clone();
        let earlier = now() - Duration::days(2);

        med.edit_log_entry(&id, Some(earlier), Some(-40.0)).unwrap();

        assert_eq!(med.log[0].timestamp, earlier);
        assert_eq!(med.log[0].mg_intake, -40.0);
        assert_eq!(med.log[0].total_mg_remaining, 580.0);
        assert_eq!(med.total_mg_remaining, 580.0);
    }

    #[test]
    fn test_edit_missing_log_entry() {
        let mut med = rx();
        let err = med.edit_log_entry("nope", None, None).unwrap_err();
        assert!(matches!(err, Error::LogEntryNotFound { .. }));
    }
}
