//! Core domain types for the MedLedger system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Medications, with prescription and non-prescription details as a tagged union
//! - Intake log entries (the signed-delta ledger)
//! - Intake goals and their constraint/period settings
//! - Dosage units and medication forms

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Days of supply assumed for a prescription refill when none is recorded
pub const DEFAULT_DAYS_SUPPLY: f64 = 30.0;

/// Normalize a user-supplied enum label ("Non-Prescription", "nasal spray") to snake_case
fn normalize_label(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

// ============================================================================
// Classification and Units
// ============================================================================

/// Whether a medication is dispensed on prescription or bought over the counter
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MedicationType {
    Prescription,
    NonPrescription,
}

impl fmt::Display for MedicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MedicationType::Prescription => write!(f, "Prescription"),
            MedicationType::NonPrescription => write!(f, "Non-Prescription"),
        }
    }
}

impl FromStr for MedicationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "prescription" | "rx" => Ok(MedicationType::Prescription),
            "non_prescription" | "nonprescription" | "otc" | "supplement" => {
                Ok(MedicationType::NonPrescription)
            }
            other => Err(Error::Invalid(format!("unknown medication type: {}", other))),
        }
    }
}

/// Physical form of a medication (display only)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MedicationForm {
    #[default]
    Tablet,
    Capsule,
    Gummy,
    Softgel,
    Liquid,
    Syrup,
    Suspension,
    Cream,
    Ointment,
    Gel,
    Lotion,
    Patch,
    Injection,
    Inhaler,
    NasalSpray,
    EyeDrops,
    EarDrops,
    Powder,
    Other,
}

impl MedicationForm {
    pub const ALL: [MedicationForm; 19] = [
        MedicationForm::Tablet,
        MedicationForm::Capsule,
        MedicationForm::Gummy,
        MedicationForm::Softgel,
        MedicationForm::Liquid,
        MedicationForm::Syrup,
        MedicationForm::Suspension,
        MedicationForm::Cream,
        MedicationForm::Ointment,
        MedicationForm::Gel,
        MedicationForm::Lotion,
        MedicationForm::Patch,
        MedicationForm::Injection,
        MedicationForm::Inhaler,
        MedicationForm::NasalSpray,
        MedicationForm::EyeDrops,
        MedicationForm::EarDrops,
        MedicationForm::Powder,
        MedicationForm::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MedicationForm::Tablet => "Tablet",
            MedicationForm::Capsule => "Capsule",
            MedicationForm::Gummy => "Gummy",
            MedicationForm::Softgel => "Softgel",
            MedicationForm::Liquid => "Liquid",
            MedicationForm::Syrup => "Syrup",
            MedicationForm::Suspension => "Suspension",
            MedicationForm::Cream => "Cream",
            MedicationForm::Ointment => "Ointment",
            MedicationForm::Gel => "Gel",
            MedicationForm::Lotion => "Lotion",
            MedicationForm::Patch => "Patch",
            MedicationForm::Injection => "Injection",
            MedicationForm::Inhaler => "Inhaler",
            MedicationForm::NasalSpray => "Nasal Spray",
            MedicationForm::EyeDrops => "Eye Drops",
            MedicationForm::EarDrops => "Ear Drops",
            MedicationForm::Powder => "Powder",
            MedicationForm::Other => "Other",
        }
    }
}

impl fmt::Display for MedicationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MedicationForm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize_label(s);
        MedicationForm::ALL
            .iter()
            .copied()
            .find(|form| normalize_label(form.label()) == wanted)
            .ok_or_else(|| Error::Invalid(format!("unknown medication form: {}", s)))
    }
}

/// Unit a dose or quantity is expressed in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DosageUnit {
    Mg,
    #[default]
    Pill,
    Ml,
    Spray,
    Drop,
    Puff,
    Application,
}

impl fmt::Display for DosageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DosageUnit::Mg => "mg",
            DosageUnit::Pill => "Pill",
            DosageUnit::Ml => "mL",
            DosageUnit::Spray => "Spray",
            DosageUnit::Drop => "Drop",
            DosageUnit::Puff => "Puff",
            DosageUnit::Application => "Application",
        };
        f.write_str(label)
    }
}

impl FromStr for DosageUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "mg" => Ok(DosageUnit::Mg),
            "pill" | "pills" => Ok(DosageUnit::Pill),
            "ml" => Ok(DosageUnit::Ml),
            "spray" | "sprays" => Ok(DosageUnit::Spray),
            "drop" | "drops" => Ok(DosageUnit::Drop),
            "puff" | "puffs" => Ok(DosageUnit::Puff),
            "application" | "applications" => Ok(DosageUnit::Application),
            other => Err(Error::Invalid(format!("unknown dosage unit: {}", other))),
        }
    }
}

// ============================================================================
// Intake Goal Types
// ============================================================================

/// How the dose count of a period is compared against the goal
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalConstraint {
    #[default]
    AtLeast,
    NoMoreThan,
    /// Between `target_doses` and `maximum_doses`
    Both,
}

impl FromStr for GoalConstraint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "at_least" | "atleast" | "min" => Ok(GoalConstraint::AtLeast),
            "no_more_than" | "nomorethan" | "max" => Ok(GoalConstraint::NoMoreThan),
            "both" | "between" => Ok(GoalConstraint::Both),
            other => Err(Error::Invalid(format!("unknown goal constraint: {}", other))),
        }
    }
}

/// Length of a goal window
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalPeriod {
    PerDay,
    PerWeek,
    PerMonth,
}

impl FromStr for GoalPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "per_day" | "day" | "daily" => Ok(GoalPeriod::PerDay),
            "per_week" | "week" | "weekly" => Ok(GoalPeriod::PerWeek),
            "per_month" | "month" | "monthly" => Ok(GoalPeriod::PerMonth),
            other => Err(Error::Invalid(format!("unknown goal period: {}", other))),
        }
    }
}

/// A wall-clock time in the user's calendar
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour * 60 + self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Invalid(format!("expected HH:MM, got {}", s));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = h.parse().map_err(|_| invalid())?;
        let minute = m.parse().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute).ok_or_else(invalid)
    }
}

/// Adherence target attached to a medication
///
/// `specific_days` and `start_date` are kept as configuration only; the goal
/// engine counts every dose in the period regardless of them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntakeGoal {
    /// Minimum doses per period (`AtLeast`, lower bound of `Both`)
    pub target_doses: f64,
    /// Cap for `NoMoreThan`, upper bound for `Both`
    #[serde(default)]
    pub maximum_doses: Option<f64>,
    #[serde(default)]
    pub constraint: GoalConstraint,
    pub period: GoalPeriod,
    #[serde(default)]
    pub specific_days: Option<Vec<Weekday>>,
    #[serde(default)]
    pub times_of_day: Option<Vec<TimeOfDay>>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
}

impl IntakeGoal {
    /// An "at least `target_doses` per `period`" goal
    pub fn at_least(target_doses: f64, period: GoalPeriod) -> Self {
        Self {
            target_doses,
            maximum_doses: None,
            constraint: GoalConstraint::AtLeast,
            period,
            specific_days: None,
            times_of_day: None,
            start_date: None,
        }
    }

    pub fn with_constraint(mut self, constraint: GoalConstraint, maximum: Option<f64>) -> Self {
        self.constraint = constraint;
        self.maximum_doses = maximum;
        self
    }

    pub fn with_times_of_day(mut self, times: Vec<TimeOfDay>) -> Self {
        self.times_of_day = Some(times);
        self
    }

    /// Set the weekday restriction, dropping duplicates
    pub fn with_specific_days(mut self, days: Vec<Weekday>) -> Self {
        let mut unique: Vec<Weekday> = Vec::with_capacity(days.len());
        for day in days {
            if !unique.contains(&day) {
                unique.push(day);
            }
        }
        self.specific_days = Some(unique);
        self
    }

    pub fn with_start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    /// The upper bound used by `NoMoreThan`: `maximum_doses`, else `target_doses`
    pub fn cap(&self) -> f64 {
        self.maximum_doses.unwrap_or(self.target_doses)
    }
}

/// Doses completed in the current period against the goal's headline target
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GoalProgress {
    pub completed: u32,
    pub target: f64,
}

// ============================================================================
// Medication Details (tagged by medication type)
// ============================================================================

/// Fields that only exist for prescription medications
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct PrescriptionDetails {
    #[serde(default)]
    pub last_filled_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_fill_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub number_of_days_supply: Option<f64>,
    #[serde(default)]
    pub refills_remaining: Option<u32>,
    #[serde(default)]
    pub prescriber_name: Option<String>,
    #[serde(default)]
    pub pharmacy_name: Option<String>,
    #[serde(default)]
    pub rx_number: Option<String>,
}

impl PrescriptionDetails {
    /// Days covered by one refill, defaulting to 30
    pub fn days_supply(&self) -> f64 {
        self.number_of_days_supply.unwrap_or(DEFAULT_DAYS_SUPPLY)
    }
}

/// Fields that only exist for over-the-counter medications and supplements
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct NonPrescriptionDetails {
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub supplement_type: Option<String>,
    #[serde(default)]
    pub serving_size: Option<u32>,
    #[serde(default)]
    pub servings_per_container: Option<u32>,
    #[serde(default)]
    pub purchase_location: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

/// Type-specific payload of a medication
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "medication_type", rename_all = "snake_case")]
pub enum MedicationDetails {
    Prescription(PrescriptionDetails),
    NonPrescription(NonPrescriptionDetails),
}

impl MedicationDetails {
    pub fn medication_type(&self) -> MedicationType {
        match self {
            MedicationDetails::Prescription(_) => MedicationType::Prescription,
            MedicationDetails::NonPrescription(_) => MedicationType::NonPrescription,
        }
    }
}

// ============================================================================
// Intake Log
// ============================================================================

/// One signed quantity change against a medication
///
/// Negative `mg_intake` is a dose, positive is a refill or restock.
/// `total_mg_remaining` is the balance snapshot after the change.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntakeLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub mg_intake: f64,
    pub total_mg_remaining: f64,
}

impl IntakeLogEntry {
    pub fn new(mg_intake: f64, total_mg_remaining: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            mg_intake,
            total_mg_remaining,
        }
    }

    pub fn is_refill(&self) -> bool {
        self.mg_intake > 0.0
    }
}

// ============================================================================
// Medication
// ============================================================================

/// A tracked pharmaceutical or supplement product, owning its intake log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub form: MedicationForm,

    /// Remaining quantity in mg; may go negative
    pub total_mg_remaining: f64,
    /// Conversion rate from one pill (or other unit) to mg
    pub mg_per_pill: f64,
    /// Size of one full refill or restock, in pills
    pub initial_pill_count: f64,

    #[serde(default)]
    pub next_dose_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub daily_dosage: Option<f64>,
    #[serde(default)]
    pub daily_dosage_unit: Option<DosageUnit>,
    #[serde(default)]
    pub intake_goal: Option<IntakeGoal>,

    pub details: MedicationDetails,

    #[serde(default)]
    pub log: Vec<IntakeLogEntry>,

    /// Bumped by the store on every durable commit
    #[serde(default)]
    pub revision: u64,
}

impl Medication {
    /// Create a medication holding one full supply of `initial_pill_count` pills
    pub fn new(
        name: impl Into<String>,
        details: MedicationDetails,
        mg_per_pill: f64,
        initial_pill_count: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            form: MedicationForm::default(),
            total_mg_remaining: initial_pill_count * mg_per_pill,
            mg_per_pill,
            initial_pill_count,
            next_dose_time: None,
            daily_dosage: None,
            daily_dosage_unit: None,
            intake_goal: None,
            details,
            log: Vec::new(),
            revision: 0,
        }
    }

    pub fn prescription(name: impl Into<String>, mg_per_pill: f64, initial_pill_count: f64) -> Self {
        Self::new(
            name,
            MedicationDetails::Prescription(PrescriptionDetails::default()),
            mg_per_pill,
            initial_pill_count,
        )
    }

    pub fn non_prescription(
        name: impl Into<String>,
        mg_per_pill: f64,
        initial_pill_count: f64,
    ) -> Self {
        Self::new(
            name,
            MedicationDetails::NonPrescription(NonPrescriptionDetails::default()),
            mg_per_pill,
            initial_pill_count,
        )
    }

    pub fn with_form(mut self, form: MedicationForm) -> Self {
        self.form = form;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_total_mg_remaining(mut self, total_mg_remaining: f64) -> Self {
        self.total_mg_remaining = total_mg_remaining;
        self
    }

    pub fn with_goal(mut self, goal: IntakeGoal) -> Self {
        self.intake_goal = Some(goal);
        self
    }

    pub fn with_next_dose_time(mut self, at: DateTime<Utc>) -> Self {
        self.next_dose_time = Some(at);
        self
    }

    pub fn with_daily_dosage(mut self, amount: f64, unit: DosageUnit) -> Self {
        self.daily_dosage = Some(amount);
        self.daily_dosage_unit = Some(unit);
        self
    }

    pub fn medication_type(&self) -> MedicationType {
        self.details.medication_type()
    }

    pub fn prescription_details(&self) -> Option<&PrescriptionDetails> {
        match &self.details {
            MedicationDetails::Prescription(details) => Some(details),
            MedicationDetails::NonPrescription(_) => None,
        }
    }

    pub fn prescription_details_mut(&mut self) -> Option<&mut PrescriptionDetails> {
        match &mut self.details {
            MedicationDetails::Prescription(details) => Some(details),
            MedicationDetails::NonPrescription(_) => None,
        }
    }

    pub fn non_prescription_details(&self) -> Option<&NonPrescriptionDetails> {
        match &self.details {
            MedicationDetails::NonPrescription(details) => Some(details),
            MedicationDetails::Prescription(_) => None,
        }
    }

    /// Log entries ordered by timestamp (stable for equal timestamps)
    ///
    /// Insertion order is not trusted since entries can be re-dated.
    pub fn sorted_log(&self) -> Vec<&IntakeLogEntry> {
        let mut entries: Vec<_> = self.log.iter().collect();
        entries.sort_by_key(|entry| entry.timestamp);
        entries
    }

    /// Non-refill entries (doses), in storage order
    pub fn doses(&self) -> impl Iterator<Item = &IntakeLogEntry> {
        self.log.iter().filter(|entry| !entry.is_refill())
    }

    /// Validate a medication before it is stored
    ///
    /// Returns a list of human-readable problems; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Medication name must not be empty".to_string());
        }
        if !self.mg_per_pill.is_finite() || self.mg_per_pill < 0.0 {
            errors.push(format!("mg per pill must be >= 0 (got {})", self.mg_per_pill));
        }
        if !self.initial_pill_count.is_finite() || self.initial_pill_count < 0.0 {
            errors.push(format!(
                "Initial pill count must be >= 0 (got {})",
                self.initial_pill_count
            ));
        }
        if !self.total_mg_remaining.is_finite() {
            errors.push("Remaining quantity must be a finite number".to_string());
        }
        if let Some(details) = self.prescription_details() {
            if let Some(days) = details.number_of_days_supply {
                if !days.is_finite() || days <= 0.0 {
                    errors.push(format!("Days supply must be > 0 (got {})", days));
                }
            }
        }
        if let Some(goal) = &self.intake_goal {
            if !goal.target_doses.is_finite() || goal.target_doses < 0.0 {
                errors.push(format!(
                    "Goal target must be >= 0 (got {})",
                    goal.target_doses
                ));
            }
            if let Some(max) = goal.maximum_doses {
                if !max.is_finite() || max < 0.0 {
                    errors.push(format!("Goal maximum must be >= 0 (got {})", max));
                } else if goal.constraint == GoalConstraint::Both && max < goal.target_doses {
                    errors.push(format!(
                        "Goal maximum ({}) is below the minimum ({})",
                        max, goal.target_doses
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_medication_holds_full_supply() {
        let med = Medication::prescription("Lisinopril", 20.0, 30.0);
        assert_eq!(med.total_mg_remaining, 600.0);
        assert_eq!(med.medication_type(), MedicationType::Prescription);
        assert!(med.log.is_empty());
        assert!(!med.id.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Medication::non_prescription("Vitamin D", 20.0, 100.0);
        let b = Medication::non_prescription("Vitamin D", 20.0, 100.0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_details_are_type_exclusive() {
        let rx = Medication::prescription("Rx", 10.0, 30.0);
        assert!(rx.prescription_details().is_some());
        assert!(rx.non_prescription_details().is_none());

        let otc = Medication::non_prescription("Otc", 10.0, 30.0);
        assert!(otc.prescription_details().is_none());
        assert!(otc.non_prescription_details().is_some());
    }

    #[test]
    fn test_days_supply_defaults_to_30() {
        let details = PrescriptionDetails::default();
        assert_eq!(details.days_supply(), 30.0);

        let details = PrescriptionDetails {
            number_of_days_supply: Some(90.0),
            ..Default::default()
        };
        assert_eq!(details.days_supply(), 90.0);
    }

    #[test]
    fn test_is_refill_is_sign_of_intake() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        assert!(IntakeLogEntry::new(600.0, 600.0, at).is_refill());
        assert!(!IntakeLogEntry::new(-20.0, 580.0, at).is_refill());
        assert!(!IntakeLogEntry::new(0.0, 580.0, at).is_refill());
    }

    #[test]
    fn test_sorted_log_reorders_by_timestamp() {
        let mut med = Medication::prescription("Rx", 10.0, 30.0);
        let late = Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        med.log.push(IntakeLogEntry::new(-10.0, 290.0, late));
        med.log.push(IntakeLogEntry::new(-10.0, 280.0, early));

        let sorted = med.sorted_log();
        assert_eq!(sorted[0].timestamp, early);
        assert_eq!(sorted[1].timestamp, late);
    }

    #[test]
    fn test_parse_enum_labels() {
        assert_eq!("Pill".parse::<DosageUnit>().unwrap(), DosageUnit::Pill);
        assert_eq!("mL".parse::<DosageUnit>().unwrap(), DosageUnit::Ml);
        assert_eq!(
            "Non-Prescription".parse::<MedicationType>().unwrap(),
            MedicationType::NonPrescription
        );
        assert_eq!(
            "nasal spray".parse::<MedicationForm>().unwrap(),
            MedicationForm::NasalSpray
        );
        assert_eq!("between".parse::<GoalConstraint>().unwrap(), GoalConstraint::Both);
        assert_eq!("per-week".parse::<GoalPeriod>().unwrap(), GoalPeriod::PerWeek);
        assert!("furlong".parse::<DosageUnit>().is_err());
    }

    #[test]
    fn test_parse_time_of_day() {
        let t: TimeOfDay = "08:30".parse().unwrap();
        assert_eq!(t.minutes_since_midnight(), 510);
        assert_eq!(t.to_string(), "08:30");
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("8h".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_specific_days_deduplicated() {
        let goal = IntakeGoal::at_least(1.0, GoalPeriod::PerWeek)
            .with_specific_days(vec![Weekday::Mon, Weekday::Wed, Weekday::Mon]);
        assert_eq!(goal.specific_days, Some(vec![Weekday::Mon, Weekday::Wed]));
    }

    #[test]
    fn test_validate_catches_bad_input() {
        let mut med = Medication::prescription("", -5.0, 30.0);
        med.intake_goal = Some(
            IntakeGoal::at_least(3.0, GoalPeriod::PerDay)
                .with_constraint(GoalConstraint::Both, Some(1.0)),
        );
        let errors = med.validate();
        assert_eq!(errors.len(), 3, "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_validate_rejects_non_finite_goal_maximum() {
        let mut med = Medication::prescription("Rx", 10.0, 30.0);
        for max in [f64::INFINITY, f64::NAN, -1.0] {
            med.intake_goal = Some(
                IntakeGoal::at_least(1.0, GoalPeriod::PerDay)
                    .with_constraint(GoalConstraint::NoMoreThan, Some(max)),
            );
            let errors = med.validate();
            assert_eq!(errors.len(), 1, "unexpected errors: {:?}", errors);
            assert!(errors[0].starts_with("Goal maximum must be >= 0"));
        }
    }

    #[test]
    fn test_validate_accepts_zero_rate() {
        // A zero mg-per-pill rate is degenerate but allowed
        let med = Medication::non_prescription("Cream", 0.0, 1.0);
        assert!(med.validate().is_empty());
    }

    #[test]
    fn test_serialized_details_carry_type_tag() {
        let med = Medication::non_prescription("Fish Oil", 1000.0, 60.0);
        let json = serde_json::to_value(&med).unwrap();
        assert_eq!(json["details"]["medication_type"], "non_prescription");

        let back: Medication = serde_json::from_value(json).unwrap();
        assert_eq!(back, med);
    }
}
