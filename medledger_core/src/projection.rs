//! Read-only medication snapshot for widgets, shortcuts and `show --json`.

use crate::{Calendar, DosageUnit, Medication, MedicationForm, MedicationType};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything a status surface needs about one medication at `now`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MedicationSnapshot {
    pub id: String,
    pub name: String,
    pub medication_type: MedicationType,
    pub form: MedicationForm,

    pub total_mg_remaining: f64,
    pub mg_per_pill: f64,
    pub pills_remaining: f64,
    pub daily_dosage: Option<f64>,
    pub daily_dosage_unit: Option<DosageUnit>,

    pub next_dose_time: Option<DateTime<Utc>>,
    pub last_filled_on: Option<DateTime<Utc>>,
    pub next_fill_date: Option<DateTime<Utc>>,
    pub refills_remaining: Option<u32>,
    pub pills_per_day_left: f64,
    pub days_until_refill: i64,

    pub goal_completed: Option<u32>,
    pub goal_target: Option<f64>,
    pub doses_left_in_period: Option<f64>,
    /// Only present when a goal is set
    pub adherence_streak: Option<u32>,

    pub last_dose_at: Option<DateTime<Utc>>,
    pub total_today_mg: f64,
    pub weekly_intake_mg: f64,
    pub average_daily_intake_mg: f64,
    pub daily_average_since_refill_mg: f64,
}

impl MedicationSnapshot {
    pub fn new(med: &Medication, now: DateTime<Utc>, calendar: &Calendar) -> Self {
        let rx = med.prescription_details();
        let progress = med.goal_progress(now, calendar);

        Self {
            id: med.id.clone(),
            name: med.name.clone(),
            medication_type: med.medication_type(),
            form: med.form,
            total_mg_remaining: med.total_mg_remaining,
            mg_per_pill: med.mg_per_pill,
            pills_remaining: med.pills_remaining(),
            daily_dosage: med.daily_dosage,
            daily_dosage_unit: med.daily_dosage_unit,
            next_dose_time: med.calculated_next_dose_time(now, calendar),
            last_filled_on: rx.and_then(|d| d.last_filled_on),
            next_fill_date: rx.and_then(|d| d.next_fill_date),
            refills_remaining: rx.and_then(|d| d.refills_remaining),
            pills_per_day_left: med.pills_per_day_left(now),
            days_until_refill: med.days_until_refill(now, calendar),
            goal_completed: progress.map(|p| p.completed),
            goal_target: progress.map(|p| p.target),
            doses_left_in_period: med.doses_left_in_period(now, calendar),
            adherence_streak: med
                .intake_goal
                .as_ref()
                .map(|_| med.adherence_streak(now, calendar)),
            last_dose_at: med.last_dose().map(|entry| entry.timestamp),
            total_today_mg: med.total_today_mg(now, calendar),
            weekly_intake_mg: med.weekly_intake_mg(now, calendar),
            average_daily_intake_mg: med.average_daily_intake_mg(now),
            daily_average_since_refill_mg: med.daily_average_since_refill_mg(now),
        }
    }
}
