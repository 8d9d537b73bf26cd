//! Intake statistics over the dose log.
//!
//! These back the summary values shown on the widget surface: last dose,
//! today's total, this week's total, a rolling 7-day average and the average
//! daily intake since the last prescription fill. Refill entries are always
//! excluded and dose sizes are summed as absolute milligrams.

use crate::{Calendar, IntakeLogEntry, Medication};
use chrono::{DateTime, Duration, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

impl Medication {
    /// Most recent dose by timestamp
    pub fn last_dose(&self) -> Option<&IntakeLogEntry> {
        self.doses().max_by_key(|entry| entry.timestamp)
    }

    /// Milligrams taken since local midnight
    pub fn total_today_mg(&self, now: DateTime<Utc>, calendar: &Calendar) -> f64 {
        calendar
            .start_of_day(now)
            .map(|start| self.dose_mg_between(start, now))
            .unwrap_or(0.0)
    }

    /// Milligrams taken since the start of the current week
    pub fn weekly_intake_mg(&self, now: DateTime<Utc>, calendar: &Calendar) -> f64 {
        calendar
            .start_of_week(now)
            .map(|start| self.dose_mg_between(start, now))
            .unwrap_or(0.0)
    }

    /// Average milligrams per day over the trailing 7 days
    pub fn average_daily_intake_mg(&self, now: DateTime<Utc>) -> f64 {
        self.dose_mg_between(now - Duration::days(6), now) / 7.0
    }

    /// Average milligrams per day since the last prescription fill
    ///
    /// Elapsed time is floored at one day. 0 for non-prescriptions and
    /// prescriptions without a fill date.
    pub fn daily_average_since_refill_mg(&self, now: DateTime<Utc>) -> f64 {
        let Some(last_filled) = self
            .prescription_details()
            .and_then(|details| details.last_filled_on)
        else {
            return 0.0;
        };

        let total: f64 = self
            .doses()
            .filter(|entry| entry.timestamp >= last_filled)
            .map(|entry| entry.mg_intake.abs())
            .sum();
        let days = ((now - last_filled).num_seconds() as f64 / SECONDS_PER_DAY).max(1.0);
        total / days
    }

    fn dose_mg_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        self.doses()
            .filter(|entry| entry.timestamp >= start && entry.timestamp <= end)
            .map(|entry| entry.mg_intake.abs())
            .sum()
    }
}
