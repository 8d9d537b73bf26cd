//! Goal engine: period dose counts, progress, constraint checks and streaks.
//!
//! ## Counting rules
//!
//! - Only non-refill entries count as doses; each entry is one dose no matter
//!   its size.
//! - A goal's `specific_days` and `start_date` are not applied as filters.
//!   Every dose inside the period window counts.
//!
//! ## Streaks
//!
//! The streak walks backwards one period at a time starting with the current
//! period, and stops at the first period whose dose count is below
//! `target_doses` (the minimum only, whatever the constraint type).

use crate::{Calendar, GoalConstraint, GoalProgress, Medication};
use chrono::{DateTime, Duration, Utc};

/// Upper bound on periods examined by [`Medication::adherence_streak`]
pub const MAX_STREAK_PERIODS: u32 = 365;

impl Medication {
    /// Doses logged since the start of the goal's current period
    ///
    /// 0 when there is no goal.
    pub fn doses_in_current_period(&self, now: DateTime<Utc>, calendar: &Calendar) -> u32 {
        let Some(goal) = &self.intake_goal else {
            return 0;
        };
        let period_start = calendar.period_start(goal.period, now).unwrap_or(now);

        self.doses()
            .filter(|entry| entry.timestamp >= period_start)
            .count() as u32
    }

    /// Doses this period against the goal's headline target
    pub fn goal_progress(&self, now: DateTime<Utc>, calendar: &Calendar) -> Option<GoalProgress> {
        let goal = self.intake_goal.as_ref()?;
        let target = match goal.constraint {
            GoalConstraint::AtLeast | GoalConstraint::Both => goal.target_doses,
            GoalConstraint::NoMoreThan => goal.cap(),
        };

        Some(GoalProgress {
            completed: self.doses_in_current_period(now, calendar),
            target,
        })
    }

    /// Upper dose bound of a `NoMoreThan` or `Both` goal
    pub fn goal_maximum(&self) -> Option<f64> {
        let goal = self.intake_goal.as_ref()?;
        match goal.constraint {
            GoalConstraint::NoMoreThan | GoalConstraint::Both => Some(goal.cap()),
            GoalConstraint::AtLeast => None,
        }
    }

    /// Whether `dose_count` satisfies the goal's constraint (false without a goal)
    pub fn meets_goal_for_period(&self, dose_count: u32) -> bool {
        let Some(goal) = &self.intake_goal else {
            return false;
        };
        let count = f64::from(dose_count);

        match goal.constraint {
            GoalConstraint::AtLeast => count >= goal.target_doses,
            GoalConstraint::NoMoreThan => count <= goal.cap(),
            GoalConstraint::Both => {
                count >= goal.target_doses && count <= goal.maximum_doses.unwrap_or(f64::INFINITY)
            }
        }
    }

    /// Doses still needed to reach this period's target, floored at 0
    pub fn doses_left_in_period(&self, now: DateTime<Utc>, calendar: &Calendar) -> Option<f64> {
        self.goal_progress(now, calendar)
            .map(|progress| (progress.target - f64::from(progress.completed)).max(0.0))
    }

    /// Consecutive periods, ending with the current one, that met the minimum target
    pub fn adherence_streak(&self, now: DateTime<Utc>, calendar: &Calendar) -> u32 {
        let Some(goal) = &self.intake_goal else {
            return 0;
        };

        let mut streak = 0;
        let mut cursor = now;
        for _ in 0..MAX_STREAK_PERIODS {
            let Some((start, end)) = calendar.period_window(goal.period, cursor) else {
                tracing::debug!("Period boundary unavailable at {}, stopping streak", cursor);
                break;
            };

            let count = self
                .doses()
                .filter(|entry| entry.timestamp >= start && entry.timestamp < end)
                .count();

            if (count as f64) < goal.target_doses {
                break;
            }
            streak += 1;

            // Any instant inside the preceding period
            match start.checked_sub_signed(Duration::seconds(1)) {
                Some(previous) => cursor = previous,
                None => break,
            }
        }

        streak
    }
}
