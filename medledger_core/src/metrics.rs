//! Derived supply metrics.
//!
//! All functions here are pure reads of a medication. Degenerate inputs
//! (zero rate, missing dates) produce a fallback value instead of an error.

use crate::{Calendar, Medication};
use chrono::{DateTime, Days, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

impl Medication {
    /// Remaining supply in pills, or 0 when the mg-per-pill rate is not positive
    pub fn pills_remaining(&self) -> f64 {
        if self.mg_per_pill <= 0.0 {
            return 0.0;
        }
        self.total_mg_remaining / self.mg_per_pill
    }

    /// Pills per day available until the next fill date, to one decimal
    ///
    /// Only meaningful for prescriptions with a future fill date; 0 otherwise.
    pub fn pills_per_day_left(&self, now: DateTime<Utc>) -> f64 {
        let Some(next_fill) = self
            .prescription_details()
            .and_then(|details| details.next_fill_date)
        else {
            return 0.0;
        };

        let days_left = (next_fill - now).num_milliseconds() as f64 / MILLIS_PER_DAY;
        if days_left <= 0.0 {
            return 0.0;
        }
        let pills_per_day = self.pills_remaining() / days_left;
        (pills_per_day * 10.0).round() / 10.0
    }

    /// Calendar days until the next fill date, floored at 0
    pub fn days_until_refill(&self, now: DateTime<Utc>, calendar: &Calendar) -> i64 {
        self.prescription_details()
            .and_then(|details| details.next_fill_date)
            .map(|next_fill| calendar.days_between(now, next_fill).max(0))
            .unwrap_or(0)
    }

    /// When the next dose is due
    ///
    /// An explicit `next_dose_time` wins. Otherwise the goal's times of day
    /// are scanned for the first one still ahead today, wrapping to the
    /// earliest time tomorrow.
    pub fn calculated_next_dose_time(
        &self,
        now: DateTime<Utc>,
        calendar: &Calendar,
    ) -> Option<DateTime<Utc>> {
        if let Some(manual) = self.next_dose_time {
            return Some(manual);
        }

        let mut times = self
            .intake_goal
            .as_ref()
            .and_then(|goal| goal.times_of_day.clone())
            .filter(|times| !times.is_empty())?;
        times.sort_by_key(|t| t.minutes_since_midnight());

        let today = calendar.local_date(now);
        for time in &times {
            if let Some(scheduled) = calendar.at_time(today, time.hour, time.minute) {
                if scheduled > now {
                    return Some(scheduled);
                }
            }
        }

        let earliest = times.first()?;
        let tomorrow = today.checked_add_days(Days::new(1))?;
        calendar.at_time(tomorrow, earliest.hour, earliest.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GoalPeriod, IntakeGoal, TimeOfDay};
    use chrono::{Duration, TimeZone, Weekday};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap()
    }

    fn cal() -> Calendar {
        Calendar::utc(Weekday::Sun)
    }

    fn rx_due_in(delta: Duration) -> Medication {
        let mut med = Medication::prescription("Rx", 20.0, 30.0);
        if let Some(details) = med.prescription_details_mut() {
            details.next_fill_date = Some(now() + delta);
        }
        med
    }

    #[test]
    fn test_pills_remaining() {
        let med = Medication::prescription("Rx", 20.0, 30.0);
        assert_eq!(med.pills_remaining(), 30.0);

        let med = med.with_total_mg_remaining(-40.0);
        assert_eq!(med.pills_remaining(), -2.0);
    }

    #[test]
    fn test_pills_remaining_zero_rate() {
        let med = Medication::prescription("Rx", 0.0, 30.0).with_total_mg_remaining(500.0);
        assert_eq!(med.pills_remaining(), 0.0);

        let med = Medication::prescription("Rx", -1.0, 30.0).with_total_mg_remaining(500.0);
        assert_eq!(med.pills_remaining(), 0.0);
    }

    #[test]
    fn test_pills_per_day_left() {
        // 30 pills over 20 days
        let med = rx_due_in(Duration::days(20));
        assert_eq!(med.pills_per_day_left(now()), 1.5);

        // 30 pills over 7 days = 4.2857 -> 4.3
        let med = rx_due_in(Duration::days(7));
        assert_eq!(med.pills_per_day_left(now()), 4.3);
    }

    #[test]
    fn test_pills_per_day_left_fallbacks() {
        assert_eq!(rx_due_in(Duration::days(-1)).pills_per_day_left(now()), 0.0);
        assert_eq!(rx_due_in(Duration::zero()).pills_per_day_left(now()), 0.0);

        let no_date = Medication::prescription("Rx", 20.0, 30.0);
        assert_eq!(no_date.pills_per_day_left(now()), 0.0);

        let otc = Medication::non_prescription("Otc", 20.0, 30.0);
        assert_eq!(otc.pills_per_day_left(now()), 0.0);
    }

    #[test]
    fn test_days_until_refill() {
        assert_eq!(rx_due_in(Duration::days(10)).days_until_refill(now(), &cal()), 10);
        // 13 hours ahead crosses midnight: one calendar day
        assert_eq!(rx_due_in(Duration::hours(13)).days_until_refill(now(), &cal()), 1);
        assert_eq!(rx_due_in(Duration::days(-3)).days_until_refill(now(), &cal()), 0);
        assert_eq!(
            Medication::prescription("Rx", 20.0, 30.0).days_until_refill(now(), &cal()),
            0
        );
    }

    #[test]
    fn test_next_dose_time_override_wins() {
        let at = now() + Duration::hours(3);
        let med = Medication::prescription("Rx", 20.0, 30.0)
            .with_next_dose_time(at)
            .with_goal(
                IntakeGoal::at_least(1.0, GoalPeriod::PerDay)
                    .with_times_of_day(vec![TimeOfDay::new(13, 0).unwrap()]),
            );
        assert_eq!(med.calculated_next_dose_time(now(), &cal()), Some(at));
    }

    #[test]
    fn test_next_dose_time_from_goal_times() {
        let med = Medication::prescription("Rx", 20.0, 30.0).with_goal(
            IntakeGoal::at_least(2.0, GoalPeriod::PerDay).with_times_of_day(vec![
                TimeOfDay::new(20, 0).unwrap(),
                TimeOfDay::new(8, 0).unwrap(),
                TimeOfDay::new(14, 30).unwrap(),
            ]),
        );
        assert_eq!(
            med.calculated_next_dose_time(now(), &cal()),
            Some(Utc.with_ymd_and_hms(2025, 3, 5, 14, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_next_dose_time_wraps_to_earliest_tomorrow() {
        let med = Medication::prescription("Rx", 20.0, 30.0).with_goal(
            IntakeGoal::at_least(2.0, GoalPeriod::PerDay).with_times_of_day(vec![
                TimeOfDay::new(11, 0).unwrap(),
                TimeOfDay::new(7, 15).unwrap(),
            ]),
        );
        assert_eq!(
            med.calculated_next_dose_time(now(), &cal()),
            Some(Utc.with_ymd_and_hms(2025, 3, 6, 7, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_next_dose_time_strictly_later() {
        // A time equal to now is not "later"
        let med = Medication::prescription("Rx", 20.0, 30.0).with_goal(
            IntakeGoal::at_least(1.0, GoalPeriod::PerDay)
                .with_times_of_day(vec![TimeOfDay::new(12, 0).unwrap()]),
        );
        assert_eq!(
            med.calculated_next_dose_time(now(), &cal()),
            Some(Utc.with_ymd_and_hms(2025, 3, 6, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_next_dose_time_undefined() {
        let med = Medication::prescription("Rx", 20.0, 30.0);
        assert_eq!(med.calculated_next_dose_time(now(), &cal()), None);

        let med = med.with_goal(IntakeGoal::at_least(1.0, GoalPeriod::PerDay).with_times_of_day(vec![]));
        assert_eq!(med.calculated_next_dose_time(now(), &cal()), None);
    }

    #[test]
    fn test_metrics_are_idempotent() {
        let med = rx_due_in(Duration::days(9));
        assert_eq!(med.pills_per_day_left(now()), med.pills_per_day_left(now()));
        assert_eq!(
            med.days_until_refill(now(), &cal()),
            med.days_until_refill(now(), &cal())
        );
        assert_eq!(med.pills_remaining(), med.pills_remaining());
    }
}
