//! Calendar arithmetic for goal periods and day counts.
//!
//! A `Calendar` pins the two locale-dependent choices the goal engine needs:
//! the UTC offset that defines local midnight, and the first day of the week.
//! Boundary computations return `None` only when chrono cannot represent the
//! result (dates at the edge of the supported range).

use crate::GoalPeriod;
use chrono::{
    DateTime, Datelike, Days, FixedOffset, Local, Months, NaiveDate, NaiveTime, Offset, TimeZone,
    Utc, Weekday,
};

/// Fixed-offset calendar with a configurable week start
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
    week_start: Weekday,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc(Weekday::Sun)
    }
}

impl Calendar {
    pub fn new(offset: FixedOffset, week_start: Weekday) -> Self {
        Self { offset, week_start }
    }

    /// Calendar in UTC
    pub fn utc(week_start: Weekday) -> Self {
        Self::new(Utc.fix(), week_start)
    }

    /// Calendar at the machine's current local offset
    pub fn local(week_start: Weekday) -> Self {
        Self::new(Local::now().offset().fix(), week_start)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// Local calendar date of an instant
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Local wall-clock time of an instant
    pub fn local_time(&self, at: DateTime<Utc>) -> NaiveTime {
        at.with_timezone(&self.offset).time()
    }

    /// The instant at which local `date` reaches `hour:minute`
    pub fn at_time(&self, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
        let naive = date.and_hms_opt(hour, minute, 0)?;
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// The instant of local midnight at the start of `date`
    pub fn midnight(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.at_time(date, 0, 0)
    }

    pub fn start_of_day(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.midnight(self.local_date(at))
    }

    pub fn start_of_week(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.midnight(self.week_start_date(self.local_date(at))?)
    }

    pub fn start_of_month(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.midnight(self.local_date(at).with_day(1)?)
    }

    /// Start of the `period` window containing `at`
    pub fn period_start(&self, period: GoalPeriod, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match period {
            GoalPeriod::PerDay => self.start_of_day(at),
            GoalPeriod::PerWeek => self.start_of_week(at),
            GoalPeriod::PerMonth => self.start_of_month(at),
        }
    }

    /// Half-open `[start, end)` window of the `period` containing `at`
    pub fn period_window(
        &self,
        period: GoalPeriod,
        at: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let date = self.local_date(at);
        let first = match period {
            GoalPeriod::PerDay => date,
            GoalPeriod::PerWeek => self.week_start_date(date)?,
            GoalPeriod::PerMonth => date.with_day(1)?,
        };
        let next = match period {
            GoalPeriod::PerDay => first.checked_add_days(Days::new(1))?,
            GoalPeriod::PerWeek => first.checked_add_days(Days::new(7))?,
            GoalPeriod::PerMonth => first.checked_add_months(Months::new(1))?,
        };
        Some((self.midnight(first)?, self.midnight(next)?))
    }

    /// Whole local calendar days from `from` to `to` (negative if `to` is earlier)
    pub fn days_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
        (self.local_date(to) - self.local_date(from)).num_days()
    }

    fn week_start_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        let today = date.weekday().num_days_from_monday();
        let start = self.week_start.num_days_from_monday();
        let back = (7 + today - start) % 7;
        date.checked_sub_days(Days::new(u64::from(back)))
    }
}
