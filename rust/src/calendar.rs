//! Business-calendar time arithmetic.
//!
//! Converts abstract work-minute durations into wall-clock timestamps that
//! respect workdays, holidays and a single daily work window
//! `[window_start, window_start + work_hours_per_day)`.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use pyo3::prelude::*;
use rustc_hash::FxHashSet;
use std::collections::HashSet;
use thiserror::Error;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Errors detected while validating a calendar configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Calendar has no workdays")]
    NoWorkdays,
    #[error("Invalid weekday number {0} (expected 0=Monday..6=Sunday)")]
    InvalidWeekday(u8),
    #[error("Invalid work hours per day: {0} (expected 0 < hours <= 24)")]
    InvalidWorkHours(f64),
    #[error("Work window starting at {start} with {hours}h runs past midnight")]
    WindowPastMidnight { start: NaiveTime, hours: f64 },
}

/// Calendar settings: which days are worked and when.
#[pyclass]
#[derive(Clone, Debug)]
pub struct CalendarConfig {
    /// Weekday numbers that are workdays (0=Monday .. 6=Sunday).
    #[pyo3(get, set)]
    pub workdays: HashSet<u8>,
    /// Dates that are never worked, regardless of weekday.
    #[pyo3(get, set)]
    pub holidays: Vec<NaiveDate>,
    /// Start of the daily work window.
    #[pyo3(get, set)]
    pub work_window_start: NaiveTime,
    /// Length of the daily work window in hours.
    #[pyo3(get, set)]
    pub work_hours_per_day: f64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            workdays: (0..5).collect(),
            holidays: Vec::new(),
            work_window_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            work_hours_per_day: 7.0,
        }
    }
}

#[pymethods]
impl CalendarConfig {
    #[new]
    #[pyo3(signature = (workdays=None, holidays=None, work_window_start=None, work_hours_per_day=None))]
    fn new(
        workdays: Option<HashSet<u8>>,
        holidays: Option<Vec<NaiveDate>>,
        work_window_start: Option<NaiveTime>,
        work_hours_per_day: Option<f64>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            workdays: workdays.unwrap_or(defaults.workdays),
            holidays: holidays.unwrap_or(defaults.holidays),
            work_window_start: work_window_start.unwrap_or(defaults.work_window_start),
            work_hours_per_day: work_hours_per_day.unwrap_or(defaults.work_hours_per_day),
        }
    }

    fn __repr__(&self) -> String {
        let mut workdays: Vec<u8> = self.workdays.iter().copied().collect();
        workdays.sort_unstable();
        format!(
            "CalendarConfig(workdays={:?}, holidays={}, window_start={}, hours={})",
            workdays,
            self.holidays.len(),
            self.work_window_start,
            self.work_hours_per_day
        )
    }
}

/// Validated business calendar.
///
/// Construction rejects configurations under which `next_workday` could
/// never terminate (no workdays) or whose window crosses midnight.
#[derive(Clone, Debug)]
pub struct LabCalendar {
    workdays: [bool; 7],
    holidays: FxHashSet<NaiveDate>,
    window_start: NaiveTime,
    window_minutes: i64,
}

impl LabCalendar {
    pub fn new(config: &CalendarConfig) -> Result<Self, CalendarError> {
        let mut workdays = [false; 7];
        for &day in &config.workdays {
            if day > 6 {
                return Err(CalendarError::InvalidWeekday(day));
            }
            workdays[day as usize] = true;
        }
        if !workdays.iter().any(|&w| w) {
            return Err(CalendarError::NoWorkdays);
        }

        let hours = config.work_hours_per_day;
        if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
            return Err(CalendarError::InvalidWorkHours(hours));
        }
        let window_minutes = (hours * 60.0).round() as i64;
        let start_minute = i64::from(config.work_window_start.num_seconds_from_midnight()) / 60;
        if window_minutes == 0 || start_minute + window_minutes > MINUTES_PER_DAY {
            return Err(CalendarError::WindowPastMidnight {
                start: config.work_window_start,
                hours,
            });
        }

        Ok(Self {
            workdays,
            holidays: config.holidays.iter().copied().collect(),
            window_start: config.work_window_start,
            window_minutes,
        })
    }

    /// Productive minutes in one workday.
    pub fn window_minutes(&self) -> i64 {
        self.window_minutes
    }

    pub fn is_workday(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday().num_days_from_monday() as usize;
        self.workdays[weekday] && !self.holidays.contains(&date)
    }

    /// Smallest workday strictly after `date`.
    pub fn next_workday(&self, date: NaiveDate) -> NaiveDate {
        let mut next = date;
        loop {
            next = match next.checked_add_days(Days::new(1)) {
                Some(d) => d,
                None => return next,
            };
            if self.is_workday(next) {
                return next;
            }
        }
    }

    fn window_start_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.window_start)
    }

    fn window_end_on(&self, date: NaiveDate) -> NaiveDateTime {
        self.window_start_on(date) + Duration::minutes(self.window_minutes)
    }

    /// Move `ts` forward to the nearest calendar-valid instant.
    ///
    /// Inside a workday window the timestamp is returned unchanged; before
    /// the window it moves to the window start; otherwise it moves to the
    /// window start of the next workday. The window end itself is not
    /// inside the window.
    pub fn snap(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let date = ts.date();
        if !self.is_workday(date) || ts >= self.window_end_on(date) {
            return self.window_start_on(self.next_workday(date));
        }
        ts.max(self.window_start_on(date))
    }

    /// Advance `start` by `minutes` of productive time.
    ///
    /// `minutes == 0` only snaps. Minutes that do not fit in the current
    /// window roll over to the next workday's window start.
    pub fn add_work_minutes(&self, start: NaiveDateTime, minutes: i64) -> NaiveDateTime {
        let mut current = self.snap(start);
        let mut remaining = minutes.max(0);

        while remaining > 0 {
            let date = current.date();
            let available = (self.window_end_on(date) - current).num_minutes().max(0);
            let worked = remaining.min(available);
            current += Duration::minutes(worked);
            remaining -= worked;
            if remaining > 0 {
                current = self.window_start_on(self.next_workday(date));
            }
        }

        current
    }

    /// Productive minutes between two timestamps (0 if `end <= start`).
    pub fn work_minutes_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        let mut current = start;
        let mut total = 0;

        while current < end {
            let date = current.date();
            if !self.is_workday(date) {
                current = self.window_start_on(self.next_workday(date));
                continue;
            }
            let window_end = self.window_end_on(date);
            current = current.max(self.window_start_on(date));
            if current >= end {
                break;
            }
            if current >= window_end {
                current = self.window_start_on(self.next_workday(date));
                continue;
            }
            let stop = window_end.min(end);
            total += (stop - current).num_minutes();
            current = stop;
        }

        total
    }

    /// Workdays in `[start, end]`, both ends inclusive.
    pub fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_workday(*d))
            .count()
    }
}
