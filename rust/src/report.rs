//! Completion metrics derived from a schedule.

use chrono::{NaiveDate, NaiveDateTime};
use pyo3::prelude::*;
use std::collections::BTreeSet;

use crate::calendar::LabCalendar;
use crate::models::ScheduleResult;

/// Business-day turnaround of a run.
///
/// Business days are counted inclusively from the run's start date to the
/// milestone date, so work finishing on the start day counts as one day.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletionSummary {
    /// Business days until at least half of the samples were finished.
    #[pyo3(get)]
    pub business_days_to_half: Option<usize>,
    /// Business days until every sample was finished.
    #[pyo3(get)]
    pub business_days_to_full: Option<usize>,
    #[pyo3(get)]
    pub date_half: Option<NaiveDate>,
    #[pyo3(get)]
    pub date_full: Option<NaiveDate>,
}

#[pymethods]
impl CompletionSummary {
    fn __repr__(&self) -> String {
        format!(
            "CompletionSummary(days_to_half={:?}, days_to_full={:?}, date_half={:?}, date_full={:?})",
            self.business_days_to_half,
            self.business_days_to_full,
            self.date_half,
            self.date_full
        )
    }
}

/// Completion timestamp of each sample: the planned end of its last event.
/// Samples without events have none.
pub fn completion_times(result: &ScheduleResult) -> Vec<Option<NaiveDateTime>> {
    result
        .sample_events
        .iter()
        .map(|events| events.iter().map(|e| e.planned_end).max())
        .collect()
}

/// Cumulative number of finished samples on every date some event ends.
pub fn burn_series(result: &ScheduleResult) -> Vec<(NaiveDate, usize)> {
    let dates: BTreeSet<NaiveDate> = result
        .sample_events
        .iter()
        .flatten()
        .map(|e| e.planned_end.date())
        .collect();

    let mut finished: Vec<NaiveDate> = completion_times(result)
        .into_iter()
        .flatten()
        .map(|ts| ts.date())
        .collect();
    finished.sort_unstable();

    dates
        .into_iter()
        .map(|date| (date, finished.partition_point(|&d| d <= date)))
        .collect()
}

/// Days to 50% and 100% of samples finished, measured on `calendar`.
pub fn summarize_completion(result: &ScheduleResult, calendar: &LabCalendar) -> CompletionSummary {
    let total = result.sample_count();
    let series = burn_series(result);

    let milestone = |needed: usize| {
        series
            .iter()
            .find(|&&(_, done)| done >= needed)
            .map(|&(date, _)| date)
    };
    // "At least half" with odd counts rounds up
    let date_half = milestone(total.div_ceil(2)).filter(|_| total > 0);
    let date_full = milestone(total).filter(|_| total > 0);

    let start_date = result.start.date();
    let days_to = |date: Option<NaiveDate>| date.map(|d| calendar.business_days_between(start_date, d));

    CompletionSummary {
        business_days_to_half: days_to(date_half),
        business_days_to_full: days_to(date_full),
        date_half,
        date_full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarConfig;
    use crate::models::StepEvent;
    use std::collections::HashMap;

    fn dt(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn event(step: &str, start: NaiveDateTime, end: NaiveDateTime) -> StepEvent {
        StepEvent {
            step: step.to_string(),
            planned_start: start,
            planned_end: end,
            duration_minutes: (end - start).num_minutes(),
            role: "tech".to_string(),
            batch: 0,
            staff_slot: 0,
            equipment_slot: None,
        }
    }

    /// Three samples finishing Monday, Tuesday and the following Monday.
    fn result() -> ScheduleResult {
        ScheduleResult {
            start: dt(2025, 6, 16, 9, 0),
            sample_events: vec![
                vec![
                    event("Prep", dt(2025, 6, 16, 9, 0), dt(2025, 6, 16, 10, 0)),
                    event("Scan", dt(2025, 6, 16, 10, 0), dt(2025, 6, 16, 11, 0)),
                ],
                vec![
                    event("Prep", dt(2025, 6, 16, 10, 0), dt(2025, 6, 16, 11, 0)),
                    event("Scan", dt(2025, 6, 17, 9, 0), dt(2025, 6, 17, 10, 0)),
                ],
                vec![
                    event("Prep", dt(2025, 6, 16, 11, 0), dt(2025, 6, 16, 12, 0)),
                    event("Scan", dt(2025, 6, 23, 9, 0), dt(2025, 6, 23, 10, 0)),
                ],
            ],
            algorithm_metadata: HashMap::new(),
        }
    }

    fn calendar() -> LabCalendar {
        LabCalendar::new(&CalendarConfig::default()).unwrap()
    }

    #[test]
    fn test_completion_times() {
        assert_eq!(
            completion_times(&result()),
            vec![
                Some(dt(2025, 6, 16, 11, 0)),
                Some(dt(2025, 6, 17, 10, 0)),
                Some(dt(2025, 6, 23, 10, 0)),
            ]
        );
    }

    #[test]
    fn test_burn_series_is_cumulative() {
        assert_eq!(
            burn_series(&result()),
            vec![(d(2025, 6, 16), 1), (d(2025, 6, 17), 2), (d(2025, 6, 23), 3)]
        );
    }

    #[test]
    fn test_summary_counts_business_days_inclusively() {
        let summary = summarize_completion(&result(), &calendar());
        assert_eq!(summary.date_half, Some(d(2025, 6, 17)));
        assert_eq!(summary.business_days_to_half, Some(2));
        assert_eq!(summary.date_full, Some(d(2025, 6, 23)));
        // Mon-Fri plus the following Monday
        assert_eq!(summary.business_days_to_full, Some(6));
    }

    #[test]
    fn test_summary_skips_holidays() {
        let config = CalendarConfig {
            holidays: vec![d(2025, 6, 19)],
            ..CalendarConfig::default()
        };
        let calendar = LabCalendar::new(&config).unwrap();
        let summary = summarize_completion(&result(), &calendar);
        assert_eq!(summary.business_days_to_full, Some(5));
    }

    #[test]
    fn test_empty_result() {
        let empty = ScheduleResult {
            start: dt(2025, 6, 16, 9, 0),
            sample_events: Vec::new(),
            algorithm_metadata: HashMap::new(),
        };
        assert_eq!(summarize_completion(&empty, &calendar()), CompletionSummary::default());
        assert!(burn_series(&empty).is_empty());
    }
}
