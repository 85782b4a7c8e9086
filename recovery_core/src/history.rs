//! Recovery history queries with a 7-day window.
//!
//! Recovery logs are keyed by date, so windows are plain range scans over
//! the patient's `BTreeMap`.

use crate::DailyRecoveryLog;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Days of history compared against when computing a trend
pub const TREND_WINDOW_DAYS: i64 = 7;

/// Number of most recent logs averaged on the dashboard
pub const WEEKLY_LOG_COUNT: usize = 7;

/// Scores logged in the `days` calendar days strictly before `date`
///
/// Returned oldest first. The entry for `date` itself is excluded so that
/// re-logging the same day compares against the same window.
pub fn trend_window(
    logs: &BTreeMap<NaiveDate, DailyRecoveryLog>,
    date: NaiveDate,
    days: i64,
) -> Vec<u8> {
    let start = date - Duration::days(days);
    let scores: Vec<u8> = logs
        .range(start..date)
        .map(|(_, log)| log.recovery_score)
        .collect();

    tracing::debug!(
        "Trend window {}..{} holds {} scores",
        start,
        date,
        scores.len()
    );
    scores
}

/// Most recent log by date
pub fn latest_log(logs: &BTreeMap<NaiveDate, DailyRecoveryLog>) -> Option<&DailyRecoveryLog> {
    logs.values().next_back()
}

/// Rounded averages over the most recent week of check-ins
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyAverages {
    pub medicine_adherence: u8,
    pub exercise_completion: u8,
    pub pain_score: u8,
}

/// Average the last [`WEEKLY_LOG_COUNT`] logs; all zero when there are none
pub fn weekly_averages(logs: &BTreeMap<NaiveDate, DailyRecoveryLog>) -> WeeklyAverages {
    let recent: Vec<&DailyRecoveryLog> = logs.values().rev().take(WEEKLY_LOG_COUNT).collect();
    if recent.is_empty() {
        return WeeklyAverages::default();
    }

    let average = |field: fn(&DailyRecoveryLog) -> u8| -> u8 {
        let sum: u32 = recent.iter().map(|log| u32::from(field(log))).sum();
        (f64::from(sum) / recent.len() as f64).round() as u8
    };

    WeeklyAverages {
        medicine_adherence: average(|l| l.medicine_adherence_percent),
        exercise_completion: average(|l| l.exercise_completion_percent),
        pain_score: average(|l| l.pain_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mood, Swelling, Trend};
    use chrono::Utc;
    use uuid::Uuid;

    fn create_test_log(date: NaiveDate, score: u8, adherence: u8, pain: u8) -> DailyRecoveryLog {
        DailyRecoveryLog {
            id: Uuid::new_v4(),
            log_date: date,
            day_number: None,
            medicine_adherence_percent: adherence,
            exercise_completion_percent: 50,
            pain_score: pain,
            mood: Mood::Ok,
            swelling: Swelling::Mild,
            sleep_quality: None,
            energy_level: None,
            recovery_score: score,
            trend: Trend::Stable,
            notes: None,
            symptoms: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_trend_window_excludes_today_and_old_days() {
        let mut logs = BTreeMap::new();
        for (d, score) in [(1, 10), (3, 30), (9, 90), (10, 100)] {
            logs.insert(day(d), create_test_log(day(d), score, 50, 5));
        }

        // Window for the 10th covers the 3rd through the 9th
        let window = trend_window(&logs, day(10), TREND_WINDOW_DAYS);
        assert_eq!(window, vec![30, 90]);
    }

    #[test]
    fn test_latest_log_is_by_date() {
        let mut logs = BTreeMap::new();
        logs.insert(day(5), create_test_log(day(5), 50, 50, 5));
        logs.insert(day(2), create_test_log(day(2), 20, 50, 5));

        assert_eq!(latest_log(&logs).unwrap().log_date, day(5));
        assert!(latest_log(&BTreeMap::new()).is_none());
    }

    #[test]
    fn test_weekly_averages_use_last_seven_logs() {
        let mut logs = BTreeMap::new();
        // Oldest log has extreme values and must fall outside the average
        logs.insert(day(1), create_test_log(day(1), 0, 0, 10));
        for d in 2..=8 {
            logs.insert(day(d), create_test_log(day(d), 60, 90, 3));
        }
        let avg = weekly_averages(&logs);
        assert_eq!(avg.medicine_adherence, 90);
        assert_eq!(avg.pain_score, 3);
        assert_eq!(avg.exercise_completion, 50);
    }

    #[test]
    fn test_weekly_averages_round() {
        let mut logs = BTreeMap::new();
        logs.insert(day(1), create_test_log(day(1), 0, 80, 2));
        logs.insert(day(2), create_test_log(day(2), 0, 85, 3));
        let avg = weekly_averages(&logs);
        assert_eq!(avg.medicine_adherence, 83); // 82.5 rounds up
        assert_eq!(avg.pain_score, 3); // 2.5 rounds up
    }

    #[test]
    fn test_weekly_averages_empty() {
        assert_eq!(weekly_averages(&BTreeMap::new()), WeeklyAverages::default());
    }
}
