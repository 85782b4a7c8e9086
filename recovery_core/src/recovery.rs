//! Daily check-in logging and the recovery dashboard.
//!
//! A check-in is defaulted, scored, compared with the trailing week and
//! upserted under its date. Logging the same date twice recomputes and
//! overwrites that day's entry; the latest write wins.

use crate::history::{latest_log, trend_window, weekly_averages, WeeklyAverages, TREND_WINDOW_DAYS};
use crate::score::{compute_score, compute_trend};
use crate::types::{CheckIn, DailyRecoveryLog, DoseStatus, ExerciseStatus, PatientRecord, Trend};
use crate::{exercises, medications, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Record a check-in for `date`, returning the stored log
pub fn log_check_in(
    record: &mut PatientRecord,
    date: NaiveDate,
    check_in: &CheckIn,
    now: DateTime<Utc>,
) -> Result<DailyRecoveryLog> {
    let input = check_in.to_input()?;
    let score = compute_score(&input);
    let history = trend_window(&record.recovery_logs, date, TREND_WINDOW_DAYS);
    let trend = compute_trend(score, &history);

    let (id, created_at) = match record.recovery_logs.get(&date) {
        Some(existing) => {
            tracing::info!("Replacing check-in for {}", date);
            (existing.id, existing.created_at)
        }
        None => (Uuid::new_v4(), now),
    };

    let log = DailyRecoveryLog {
        id,
        log_date: date,
        day_number: record.profile.day_number(date),
        medicine_adherence_percent: input.medicine_adherence_percent,
        exercise_completion_percent: input.exercise_completion_percent,
        pain_score: input.pain_score,
        mood: input.mood,
        swelling: input.swelling,
        sleep_quality: check_in.sleep_quality,
        energy_level: check_in.energy_level,
        recovery_score: score,
        trend,
        notes: check_in.notes.clone(),
        symptoms: check_in.symptoms.clone(),
        created_at,
        updated_at: now,
    };

    record.recovery_logs.insert(date, log.clone());

    tracing::info!(
        "Check-in for {}: score {} ({}) against {} prior scores",
        date,
        score,
        trend,
        history.len()
    );

    Ok(log)
}

/// Summary shown on the patient's home screen
#[derive(Clone, Debug, Serialize)]
pub struct Dashboard {
    pub days_since_surgery: Option<i64>,
    pub last_check_in: Option<NaiveDate>,
    pub recovery_score: Option<u8>,
    pub trend: Option<Trend>,
    pub weekly: WeeklyAverages,
    pub doses_taken_today: usize,
    pub doses_scheduled_today: usize,
    pub exercises_completed_today: usize,
    pub exercises_scheduled_today: usize,
}

pub fn dashboard(record: &PatientRecord, today: NaiveDate) -> Dashboard {
    let latest = latest_log(&record.recovery_logs);
    let doses = medications::today_schedule(record, today);
    let sessions = exercises::today_schedule(record, today);

    Dashboard {
        days_since_surgery: record.profile.day_number(today),
        last_check_in: latest.map(|l| l.log_date),
        recovery_score: latest.map(|l| l.recovery_score),
        trend: latest.map(|l| l.trend),
        weekly: weekly_averages(&record.recovery_logs),
        doses_taken_today: doses.iter().filter(|d| d.status == DoseStatus::Taken).count(),
        doses_scheduled_today: doses.len(),
        exercises_completed_today: sessions
            .iter()
            .filter(|s| s.status == ExerciseStatus::Completed)
            .count(),
        exercises_scheduled_today: sessions.len(),
    }
}
