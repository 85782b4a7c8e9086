//! Prescribed exercises, exercise logs and the daily exercise plan.

use crate::types::{
    check_range, Exercise, ExerciseLog, ExerciseSlot, ExerciseStatus, ExerciseUpdate, NewExercise,
    PatientRecord,
};
use crate::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

const DEFAULT_DURATION_MINUTES: u32 = 5;

fn normalize_days(days: &[u8]) -> Result<Vec<u8>> {
    if let Some(bad) = days.iter().find(|&&d| d > 6) {
        return Err(Error::Validation(format!(
            "day of week must be 0 (Sunday) to 6 (Saturday), got {}",
            bad
        )));
    }
    let mut days = days.to_vec();
    days.sort_unstable();
    days.dedup();
    Ok(days)
}

/// Add an exercise to the plan
///
/// Defaults: five minutes, daily, every day of the week.
pub fn add_exercise(record: &mut PatientRecord, new: NewExercise) -> Result<Exercise> {
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation("exercise name is required".into()));
    }

    let days_of_week = match new.days_of_week {
        Some(days) => normalize_days(&days)?,
        None => (0..=6).collect(),
    };

    let exercise = Exercise {
        id: Uuid::new_v4(),
        name,
        description: new.description.unwrap_or_default(),
        duration_minutes: new.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
        frequency: new.frequency.unwrap_or_default(),
        days_of_week,
        instructions: new.instructions,
        is_active: true,
    };

    tracing::info!("Added exercise {} ({})", exercise.name, exercise.id);
    record.exercises.push(exercise.clone());
    Ok(exercise)
}

pub fn update_exercise(
    record: &mut PatientRecord,
    id: Uuid,
    update: ExerciseUpdate,
) -> Result<Exercise> {
    let days = update.days_of_week.as_deref().map(normalize_days).transpose()?;

    let exercise = record
        .exercises
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| Error::NotFound(format!("exercise {}", id)))?;

    if let Some(name) = update.name {
        exercise.name = name;
    }
    if let Some(description) = update.description {
        exercise.description = description;
    }
    if let Some(minutes) = update.duration_minutes {
        exercise.duration_minutes = minutes;
    }
    if let Some(days) = days {
        exercise.days_of_week = days;
    }
    if let Some(active) = update.is_active {
        exercise.is_active = active;
    }

    Ok(exercise.clone())
}

pub fn remove_exercise(record: &mut PatientRecord, id: Uuid) -> Result<Exercise> {
    let index = record
        .exercises
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| Error::NotFound(format!("exercise {}", id)))?;
    let removed = record.exercises.remove(index);
    tracing::info!("Removed exercise {}", removed.name);
    Ok(removed)
}

/// Record how an exercise went on `date`; a second entry for the same day replaces the first
pub fn log_exercise(
    record: &mut PatientRecord,
    exercise_id: Uuid,
    date: NaiveDate,
    status: ExerciseStatus,
    pain_level: Option<u8>,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<ExerciseLog> {
    if !record.exercises.iter().any(|e| e.id == exercise_id) {
        return Err(Error::NotFound(format!("exercise {}", exercise_id)));
    }
    if let Some(pain) = pain_level {
        check_range("pain level", pain, 10)?;
    }

    let log = ExerciseLog {
        id: Uuid::new_v4(),
        exercise_id,
        scheduled_date: date,
        status,
        completed_at: (status == ExerciseStatus::Completed).then_some(now),
        pain_level,
        notes,
    };

    record
        .exercise_logs
        .retain(|l| !(l.exercise_id == exercise_id && l.scheduled_date == date));
    record.exercise_logs.push(log.clone());

    tracing::info!("Logged exercise {} on {} as {:?}", exercise_id, date, status);
    Ok(log)
}

/// Active exercises scheduled on `date`'s weekday, with that day's status
pub fn today_schedule(record: &PatientRecord, date: NaiveDate) -> Vec<ExerciseSlot> {
    let weekday = date.weekday().num_days_from_sunday() as u8;

    record
        .exercises
        .iter()
        .filter(|e| e.is_active && e.days_of_week.contains(&weekday))
        .map(|e| {
            let status = record
                .exercise_logs
                .iter()
                .find(|l| l.exercise_id == e.id && l.scheduled_date == date)
                .map_or(ExerciseStatus::Pending, |l| l.status);
            ExerciseSlot {
                exercise_id: e.id,
                exercise: e.name.clone(),
                duration_minutes: e.duration_minutes,
                status,
            }
        })
        .collect()
}
