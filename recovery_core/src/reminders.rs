//! Reminders for doses, exercises, meals and anything else.

use crate::types::{PatientRecord, Reminder, ReminderKind};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum reminders returned by [`upcoming`]
pub const UPCOMING_LIMIT: usize = 5;

pub fn add_reminder(
    record: &mut PatientRecord,
    kind: ReminderKind,
    title: &str,
    message: Option<String>,
    scheduled_at: DateTime<Utc>,
    recurring: bool,
) -> Result<Reminder> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("reminder title is required".into()));
    }

    let reminder = Reminder {
        id: Uuid::new_v4(),
        kind,
        title: title.to_string(),
        message: message.unwrap_or_default(),
        scheduled_at,
        recurring,
        is_active: true,
    };

    tracing::info!("Added reminder '{}' at {}", reminder.title, reminder.scheduled_at);
    record.reminders.push(reminder.clone());
    Ok(reminder)
}

/// All reminders ordered by scheduled time
pub fn list_reminders(record: &PatientRecord) -> Vec<&Reminder> {
    let mut reminders: Vec<&Reminder> = record.reminders.iter().collect();
    reminders.sort_by_key(|r| r.scheduled_at);
    reminders
}

/// The next few active reminders due at or after `now`
pub fn upcoming(record: &PatientRecord, now: DateTime<Utc>) -> Vec<&Reminder> {
    let mut due: Vec<&Reminder> = record
        .reminders
        .iter()
        .filter(|r| r.is_active && r.scheduled_at >= now)
        .collect();
    due.sort_by_key(|r| r.scheduled_at);
    due.truncate(UPCOMING_LIMIT);
    due
}

/// Flip a reminder between active and paused
pub fn toggle_reminder(record: &mut PatientRecord, id: Uuid) -> Result<Reminder> {
    let reminder = record
        .reminders
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| Error::NotFound(format!("reminder {}", id)))?;
    reminder.is_active = !reminder.is_active;
    tracing::info!("Reminder {} active: {}", id, reminder.is_active);
    Ok(reminder.clone())
}

pub fn remove_reminder(record: &mut PatientRecord, id: Uuid) -> Result<Reminder> {
    let index = record
        .reminders
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| Error::NotFound(format!("reminder {}", id)))?;
    Ok(record.reminders.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap()
    }

    fn add_at(record: &mut PatientRecord, title: &str, offset_hours: i64) -> Reminder {
        add_reminder(
            record,
            ReminderKind::Medication,
            title,
            None,
            base() + Duration::hours(offset_hours),
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_add_requires_title() {
        let mut record = PatientRecord::default();
        let result = add_reminder(&mut record, ReminderKind::Meal, "  ", None, base(), true);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_upcoming_filters_sorts_and_limits() {
        let mut record = PatientRecord::default();
        add_at(&mut record, "past", -1);
        for h in (1..=7).rev() {
            add_at(&mut record, &format!("in {}h", h), h);
        }
        let paused = add_at(&mut record, "paused", 0);
        toggle_reminder(&mut record, paused.id).unwrap();
        add_at(&mut record, "now", 0);

        let next = upcoming(&record, base());
        let titles: Vec<_> = next.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["now", "in 1h", "in 2h", "in 3h", "in 4h"]);
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut record = PatientRecord::default();
        let r = add_at(&mut record, "walk", 2);
        assert!(!toggle_reminder(&mut record, r.id).unwrap().is_active);
        assert!(toggle_reminder(&mut record, r.id).unwrap().is_active);
    }

    #[test]
    fn test_unknown_reminder_not_found() {
        let mut record = PatientRecord::default();
        let id = Uuid::new_v4();
        assert!(matches!(toggle_reminder(&mut record, id), Err(Error::NotFound(_))));
        assert!(matches!(remove_reminder(&mut record, id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_is_chronological() {
        let mut record = PatientRecord::default();
        add_at(&mut record, "later", 5);
        add_at(&mut record, "sooner", 1);
        let titles: Vec<_> = list_reminders(&record).iter().map(|r| r.title.clone()).collect();
        assert_eq!(titles, vec!["sooner", "later"]);
    }
}
