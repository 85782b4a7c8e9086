//! Family members and the permission-filtered view they get of the patient.
//!
//! A member only ever sees the fields their grant allows. Hidden fields are
//! left out of the summary entirely rather than blanked.

use crate::history::latest_log;
use crate::types::{
    DoseStatus, ExerciseStatus, FamilyMember, FamilyPermissions, Mood, PatientRecord,
    PermissionUpdate, Trend,
};
use crate::{exercises, medications, Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Add a family member with the default grant (progress and mood only)
pub fn add_member(
    record: &mut PatientRecord,
    name: &str,
    email: &str,
    relationship: &str,
    now: DateTime<Utc>,
) -> Result<FamilyMember> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        return Err(Error::Validation("family member name is required".into()));
    }
    if !email.contains('@') {
        return Err(Error::Validation(format!("invalid email address: {}", email)));
    }
    if record.family.iter().any(|m| m.email.eq_ignore_ascii_case(email)) {
        return Err(Error::Validation(format!("{} is already a family member", email)));
    }

    let member = FamilyMember {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        relationship: relationship.trim().to_string(),
        permissions: FamilyPermissions::default(),
        added_at: now,
    };

    tracing::info!("Added family member {} ({})", member.name, member.id);
    record.family.push(member.clone());
    Ok(member)
}

/// Merge a partial update into a member's permissions
pub fn update_permissions(
    record: &mut PatientRecord,
    member_id: Uuid,
    update: PermissionUpdate,
) -> Result<FamilyMember> {
    let member = record
        .family
        .iter_mut()
        .find(|m| m.id == member_id)
        .ok_or_else(|| Error::NotFound(format!("family member {}", member_id)))?;

    let p = &mut member.permissions;
    if let Some(v) = update.can_view_progress {
        p.can_view_progress = v;
    }
    if let Some(v) = update.can_view_medications {
        p.can_view_medications = v;
    }
    if let Some(v) = update.can_view_exercises {
        p.can_view_exercises = v;
    }
    if let Some(v) = update.can_view_mood {
        p.can_view_mood = v;
    }
    if let Some(v) = update.can_view_pain_score {
        p.can_view_pain_score = v;
    }
    if let Some(freq) = update.update_frequency {
        p.update_frequency = freq;
    }

    tracing::info!("Updated permissions for {}", member.name);
    Ok(member.clone())
}

pub fn remove_member(record: &mut PatientRecord, member_id: Uuid) -> Result<FamilyMember> {
    let index = record
        .family
        .iter()
        .position(|m| m.id == member_id)
        .ok_or_else(|| Error::NotFound(format!("family member {}", member_id)))?;
    Ok(record.family.remove(index))
}

/// What a family member is shown; `None` fields are hidden or unknown
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FamilySummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since_surgery: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_mood: Option<Mood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pain_score: Option<u8>,
    /// Every dose scheduled today has been taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications_taken: Option<bool>,
    /// Every exercise scheduled today has been completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises_completed: Option<bool>,
}

/// Build `member_id`'s view of the patient on `today`
///
/// An unknown member is refused with `NotFound`.
pub fn family_summary(
    record: &PatientRecord,
    member_id: Uuid,
    today: NaiveDate,
) -> Result<FamilySummary> {
    let member = record
        .family
        .iter()
        .find(|m| m.id == member_id)
        .ok_or_else(|| Error::NotFound("access denied".into()))?;
    let grant = &member.permissions;
    let latest = latest_log(&record.recovery_logs);
    let mut summary = FamilySummary::default();

    if grant.can_view_progress {
        summary.recovery_score = latest.map(|l| l.recovery_score);
        summary.trend = latest.map(|l| l.trend);
        summary.days_since_surgery = record.profile.day_number(today);
    }
    if grant.can_view_mood {
        summary.current_mood = latest.map(|l| l.mood);
    }
    if grant.can_view_pain_score {
        summary.pain_score = latest.map(|l| l.pain_score);
    }
    if grant.can_view_medications {
        let doses = medications::today_schedule(record, today);
        summary.medications_taken =
            Some(!doses.is_empty() && doses.iter().all(|d| d.status == DoseStatus::Taken));
    }
    if grant.can_view_exercises {
        let sessions = exercises::today_schedule(record, today);
        summary.exercises_completed = Some(
            !sessions.is_empty()
                && sessions.iter().all(|s| s.status == ExerciseStatus::Completed),
        );
    }

    tracing::debug!("Built family summary for {}", member.name);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::log_check_in;
    use crate::types::{CheckIn, NewMedication, Swelling, UpdateFrequency};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn patient_with_data() -> PatientRecord {
        let mut record = PatientRecord::default();
        record.profile.surgery_date = Some(day(1));
        let check_in = CheckIn {
            medicine_adherence_percent: Some(90),
            exercise_completion_percent: Some(80),
            pain_score: Some(3),
            mood: Some(Mood::Good),
            swelling: Some(Swelling::Mild),
            ..CheckIn::default()
        };
        log_check_in(&mut record, day(5), &check_in, Utc::now()).unwrap();
        record
    }

    #[test]
    fn test_default_grant_shows_progress_and_mood_only() {
        let mut record = patient_with_data();
        let member = add_member(&mut record, "Ravi", "ravi@example.com", "son", Utc::now()).unwrap();

        let summary = family_summary(&record, member.id, day(5)).unwrap();
        assert!(summary.recovery_score.is_some());
        assert_eq!(summary.days_since_surgery, Some(5));
        assert_eq!(summary.current_mood, Some(Mood::Good));
        assert_eq!(summary.pain_score, None);
        assert_eq!(summary.medications_taken, None);
        assert_eq!(summary.exercises_completed, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("pain_score").is_none());
    }

    #[test]
    fn test_permission_update_merges() {
        let mut record = patient_with_data();
        let member = add_member(&mut record, "Ravi", "ravi@example.com", "son", Utc::now()).unwrap();

        let updated = update_permissions(
            &mut record,
            member.id,
            PermissionUpdate {
                can_view_pain_score: Some(true),
                can_view_mood: Some(false),
                update_frequency: Some(UpdateFrequency::Weekly),
                ..PermissionUpdate::default()
            },
        )
        .unwrap();
        assert!(updated.permissions.can_view_progress);
        assert!(!updated.permissions.can_view_mood);
        assert_eq!(updated.permissions.update_frequency, UpdateFrequency::Weekly);

        let summary = family_summary(&record, member.id, day(5)).unwrap();
        assert_eq!(summary.pain_score, Some(3));
        assert_eq!(summary.current_mood, None);
    }

    #[test]
    fn test_medications_taken_reflects_today() {
        let mut record = patient_with_data();
        let member = add_member(&mut record, "Mina", "mina@example.com", "spouse", Utc::now()).unwrap();
        update_permissions(
            &mut record,
            member.id,
            PermissionUpdate {
                can_view_medications: Some(true),
                ..PermissionUpdate::default()
            },
        )
        .unwrap();
        let med = medications::add_medication(
            &mut record,
            NewMedication {
                name: "Ibuprofen".into(),
                ..NewMedication::default()
            },
            day(1),
        )
        .unwrap();

        let before = family_summary(&record, member.id, day(5)).unwrap();
        assert_eq!(before.medications_taken, Some(false));

        medications::log_dose(&mut record, med.id, day(5), None, DoseStatus::Taken, Utc::now())
            .unwrap();
        let after = family_summary(&record, member.id, day(5)).unwrap();
        assert_eq!(after.medications_taken, Some(true));
    }

    #[test]
    fn test_unknown_member_is_denied() {
        let record = patient_with_data();
        let result = family_summary(&record, Uuid::new_v4(), day(5));
        match result {
            Err(Error::NotFound(msg)) => assert_eq!(msg, "access denied"),
            other => panic!("expected access denied, got {:?}", other),
        }
    }

    #[test]
    fn test_add_validation_and_remove() {
        let mut record = PatientRecord::default();
        assert!(add_member(&mut record, "", "a@b.c", "", Utc::now()).is_err());
        assert!(add_member(&mut record, "A", "not-an-email", "", Utc::now()).is_err());

        let member = add_member(&mut record, "A", "a@b.c", "friend", Utc::now()).unwrap();
        assert!(add_member(&mut record, "B", "A@B.C", "friend", Utc::now()).is_err());

        remove_member(&mut record, member.id).unwrap();
        assert!(record.family.is_empty());
        assert!(matches!(
            remove_member(&mut record, member.id),
            Err(Error::NotFound(_))
        ));
    }
}
