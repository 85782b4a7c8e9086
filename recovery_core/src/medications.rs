//! Medication list, dose logging and the daily dose schedule.

use crate::types::{
    parse_time_slot, DoseSlot, DoseStatus, Medication, MedicationLog, MedicationUpdate,
    NewMedication, PatientRecord,
};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

const DEFAULT_DOSE_TIME: &str = "08:00";

fn normalize_times(times: &[String]) -> Result<Vec<String>> {
    if times.is_empty() {
        return Err(Error::Validation("a medication needs at least one time slot".into()));
    }
    let mut slots = times
        .iter()
        .map(|t| parse_time_slot(t))
        .collect::<Result<Vec<_>>>()?;
    slots.sort();
    slots.dedup();
    Ok(slots)
}

/// Add a medication starting `today`
///
/// Defaults: daily, one dose at 08:00, active.
pub fn add_medication(
    record: &mut PatientRecord,
    new: NewMedication,
    today: NaiveDate,
) -> Result<Medication> {
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation("medication name is required".into()));
    }

    let times = match new.times {
        Some(times) => normalize_times(&times)?,
        None => vec![DEFAULT_DOSE_TIME.to_string()],
    };

    let medication = Medication {
        id: Uuid::new_v4(),
        name,
        dosage: new.dosage.unwrap_or_default(),
        frequency: new.frequency.unwrap_or_default(),
        times,
        with_food: new.with_food,
        instructions: new.instructions,
        is_active: true,
        start_date: today,
        end_date: None,
    };

    tracing::info!("Added medication {} ({})", medication.name, medication.id);
    record.medications.push(medication.clone());
    Ok(medication)
}

pub fn find_medication(record: &PatientRecord, id: Uuid) -> Result<&Medication> {
    record
        .medications
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| Error::NotFound(format!("medication {}", id)))
}

/// Apply a partial update to a medication
pub fn update_medication(
    record: &mut PatientRecord,
    id: Uuid,
    update: MedicationUpdate,
) -> Result<Medication> {
    let times = update.times.as_deref().map(normalize_times).transpose()?;

    let medication = record
        .medications
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or_else(|| Error::NotFound(format!("medication {}", id)))?;

    if let Some(name) = update.name {
        medication.name = name;
    }
    if let Some(dosage) = update.dosage {
        medication.dosage = dosage;
    }
    if let Some(frequency) = update.frequency {
        medication.frequency = frequency;
    }
    if let Some(times) = times {
        medication.times = times;
    }
    if let Some(instructions) = update.instructions {
        medication.instructions = Some(instructions);
    }
    if let Some(active) = update.is_active {
        medication.is_active = active;
    }
    if let Some(end) = update.end_date {
        medication.end_date = Some(end);
    }

    tracing::info!("Updated medication {}", id);
    Ok(medication.clone())
}

/// Remove a medication; its dose history is kept
pub fn remove_medication(record: &mut PatientRecord, id: Uuid) -> Result<Medication> {
    let index = record
        .medications
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| Error::NotFound(format!("medication {}", id)))?;
    let removed = record.medications.remove(index);
    tracing::info!("Removed medication {}", removed.name);
    Ok(removed)
}

/// Record a dose for `date`
///
/// Without an explicit `time` the first slot with no entry that day is
/// used. Logging a slot again replaces its status.
pub fn log_dose(
    record: &mut PatientRecord,
    medication_id: Uuid,
    date: NaiveDate,
    time: Option<&str>,
    status: DoseStatus,
    now: DateTime<Utc>,
) -> Result<MedicationLog> {
    let medication = find_medication(record, medication_id)?;

    let slot = match time {
        Some(t) => {
            let slot = parse_time_slot(t)?;
            if !medication.times.contains(&slot) {
                return Err(Error::Validation(format!(
                    "{} is not scheduled at {} (slots: {})",
                    medication.name,
                    slot,
                    medication.times.join(", ")
                )));
            }
            slot
        }
        None => medication
            .times
            .iter()
            .find(|slot| {
                !record.medication_logs.iter().any(|l| {
                    l.medication_id == medication_id
                        && l.scheduled_date == date
                        && &l.scheduled_time == *slot
                })
            })
            .cloned()
            .ok_or_else(|| {
                Error::Validation(format!(
                    "every dose of {} on {} is already logged; pass a time to correct one",
                    medication.name, date
                ))
            })?,
    };

    let taken_at = (status == DoseStatus::Taken).then_some(now);

    if let Some(existing) = record.medication_logs.iter_mut().find(|l| {
        l.medication_id == medication_id && l.scheduled_date == date && l.scheduled_time == slot
    }) {
        existing.status = status;
        existing.taken_at = taken_at;
        tracing::info!("Updated dose {} {} to {:?}", date, slot, status);
        return Ok(existing.clone());
    }

    let log = MedicationLog {
        id: Uuid::new_v4(),
        medication_id,
        scheduled_date: date,
        scheduled_time: slot,
        status,
        taken_at,
    };
    tracing::info!(
        "Logged dose {} {} as {:?}",
        log.scheduled_date,
        log.scheduled_time,
        status
    );
    record.medication_logs.push(log.clone());
    Ok(log)
}

/// Every dose due on `date`, ordered by time
pub fn today_schedule(record: &PatientRecord, date: NaiveDate) -> Vec<DoseSlot> {
    let mut schedule: Vec<DoseSlot> = record
        .medications
        .iter()
        .filter(|m| m.is_active && m.start_date <= date && m.end_date.map_or(true, |end| end >= date))
        .flat_map(|m| {
            m.times.iter().map(move |time| {
                let status = record
                    .medication_logs
                    .iter()
                    .find(|l| l.medication_id == m.id && l.scheduled_date == date && &l.scheduled_time == time)
                    .map_or(DoseStatus::Pending, |l| l.status);
                DoseSlot {
                    medication_id: m.id,
                    medication: format!("{} {}", m.name, m.dosage).trim().to_string(),
                    time: time.clone(),
                    status,
                }
            })
        })
        .collect();

    schedule.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.medication.cmp(&b.medication)));
    schedule
}
