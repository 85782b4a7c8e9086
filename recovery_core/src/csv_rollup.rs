//! CSV output: rolling the assistant audit journal into an archive, and
//! exporting a patient's recovery history.
//!
//! The rollup writes and fsyncs the CSV before the journal is renamed, so
//! a crash in between can at worst duplicate rows, never lose them.
//! The journal lock is held from the read through the rename, so appends
//! that arrive during a rollup wait and land in a fresh journal.

use crate::types::{AiInteraction, DailyRecoveryLog, PatientRecord};
use crate::wal::JournalLock;
use crate::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;

#[derive(Debug, serde::Serialize)]
struct InteractionRow<'a> {
    id: String,
    created_at: String,
    patient_id: &'a str,
    session_id: String,
    safety_flag: &'static str,
    intent_type: crate::types::IntentType,
    risk_level: crate::types::RiskLevel,
    was_blocked: bool,
    blocked_reason: Option<&'a str>,
    safety_warning_shown: bool,
    ai_provider: &'a str,
    response_time_ms: u64,
    user_message: &'a str,
    ai_response: &'a str,
}

impl<'a> From<&'a AiInteraction> for InteractionRow<'a> {
    fn from(row: &'a AiInteraction) -> Self {
        InteractionRow {
            id: row.id.to_string(),
            created_at: row.created_at.to_rfc3339(),
            patient_id: &row.patient_id,
            session_id: row.session_id.to_string(),
            safety_flag: row.safety_flag.as_str(),
            intent_type: row.intent_type,
            risk_level: row.risk_level,
            was_blocked: row.was_blocked,
            blocked_reason: row.blocked_reason.as_deref(),
            safety_warning_shown: row.safety_warning_shown,
            ai_provider: &row.ai_provider,
            response_time_ms: row.response_time_ms,
            user_message: &row.user_message,
            ai_response: &row.ai_response,
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct RecoveryRow<'a> {
    log_date: String,
    day_number: Option<i64>,
    recovery_score: u8,
    trend: &'static str,
    medicine_adherence_percent: u8,
    exercise_completion_percent: u8,
    pain_score: u8,
    mood: &'static str,
    swelling: &'static str,
    sleep_quality: Option<u8>,
    energy_level: Option<u8>,
    symptoms: String,
    notes: Option<&'a str>,
}

impl<'a> From<&'a DailyRecoveryLog> for RecoveryRow<'a> {
    fn from(log: &'a DailyRecoveryLog) -> Self {
        RecoveryRow {
            log_date: log.log_date.to_string(),
            day_number: log.day_number,
            recovery_score: log.recovery_score,
            trend: log.trend.as_str(),
            medicine_adherence_percent: log.medicine_adherence_percent,
            exercise_completion_percent: log.exercise_completion_percent,
            pain_score: log.pain_score,
            mood: log.mood.as_str(),
            swelling: log.swelling.as_str(),
            sleep_quality: log.sleep_quality,
            energy_level: log.energy_level,
            symptoms: log.symptoms.join("; "),
            notes: log.notes.as_deref(),
        }
    }
}

fn finish(writer: csv::Writer<File>) -> Result<()> {
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;
    Ok(())
}

/// Roll the audit journal into `csv_path` and archive the journal
///
/// Rows are appended (headers only when the CSV is new), the CSV is
/// synced to disk, then the journal is renamed to `.wal.processed`.
/// Returns the number of interactions written.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let _journal = JournalLock::acquire(wal_path)?;
    let interactions: Vec<AiInteraction> = crate::wal::read_records(wal_path)?;

    if interactions.is_empty() {
        tracing::info!("No interactions in {:?} to roll up", wal_path);
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);
    for interaction in &interactions {
        writer.serialize(InteractionRow::from(interaction))?;
    }
    writer.flush()?;
    finish(writer)?;

    tracing::info!("Wrote {} interactions to {:?}", interactions.len(), csv_path);

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;
    tracing::info!("Archived audit journal to {:?}", processed_path);

    Ok(interactions.len())
}

/// Delete archived `.processed` journals in `dir`
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed journal {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journals", count);
    }
    Ok(count)
}

/// Write every recovery log, oldest first, to a fresh CSV at `path`
pub fn export_recovery_csv(record: &PatientRecord, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for log in record.recovery_logs.values() {
        writer.serialize(RecoveryRow::from(log))?;
    }
    writer.flush()?;
    finish(writer)?;

    let count = record.recovery_logs.len();
    tracing::info!("Exported {} recovery logs to {:?}", count, path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::log_check_in;
    use crate::types::{CheckIn, IntentType, RiskLevel, SafetyFlag};
    use crate::wal::{JsonlSink, RecordSink};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn create_test_interaction(message: &str) -> AiInteraction {
        AiInteraction {
            id: Uuid::new_v4(),
            patient_id: "p1".into(),
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            safety_flag: SafetyFlag::PainWarning,
            intent_type: IntentType::Warning,
            risk_level: RiskLevel::High,
            user_message: message.into(),
            ai_response: "Please call your doctor, today.".into(),
            was_blocked: false,
            blocked_reason: Some("severe pain reported".into()),
            safety_warning_shown: true,
            ai_provider: "safety_filter".into(),
            response_time_ms: 3,
        }
    }

    #[test]
    fn test_rollup_creates_csv_and_archives() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("ai_interactions.wal");
        let csv_path = temp_dir.path().join("ai_interactions.csv");

        let mut sink = JsonlSink::new(&wal_path);
        for i in 0..3 {
            sink.append(&create_test_interaction(&format!("severe pain {}", i))).unwrap();
        }

        assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 3);
        assert!(!wal_path.exists());
        assert!(wal_path.with_extension("wal.processed").exists());

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert!(headers.iter().any(|h| h == "safety_flag"));
        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        let flag_col = headers.iter().position(|h| h == "safety_flag").unwrap();
        assert_eq!(&rows[0][flag_col], "pain_warning");
        let risk_col = headers.iter().position(|h| h == "risk_level").unwrap();
        assert_eq!(&rows[0][risk_col], "high");
    }

    #[test]
    fn test_rollup_appends_without_repeating_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("ai_interactions.wal");
        let csv_path = temp_dir.path().join("ai_interactions.csv");

        for msg in ["first", "second"] {
            let mut sink = JsonlSink::new(&wal_path);
            sink.append(&create_test_interaction(msg)).unwrap();
            assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 1);
        }

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(contents.matches("safety_flag").count(), 1);
        let rows = csv::Reader::from_path(&csv_path).unwrap().records().count();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_rollup_while_writing_loses_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("wal").join("ai_interactions.wal");
        let csv_path = temp_dir.path().join("ai_interactions.csv");
        const WRITES: usize = 300;

        let writer_path = wal_path.clone();
        let writer = std::thread::spawn(move || {
            let mut sink = JsonlSink::new(&writer_path);
            for i in 0..WRITES {
                sink.append(&create_test_interaction(&format!("pain {}", i))).unwrap();
            }
        });

        let mut rolled = 0;
        while !writer.is_finished() {
            rolled += wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
            cleanup_processed_wals(wal_path.parent().unwrap()).unwrap();
        }
        writer.join().expect("writer thread panicked");
        rolled += wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        assert_eq!(rolled, WRITES);
        let rows = csv::Reader::from_path(&csv_path).unwrap().records().count();
        assert_eq!(rows, WRITES);
    }

    #[test]
    fn test_empty_journal_is_noop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("ai_interactions.wal");
        let csv_path = temp_dir.path().join("ai_interactions.csv");

        assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 0);
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_cleanup_processed_wals() {
        let temp_dir = tempfile::tempdir().unwrap();
        File::create(temp_dir.path().join("a.wal.processed")).unwrap();
        File::create(temp_dir.path().join("b.wal.processed")).unwrap();
        File::create(temp_dir.path().join("live.wal")).unwrap();

        assert_eq!(cleanup_processed_wals(temp_dir.path()).unwrap(), 2);
        assert!(temp_dir.path().join("live.wal").exists());
        assert_eq!(cleanup_processed_wals(&temp_dir.path().join("missing")).unwrap(), 0);
    }

    #[test]
    fn test_export_recovery_csv_is_chronological() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export").join("recovery.csv");

        let mut record = PatientRecord::default();
        for d in [3, 1, 2] {
            let date = NaiveDate::from_ymd_opt(2024, 4, d).unwrap();
            let check_in = CheckIn {
                symptoms: vec!["stiffness".into(), "itching".into()],
                ..CheckIn::default()
            };
            log_check_in(&mut record, date, &check_in, Utc::now()).unwrap();
        }

        assert_eq!(export_recovery_csv(&record, &path).unwrap(), 3);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let dates: Vec<String> = reader.records().map(|r| r.unwrap()[0].to_string()).collect();
        assert_eq!(dates, vec!["2024-04-01", "2024-04-02", "2024-04-03"]);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("stiffness; itching"));
    }
}
