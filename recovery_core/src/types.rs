//! Core domain types for the Heal recovery tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Daily check-in inputs, scores and trends
//! - Safety classification results and audit rows
//! - Medications, exercises and their logs
//! - Reminders and family access
//! - The per-patient record persisted by the store

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Check-in Enums
// ============================================================================

/// Self-reported mood for the day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Great,
    Good,
    Ok,
    Low,
    Struggling,
}

impl Mood {
    /// Contribution of this mood to the recovery score
    pub fn points(self) -> i32 {
        match self {
            Mood::Great => 10,
            Mood::Good => 8,
            Mood::Ok => 6,
            Mood::Low => 4,
            Mood::Struggling => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Ok => "ok",
            Mood::Low => "low",
            Mood::Struggling => "struggling",
        }
    }
}

impl FromStr for Mood {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "great" => Ok(Mood::Great),
            "good" => Ok(Mood::Good),
            "ok" | "okay" => Ok(Mood::Ok),
            "low" => Ok(Mood::Low),
            "struggling" => Ok(Mood::Struggling),
            other => Err(Error::Validation(format!("unknown mood: {}", other))),
        }
    }
}

/// Swelling around the surgical site
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Swelling {
    None,
    Mild,
    Moderate,
    Severe,
}

impl Swelling {
    /// Contribution of this swelling level to the recovery score
    pub fn points(self) -> i32 {
        match self {
            Swelling::None => 10,
            Swelling::Mild => 7,
            Swelling::Moderate => 4,
            Swelling::Severe => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Swelling::None => "none",
            Swelling::Mild => "mild",
            Swelling::Moderate => "moderate",
            Swelling::Severe => "severe",
        }
    }
}

impl FromStr for Swelling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Swelling::None),
            "mild" => Ok(Swelling::Mild),
            "moderate" => Ok(Swelling::Moderate),
            "severe" => Ok(Swelling::Severe),
            other => Err(Error::Validation(format!("unknown swelling level: {}", other))),
        }
    }
}

/// Direction of recovery relative to the trailing week
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Warning,
    Critical,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Warning => "warning",
            Trend::Critical => "critical",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Check-in and Recovery Log Types
// ============================================================================

/// Fully defaulted, range-checked input to the score calculator
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyRecoveryInput {
    pub medicine_adherence_percent: u8,
    pub exercise_completion_percent: u8,
    pub pain_score: u8,
    pub mood: Mood,
    pub swelling: Swelling,
}

/// A patient's daily check-in as submitted; missing fields take neutral defaults
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckIn {
    pub medicine_adherence_percent: Option<u8>,
    pub exercise_completion_percent: Option<u8>,
    pub pain_score: Option<u8>,
    pub mood: Option<Mood>,
    pub swelling: Option<Swelling>,
    pub sleep_quality: Option<u8>,
    pub energy_level: Option<u8>,
    pub notes: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

impl CheckIn {
    /// Apply defaults and range checks, producing the score calculator input
    ///
    /// Defaults: adherence 0, exercise 0, pain 5, mood ok, swelling mild.
    pub fn to_input(&self) -> Result<DailyRecoveryInput> {
        let adherence = check_range(
            "medicine adherence",
            self.medicine_adherence_percent.unwrap_or(0),
            100,
        )?;
        let exercise = check_range(
            "exercise completion",
            self.exercise_completion_percent.unwrap_or(0),
            100,
        )?;
        let pain = check_range("pain score", self.pain_score.unwrap_or(5), 10)?;

        if let Some(sleep) = self.sleep_quality {
            check_range("sleep quality", sleep, 10)?;
        }
        if let Some(energy) = self.energy_level {
            check_range("energy level", energy, 10)?;
        }

        Ok(DailyRecoveryInput {
            medicine_adherence_percent: adherence,
            exercise_completion_percent: exercise,
            pain_score: pain,
            mood: self.mood.unwrap_or(Mood::Ok),
            swelling: self.swelling.unwrap_or(Swelling::Mild),
        })
    }
}

pub(crate) fn check_range(field: &str, value: u8, max: u8) -> Result<u8> {
    if value > max {
        return Err(Error::Validation(format!(
            "{} must be between 0 and {}, got {}",
            field, max, value
        )));
    }
    Ok(value)
}

/// One persisted check-in; at most one per patient per calendar date
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DailyRecoveryLog {
    pub id: Uuid,
    pub log_date: NaiveDate,
    pub day_number: Option<i64>,
    pub medicine_adherence_percent: u8,
    pub exercise_completion_percent: u8,
    pub pain_score: u8,
    pub mood: Mood,
    pub swelling: Swelling,
    pub sleep_quality: Option<u8>,
    pub energy_level: Option<u8>,
    pub recovery_score: u8,
    pub trend: Trend,
    pub notes: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Patient Profile
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryType {
    BoneFracture,
    Surgery,
    Injury,
    Physiotherapy,
    Other,
}

impl FromStr for RecoveryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bone_fracture" | "fracture" => Ok(RecoveryType::BoneFracture),
            "surgery" => Ok(RecoveryType::Surgery),
            "injury" => Ok(RecoveryType::Injury),
            "physiotherapy" | "physio" => Ok(RecoveryType::Physiotherapy),
            "other" => Ok(RecoveryType::Other),
            other => Err(Error::Validation(format!("unknown recovery type: {}", other))),
        }
    }
}

/// Who the patient is and when their recovery started
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PatientProfile {
    pub name: Option<String>,
    pub surgery_date: Option<NaiveDate>,
    pub recovery_type: Option<RecoveryType>,
    pub expected_recovery_days: Option<u32>,
}

impl PatientProfile {
    /// 1-based day of recovery for `date`
    ///
    /// `None` when the surgery date is unknown or still ahead of `date`.
    pub fn day_number(&self, date: NaiveDate) -> Option<i64> {
        let surgery = self.surgery_date?;
        (date >= surgery).then(|| (date - surgery).num_days() + 1)
    }
}

// ============================================================================
// Safety Classification Types
// ============================================================================

/// Outcome of screening a message before it reaches a responder
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SafetyFlag {
    Safe,
    RedirectToDoctor,
    PainWarning,
    BlockedRequest,
}

impl SafetyFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyFlag::Safe => "safe",
            SafetyFlag::RedirectToDoctor => "redirect_to_doctor",
            SafetyFlag::PainWarning => "pain_warning",
            SafetyFlag::BlockedRequest => "blocked_request",
        }
    }
}

impl fmt::Display for SafetyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output: the flag and, for non-safe flags, the canned reply
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationResult {
    pub flag: SafetyFlag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Education,
    EmotionalSupport,
    Warning,
    Blocked,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Audit row for one assistant exchange
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiInteraction {
    pub id: Uuid,
    pub patient_id: String,
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub safety_flag: SafetyFlag,
    pub intent_type: IntentType,
    pub risk_level: RiskLevel,
    pub user_message: String,
    pub ai_response: String,
    pub was_blocked: bool,
    pub blocked_reason: Option<String>,
    pub safety_warning_shown: bool,
    pub ai_provider: String,
    pub response_time_ms: u64,
}

// ============================================================================
// Medication Types
// ============================================================================

/// How often a medication or exercise recurs
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskFrequency {
    Once,
    #[default]
    Daily,
    TwiceDaily,
    ThreeTimesDaily,
    Weekly,
    Custom,
}

impl FromStr for TaskFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "once" => Ok(TaskFrequency::Once),
            "daily" | "once_daily" => Ok(TaskFrequency::Daily),
            "twice_daily" => Ok(TaskFrequency::TwiceDaily),
            "three_times_daily" => Ok(TaskFrequency::ThreeTimesDaily),
            "weekly" => Ok(TaskFrequency::Weekly),
            "custom" => Ok(TaskFrequency::Custom),
            other => Err(Error::Validation(format!("unknown frequency: {}", other))),
        }
    }
}

/// Normalize a "H:MM"/"HH:MM" time slot to zero-padded "HH:MM"
pub fn parse_time_slot(slot: &str) -> Result<String> {
    NaiveTime::parse_from_str(slot.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| Error::Validation(format!("invalid time slot '{}', expected HH:MM", slot)))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: TaskFrequency,
    pub times: Vec<String>,
    pub with_food: bool,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Fields accepted when adding a medication
#[derive(Clone, Debug, Default)]
pub struct NewMedication {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<TaskFrequency>,
    pub times: Option<Vec<String>>,
    pub with_food: bool,
    pub instructions: Option<String>,
}

/// Partial medication update; `None` leaves the field unchanged
#[derive(Clone, Debug, Default)]
pub struct MedicationUpdate {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<TaskFrequency>,
    pub times: Option<Vec<String>>,
    pub instructions: Option<String>,
    pub is_active: Option<bool>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DoseStatus {
    Pending,
    Taken,
    Missed,
    Skipped,
}

impl FromStr for DoseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(DoseStatus::Pending),
            "taken" => Ok(DoseStatus::Taken),
            "missed" => Ok(DoseStatus::Missed),
            "skipped" => Ok(DoseStatus::Skipped),
            other => Err(Error::Validation(format!("unknown dose status: {}", other))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MedicationLog {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub status: DoseStatus,
    pub taken_at: Option<DateTime<Utc>>,
}

/// One dose slot in today's medication schedule
#[derive(Clone, Debug, Serialize)]
pub struct DoseSlot {
    pub medication_id: Uuid,
    pub medication: String,
    pub time: String,
    pub status: DoseStatus,
}

// ============================================================================
// Exercise Types
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    pub frequency: TaskFrequency,
    /// 0 = Sunday .. 6 = Saturday
    pub days_of_week: Vec<u8>,
    pub instructions: Vec<String>,
    pub is_active: bool,
}

#[derive(Clone, Debug, Default)]
pub struct NewExercise {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub frequency: Option<TaskFrequency>,
    pub days_of_week: Option<Vec<u8>>,
    pub instructions: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub days_of_week: Option<Vec<u8>>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStatus {
    Pending,
    Completed,
    Skipped,
    Partial,
}

impl FromStr for ExerciseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ExerciseStatus::Pending),
            "completed" | "done" => Ok(ExerciseStatus::Completed),
            "skipped" => Ok(ExerciseStatus::Skipped),
            "partial" => Ok(ExerciseStatus::Partial),
            other => Err(Error::Validation(format!("unknown exercise status: {}", other))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub status: ExerciseStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub pain_level: Option<u8>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExerciseSlot {
    pub exercise_id: Uuid,
    pub exercise: String,
    pub duration_minutes: u32,
    pub status: ExerciseStatus,
}

// ============================================================================
// Reminder Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Medication,
    Exercise,
    Meal,
    Hydration,
    Custom,
}

impl FromStr for ReminderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "medication" | "medicine" => Ok(ReminderKind::Medication),
            "exercise" => Ok(ReminderKind::Exercise),
            "meal" => Ok(ReminderKind::Meal),
            "hydration" => Ok(ReminderKind::Hydration),
            "custom" => Ok(ReminderKind::Custom),
            other => Err(Error::Validation(format!("unknown reminder kind: {}", other))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub kind: ReminderKind,
    pub title: String,
    pub message: String,
    pub scheduled_at: DateTime<Utc>,
    pub recurring: bool,
    pub is_active: bool,
}

// ============================================================================
// Family Access Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpdateFrequency {
    Realtime,
    Daily,
    Weekly,
    MilestoneOnly,
}

impl FromStr for UpdateFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "realtime" => Ok(UpdateFrequency::Realtime),
            "daily" => Ok(UpdateFrequency::Daily),
            "weekly" => Ok(UpdateFrequency::Weekly),
            "milestone" | "milestone_only" => Ok(UpdateFrequency::MilestoneOnly),
            other => Err(Error::Validation(format!("unknown update frequency: {}", other))),
        }
    }
}

/// What a family viewer may see of the patient's recovery
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FamilyPermissions {
    pub can_view_progress: bool,
    pub can_view_medications: bool,
    pub can_view_exercises: bool,
    pub can_view_mood: bool,
    pub can_view_pain_score: bool,
    pub update_frequency: UpdateFrequency,
}

impl Default for FamilyPermissions {
    fn default() -> Self {
        Self {
            can_view_progress: true,
            can_view_medications: false,
            can_view_exercises: false,
            can_view_mood: true,
            can_view_pain_score: false,
            update_frequency: UpdateFrequency::Daily,
        }
    }
}

/// Partial permission update merged into the existing grant
#[derive(Clone, Debug, Default)]
pub struct PermissionUpdate {
    pub can_view_progress: Option<bool>,
    pub can_view_medications: Option<bool>,
    pub can_view_exercises: Option<bool>,
    pub can_view_mood: Option<bool>,
    pub can_view_pain_score: Option<bool>,
    pub update_frequency: Option<UpdateFrequency>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub relationship: String,
    pub permissions: FamilyPermissions,
    pub added_at: DateTime<Utc>,
}

// ============================================================================
// Patient Record
// ============================================================================

/// Everything persisted for one patient
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PatientRecord {
    #[serde(default)]
    pub profile: PatientProfile,
    #[serde(default)]
    pub recovery_logs: BTreeMap<NaiveDate, DailyRecoveryLog>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub medication_logs: Vec<MedicationLog>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub exercise_logs: Vec<ExerciseLog>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub family: Vec<FamilyMember>,
}
