#![forbid(unsafe_code)]

//! Core domain model and business logic for the Heal recovery tracker.
//!
//! This crate provides:
//! - Domain types (check-ins, medications, exercises, reminders, family access)
//! - Safety classification of assistant messages
//! - Recovery score and trend calculation
//! - The recovery assistant and its response providers
//! - Persistence (patient records, audit WAL, CSV)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod safety;
pub mod score;
pub mod history;
pub mod wal;
pub mod csv_rollup;
pub mod state;
pub mod recovery;
pub mod medications;
pub mod exercises;
pub mod reminders;
pub mod family;
pub mod provider;
pub mod assistant;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use safety::{classify, AuditMapping};
pub use score::{compute_score, compute_trend};
pub use wal::{JsonlSink, RecordSink};
pub use state::PatientStore;
pub use recovery::{dashboard, log_check_in, Dashboard};
pub use family::{family_summary, FamilySummary};
pub use assistant::{Answer, Assistant, ChatReply, FallbackResponder, Responder, TemplateResponder};
pub use provider::OpenAiCompatibleResponder;
