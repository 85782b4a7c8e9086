//! Safety screening for assistant messages.
//!
//! Messages are lower-cased and scanned against the rule table in
//! [`crate::catalog`]: blocked requests first, then severe pain, then
//! symptoms that need a doctor. The first matching category decides the
//! flag and its canned reply. Nothing matching means the message is safe.

use crate::catalog::safety_rules;
use crate::types::{ClassificationResult, IntentType, RiskLevel, SafetyFlag};

/// Classify a free-text message
///
/// Matching is case-insensitive substring search, so "infection" also
/// matches inside "reinfectioncare". Never fails; the empty string is safe.
pub fn classify(message: &str) -> ClassificationResult {
    let lower = message.to_lowercase();

    for rule in safety_rules() {
        if let Some(phrase) = rule.phrases.iter().find(|p| lower.contains(*p)) {
            tracing::debug!("Message matched {:?} phrase {:?}", rule.flag, phrase);
            return ClassificationResult {
                flag: rule.flag,
                message: Some(rule.reply.to_string()),
            };
        }
    }

    ClassificationResult {
        flag: SafetyFlag::Safe,
        message: None,
    }
}

/// How a classification is recorded in the assistant audit log
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditMapping {
    pub was_blocked: bool,
    pub safety_warning_shown: bool,
    pub intent_type: IntentType,
    pub risk_level: RiskLevel,
    pub blocked_reason: Option<&'static str>,
}

impl AuditMapping {
    /// Audit fields for a flag
    ///
    /// Only `BlockedRequest` counts as blocked; the warning flag is set for
    /// pain and doctor referrals but not for blocked requests.
    pub fn for_flag(flag: SafetyFlag) -> Self {
        match flag {
            SafetyFlag::Safe => Self {
                was_blocked: false,
                safety_warning_shown: false,
                intent_type: IntentType::Education,
                risk_level: RiskLevel::Low,
                blocked_reason: None,
            },
            SafetyFlag::RedirectToDoctor => Self {
                was_blocked: false,
                safety_warning_shown: true,
                intent_type: IntentType::Warning,
                risk_level: RiskLevel::High,
                blocked_reason: Some("possible medical complication"),
            },
            SafetyFlag::PainWarning => Self {
                was_blocked: false,
                safety_warning_shown: true,
                intent_type: IntentType::Warning,
                risk_level: RiskLevel::High,
                blocked_reason: Some("severe pain reported"),
            },
            SafetyFlag::BlockedRequest => Self {
                was_blocked: true,
                safety_warning_shown: false,
                intent_type: IntentType::Blocked,
                risk_level: RiskLevel::Medium,
                blocked_reason: Some("diagnosis or prescription request"),
            },
        }
    }
}
