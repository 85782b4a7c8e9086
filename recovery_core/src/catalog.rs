//! Built-in phrase tables and canned replies for the recovery assistant.
//!
//! The safety rules are an ordered list evaluated top-down; the first
//! category with a matching phrase wins. Phrases are lower-case and are
//! matched as plain substrings of the lower-cased message.

use crate::types::{IntentType, SafetyFlag};
use once_cell::sync::Lazy;

/// One category of the safety rule table
#[derive(Clone, Debug)]
pub struct SafetyRule {
    pub flag: SafetyFlag,
    pub phrases: &'static [&'static str],
    pub reply: &'static str,
}

/// A canned reply for safe messages
///
/// Every group in `keyword_groups` must contribute at least one substring
/// match for the template to apply.
#[derive(Clone, Debug)]
pub struct ResponseTemplate {
    pub topic: &'static str,
    pub intent: IntentType,
    pub keyword_groups: &'static [&'static [&'static str]],
    pub reply: &'static str,
}

const BLOCKED_PHRASES: &[&str] = &[
    "diagnose me",
    "what medicine should i take",
    "prescribe me",
    "do i have cancer",
    "should i stop taking",
    "change my prescription",
    "what disease do i have",
    "am i sick",
];

const PAIN_PHRASES: &[&str] = &[
    "severe pain",
    "extreme pain",
    "unbearable pain",
    "excruciating",
    "worst pain",
    "can't bear",
    "pain is 9",
    "pain is 10",
];

const DOCTOR_PHRASES: &[&str] = &[
    "infection",
    "fever",
    "bleeding heavily",
    "stitches open",
    "wound looks bad",
    "dizzy",
    "pus",
];

const BLOCKED_REPLY: &str = "I can't diagnose conditions, prescribe medicine or \
recommend changes to your medications. Please talk to your doctor about any medical \
decision. I can help with recovery education, reminders and emotional support.";

const PAIN_REPLY: &str = "I'm concerned about the pain you're describing. Severe pain \
should be checked by your healthcare provider. Contact your doctor or go to urgent care \
if the pain is sudden and severe, comes with a fever, feels different from your usual \
post-surgery discomfort, or isn't eased by your prescribed medication.";

const DOCTOR_REPLY: &str = "What you're describing could be a complication that needs \
professional attention. Please contact your healthcare provider as soon as possible. \
Signs of infection, fever or wound problems should not wait. If you can't reach your \
doctor, go to an urgent care centre.";

static SAFETY_RULES: Lazy<Vec<SafetyRule>> = Lazy::new(|| {
    vec![
        SafetyRule {
            flag: SafetyFlag::BlockedRequest,
            phrases: BLOCKED_PHRASES,
            reply: BLOCKED_REPLY,
        },
        SafetyRule {
            flag: SafetyFlag::PainWarning,
            phrases: PAIN_PHRASES,
            reply: PAIN_REPLY,
        },
        SafetyRule {
            flag: SafetyFlag::RedirectToDoctor,
            phrases: DOCTOR_PHRASES,
            reply: DOCTOR_REPLY,
        },
    ]
});

/// The ordered safety rule table: blocked, then pain, then doctor referral
pub fn safety_rules() -> &'static [SafetyRule] {
    &SAFETY_RULES
}

static RESPONSE_TEMPLATES: Lazy<Vec<ResponseTemplate>> = Lazy::new(|| {
    vec![
        ResponseTemplate {
            topic: "medication_purpose",
            intent: IntentType::Education,
            keyword_groups: &[&["why"], &["medicine", "medication"]],
            reply: "Each of your medicines has a job in your recovery. Pain relievers \
keep discomfort low enough for you to rest and move, anti-inflammatories bring down \
swelling, and supplements support healing. Taking them on schedule keeps a steady \
level in your body; skipped doses let pain build up. Ask your doctor or pharmacist \
if you want details about a specific medicine.",
        },
        ResponseTemplate {
            topic: "exercise",
            intent: IntentType::Education,
            keyword_groups: &[&["exercise", "movement"]],
            reply: "Gentle, regular movement prevents stiffness, improves circulation, \
helps swelling drain and rebuilds strength. Start slowly, stop if you feel sharp pain, \
stick to the exercises your care team prescribed, and aim for a little every day \
rather than a lot occasionally.",
        },
        ResponseTemplate {
            topic: "anxiety",
            intent: IntentType::EmotionalSupport,
            keyword_groups: &[&["anxious", "worried", "scared"]],
            reply: "Feeling anxious during recovery is very common. Slow breathing, \
focusing on small daily wins and talking to someone you trust can all help. Looking \
back at your check-ins can show how far you've already come. Tell me what's on your \
mind and we can go through it together.",
        },
        ResponseTemplate {
            topic: "sleep",
            intent: IntentType::Education,
            keyword_groups: &[&["sleep"]],
            reply: "Rest is when much of the healing happens. Keep a regular bedtime, \
avoid screens for an hour before sleep, use pillows to support the surgical area and \
keep the room cool and dark. If poor sleep continues, mention it to your care team.",
        },
        ResponseTemplate {
            topic: "nutrition",
            intent: IntentType::Education,
            keyword_groups: &[&["eat", "food", "diet"]],
            reply: "Good nutrition speeds repair. Protein from fish, eggs, beans or \
chicken rebuilds tissue, fruit and vegetables supply vitamin C and fibre, and nuts and \
whole grains provide zinc. Drink plenty of water, eat small frequent meals if your \
appetite is low, and avoid alcohol while taking pain medication.",
        },
    ]
});

/// Reply used when no template matches a safe message
pub const DEFAULT_REPLY: &str = "I'm here to support your recovery. I can explain why \
your medicines and exercises matter, share tips on sleep, nutrition and comfort, help \
with worries along the way, and walk you through your recovery score. What would you \
like to know?";

/// Keyword templates for safe messages, in priority order
pub fn response_templates() -> &'static [ResponseTemplate] {
    &RESPONSE_TEMPLATES
}
