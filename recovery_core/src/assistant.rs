//! The recovery assistant.
//!
//! Every message is screened by [`crate::safety::classify`] first. A
//! non-safe message is answered with the rule's canned reply and never
//! reaches a responder. Safe messages go to the configured [`Responder`].
//! Either way one [`AiInteraction`] row is appended to the audit sink.

use crate::catalog::{response_templates, ResponseTemplate, DEFAULT_REPLY};
use crate::config::{AssistantConfig, ProviderKind};
use crate::provider::OpenAiCompatibleResponder;
use crate::safety::{classify, AuditMapping};
use crate::types::{AiInteraction, IntentType, SafetyFlag};
use crate::wal::RecordSink;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Provider name recorded when the safety rules answered
pub const SAFETY_FILTER_PROVIDER: &str = "safety_filter";

/// A reply together with the responder that produced it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub provider: String,
}

/// Something that can answer a safe patient message
pub trait Responder {
    /// Name recorded in the audit log
    fn name(&self) -> &str;

    fn respond(&self, prompt: &str) -> Result<String>;

    /// Reply plus the name of whoever actually answered
    fn answer(&self, prompt: &str) -> Result<Answer> {
        Ok(Answer {
            text: self.respond(prompt)?,
            provider: self.name().to_string(),
        })
    }
}

/// Local keyword matcher over the built-in reply catalog
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateResponder;

impl TemplateResponder {
    /// First template whose keyword groups all match the message
    pub fn find_template(message: &str) -> Option<&'static ResponseTemplate> {
        let lower = message.to_lowercase();
        response_templates().iter().find(|t| {
            t.keyword_groups
                .iter()
                .all(|group| group.iter().any(|kw| lower.contains(kw)))
        })
    }

    /// Audit intent for a safe message
    pub fn intent_for(message: &str) -> IntentType {
        Self::find_template(message).map_or(IntentType::Education, |t| t.intent)
    }
}

impl Responder for TemplateResponder {
    fn name(&self) -> &str {
        "template"
    }

    fn respond(&self, prompt: &str) -> Result<String> {
        let reply = match Self::find_template(prompt) {
            Some(template) => {
                tracing::debug!("Template topic {} matched", template.topic);
                template.reply
            }
            None => DEFAULT_REPLY,
        };
        Ok(reply.to_string())
    }
}

/// Answers with `primary`, falling back to the templates when it fails
pub struct FallbackResponder<P> {
    primary: P,
    fallback: TemplateResponder,
}

impl<P: Responder> FallbackResponder<P> {
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            fallback: TemplateResponder,
        }
    }
}

impl<P: Responder> Responder for FallbackResponder<P> {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn respond(&self, prompt: &str) -> Result<String> {
        self.answer(prompt).map(|answer| answer.text)
    }

    fn answer(&self, prompt: &str) -> Result<Answer> {
        match self.primary.answer(prompt) {
            Ok(answer) => Ok(answer),
            Err(e) => {
                tracing::warn!(
                    "{} failed, answering from templates: {}",
                    self.primary.name(),
                    e
                );
                self.fallback.answer(prompt)
            }
        }
    }
}

/// What the patient sees for one message
#[derive(Clone, Debug, Serialize)]
pub struct ChatReply {
    pub interaction_id: Uuid,
    pub safety_flag: SafetyFlag,
    pub intent_type: IntentType,
    pub message: String,
}

pub struct Assistant {
    responder: Box<dyn Responder>,
}

impl Assistant {
    pub fn new(responder: Box<dyn Responder>) -> Self {
        Self { responder }
    }

    /// Pick the responder named in the `[assistant]` config section
    ///
    /// A remote provider is always wrapped so that outages degrade to
    /// template answers instead of errors.
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let responder: Box<dyn Responder> = match config.provider {
            ProviderKind::Template => Box::new(TemplateResponder),
            ProviderKind::OpenaiCompatible => Box::new(FallbackResponder::new(
                OpenAiCompatibleResponder::from_config(config)?,
            )),
        };
        tracing::debug!("Assistant using {} responder", responder.name());
        Ok(Self::new(responder))
    }

    pub fn provider_name(&self) -> &str {
        self.responder.name()
    }

    /// Screen, answer and audit one patient message
    pub fn chat(
        &self,
        audit: &mut dyn RecordSink<AiInteraction>,
        patient_id: &str,
        session_id: Uuid,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatReply> {
        let started = Instant::now();
        let classification = classify(message);
        let mapping = AuditMapping::for_flag(classification.flag);

        let (reply, intent_type, provider) = match classification.message {
            Some(canned) => {
                tracing::info!(
                    "Message from {} flagged {}, skipping responder",
                    patient_id,
                    classification.flag
                );
                (canned, mapping.intent_type, SAFETY_FILTER_PROVIDER.to_string())
            }
            None => {
                let answer = self.responder.answer(message)?;
                (answer.text, TemplateResponder::intent_for(message), answer.provider)
            }
        };

        let interaction = AiInteraction {
            id: Uuid::new_v4(),
            patient_id: patient_id.to_string(),
            session_id,
            created_at: now,
            safety_flag: classification.flag,
            intent_type,
            risk_level: mapping.risk_level,
            user_message: message.to_string(),
            ai_response: reply.clone(),
            was_blocked: mapping.was_blocked,
            blocked_reason: mapping.blocked_reason.map(str::to_string),
            safety_warning_shown: mapping.safety_warning_shown,
            ai_provider: provider,
            response_time_ms: started.elapsed().as_millis() as u64,
        };
        audit.append(&interaction)?;

        Ok(ChatReply {
            interaction_id: interaction.id,
            safety_flag: interaction.safety_flag,
            intent_type,
            message: reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging;
    use crate::types::RiskLevel;
    use crate::Error;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts calls and fails on demand
    struct ScriptedResponder {
        calls: Cell<usize>,
        fail: bool,
    }

    impl ScriptedResponder {
        fn new(fail: bool) -> Self {
            Self {
                calls: Cell::new(0),
                fail,
            }
        }
    }

    impl Responder for Rc<ScriptedResponder> {
        fn name(&self) -> &str {
            "scripted"
        }

        fn respond(&self, _prompt: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(Error::Provider("connection refused".into()))
            } else {
                Ok("scripted reply".into())
            }
        }
    }

    fn chat(assistant: &Assistant, audit: &mut Vec<AiInteraction>, message: &str) -> ChatReply {
        assistant
            .chat(audit, "p1", Uuid::new_v4(), message, Utc::now())
            .unwrap()
    }

    #[test]
    fn test_blocked_request_skips_responder() {
        logging::init_test();
        let scripted = Rc::new(ScriptedResponder::new(false));
        let assistant = Assistant::new(Box::new(Rc::clone(&scripted)));
        let mut audit = Vec::new();

        let reply = chat(&assistant, &mut audit, "Can you diagnose me? I have severe pain");
        assert_eq!(reply.safety_flag, SafetyFlag::BlockedRequest);
        assert!(reply.message.contains("doctor"));
        assert_eq!(scripted.calls.get(), 0);

        let row = &audit[0];
        assert!(row.was_blocked);
        assert!(!row.safety_warning_shown);
        assert_eq!(row.intent_type, IntentType::Blocked);
        assert_eq!(row.ai_provider, SAFETY_FILTER_PROVIDER);
        assert_eq!(row.ai_response, reply.message);
    }

    #[test]
    fn test_warning_flags_are_audited_as_high_risk() {
        let assistant = Assistant::new(Box::new(TemplateResponder));
        let mut audit = Vec::new();

        chat(&assistant, &mut audit, "This is unbearable pain");
        chat(&assistant, &mut audit, "I think I have a fever");

        assert_eq!(audit[0].safety_flag, SafetyFlag::PainWarning);
        assert_eq!(audit[1].safety_flag, SafetyFlag::RedirectToDoctor);
        for row in &audit {
            assert!(row.safety_warning_shown);
            assert!(!row.was_blocked);
            assert_eq!(row.risk_level, RiskLevel::High);
            assert!(row.blocked_reason.is_some());
        }
    }

    #[test]
    fn test_safe_message_uses_templates() {
        let assistant = Assistant::new(Box::new(TemplateResponder));
        let mut audit = Vec::new();

        let reply = chat(&assistant, &mut audit, "Why do I need this medicine?");
        assert_eq!(reply.safety_flag, SafetyFlag::Safe);
        assert!(reply.message.contains("Pain relievers"));
        assert_eq!(audit[0].ai_provider, "template");
        assert_eq!(audit[0].risk_level, RiskLevel::Low);
        assert_eq!(audit[0].blocked_reason, None);
    }

    #[test]
    fn test_anxiety_is_emotional_support() {
        let assistant = Assistant::new(Box::new(TemplateResponder));
        let mut audit = Vec::new();

        let reply = chat(&assistant, &mut audit, "I'm worried I'm healing too slowly");
        assert_eq!(reply.intent_type, IntentType::EmotionalSupport);
        assert_eq!(audit[0].intent_type, IntentType::EmotionalSupport);
    }

    #[test]
    fn test_template_needs_every_keyword_group() {
        // "why" alone must not pick the medication template
        assert!(TemplateResponder::find_template("why is the sky blue").is_none());
        assert_eq!(
            TemplateResponder.respond("hello").unwrap(),
            DEFAULT_REPLY
        );
        assert_eq!(
            TemplateResponder::find_template("What should I eat?").map(|t| t.topic),
            Some("nutrition")
        );
    }

    #[test]
    fn test_fallback_answers_when_primary_fails() {
        logging::init_test();
        let failing = Rc::new(ScriptedResponder::new(true));
        let fallback = FallbackResponder::new(Rc::clone(&failing));

        let answer = fallback.answer("Tips for better sleep?").unwrap();
        assert!(answer.text.contains("bedtime"));
        assert_eq!(answer.provider, "template");
        assert_eq!(failing.calls.get(), 1);
        assert_eq!(fallback.name(), "scripted");
    }

    #[test]
    fn test_audit_names_the_responder_that_answered() {
        let failing = Rc::new(ScriptedResponder::new(true));
        let assistant = Assistant::new(Box::new(FallbackResponder::new(Rc::clone(&failing))));
        let mut audit = Vec::new();

        chat(&assistant, &mut audit, "How can I sleep better?");
        assert_eq!(audit[0].ai_provider, "template");

        let working = Rc::new(ScriptedResponder::new(false));
        let assistant = Assistant::new(Box::new(FallbackResponder::new(Rc::clone(&working))));
        chat(&assistant, &mut audit, "How can I sleep better?");
        assert_eq!(audit[1].ai_provider, "scripted");
        assert_eq!(audit[1].ai_response, "scripted reply");
    }

    #[test]
    fn test_fallback_passes_through_success() {
        let working = Rc::new(ScriptedResponder::new(false));
        let fallback = FallbackResponder::new(Rc::clone(&working));
        assert_eq!(fallback.respond("anything").unwrap(), "scripted reply");
        assert_eq!(working.calls.get(), 1);
    }

    #[test]
    fn test_from_config_selects_provider() {
        let mut config = AssistantConfig::default();
        assert_eq!(Assistant::from_config(&config).unwrap().provider_name(), "template");

        config.provider = ProviderKind::OpenaiCompatible;
        config.base_url = "http://127.0.0.1:9/v1".into();
        config.timeout_secs = 2;
        let assistant = Assistant::from_config(&config).unwrap();
        assert_eq!(assistant.provider_name(), "openai_compatible");

        // Unreachable server still yields a template answer
        let mut audit = Vec::new();
        let reply = chat(&assistant, &mut audit, "How much exercise is enough?");
        assert!(reply.message.contains("movement"));
        assert_eq!(audit[0].ai_provider, "template");
    }
}
