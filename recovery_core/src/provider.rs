//! OpenAI-compatible chat completions responder.
//!
//! Works with any server that speaks the `/chat/completions` protocol:
//! Ollama, vLLM, LocalAI or a hosted API. Only safe messages ever reach
//! it; the classifier answers everything else locally.

use crate::assistant::Responder;
use crate::config::AssistantConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 5;

const SYSTEM_PROMPT: &str = "You are a supportive recovery companion for a patient \
healing after surgery or injury. Explain recovery topics in plain language, encourage \
the patient's prescribed routine and keep answers short. Never diagnose, never \
recommend starting, stopping or changing a medication, and tell the patient to contact \
their doctor about anything that sounds like a complication.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Blocking client for an OpenAI-compatible endpoint
pub struct OpenAiCompatibleResponder {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompatibleResponder {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Provider(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    /// Build from the `[assistant]` config section
    ///
    /// The API key is read from the environment variable named by
    /// `api_key_env`; local servers usually need none.
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::debug!("{} not set, sending requests without a key", config.api_key_env);
        }

        Self::new(
            &config.base_url,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> Error {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) => Error::Provider(format!("API error ({}): {}", status, parsed.error.message)),
            Err(_) => Error::Provider(format!(
                "API error ({}): {}",
                status,
                body.chars().take(200).collect::<String>()
            )),
        }
    }
}

impl Responder for OpenAiCompatibleResponder {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    fn respond(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
        };

        let mut http_request = self.client.post(self.api_url("chat/completions")).json(&request);
        if let Some(ref key) = self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().map_err(|e| {
            if e.is_connect() {
                Error::Provider(format!("cannot connect to {}: {}", self.base_url, e))
            } else if e.is_timeout() {
                Error::Provider(format!("request to {} timed out", self.base_url))
            } else {
                Error::Provider(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::Provider(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Provider(format!("failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Provider("API returned no content".into()))?;

        tracing::debug!("Received {} chars from {}", content.len(), self.model);
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_strips_trailing_slash() {
        let responder =
            OpenAiCompatibleResponder::new("http://localhost:11434/v1/", "m", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            responder.api_url("chat/completions"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_error_body_message_is_surfaced() {
        let body = r#"{"error":{"message":"model not found","type":"invalid_request_error"}}"#;
        let err = OpenAiCompatibleResponder::parse_error_response(reqwest::StatusCode::NOT_FOUND, body);
        assert!(err.to_string().contains("model not found"));

        let err = OpenAiCompatibleResponder::parse_error_response(
            reqwest::StatusCode::BAD_GATEWAY,
            "<html>bad gateway</html>",
        );
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn test_unreachable_server_is_provider_error() {
        // Port 9 (discard) is not listening on test machines
        let responder = OpenAiCompatibleResponder::new(
            "http://127.0.0.1:9/v1",
            "m",
            None,
            Duration::from_secs(2),
        )
        .unwrap();
        assert!(matches!(responder.respond("hello"), Err(Error::Provider(_))));
    }

    #[test]
    fn test_response_parsing_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Rest well."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Rest well."));
    }
}
