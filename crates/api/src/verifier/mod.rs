//! AI proof-verification providers.
//!
//! A [`Verifier`] turns a proof submission into a `{confidence, reason}`
//! judgement by calling an external model API. One implementation exists per
//! provider; the active one is selected by the target's stored
//! configuration. Callers never see provider errors directly: the
//! verification service degrades every failure to a zero-confidence
//! judgement so the queue entry stays pending for manual review.

mod anthropic;
mod openai;

use async_trait::async_trait;
use questline_core::error::CoreError;
use questline_core::verification::Judgement;

pub use anthropic::AnthropicVerifier;
pub use openai::OpenAiVerifier;

/// Provider identifier for OpenAI-compatible chat completion APIs.
pub const PROVIDER_OPENAI: &str = "openai";
/// Provider identifier for the Anthropic messages API.
pub const PROVIDER_ANTHROPIC: &str = "anthropic";

/// Everything a provider needs for one judgement call. The API key is held
/// only for the duration of the call.
#[derive(Debug, Clone)]
pub struct JudgementRequest {
    pub model: String,
    pub api_key: String,
    pub proof_url: String,
    pub task_title: String,
    pub task_description: Option<String>,
    pub custom_prompt: Option<String>,
}

/// Errors from a provider call. These never escape the verification
/// service; they are logged and degraded to [`Judgement::failed`].
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// An external judge for proof submissions.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn judge(&self, request: &JudgementRequest) -> Result<Judgement, VerifierError>;
}

/// Select the provider implementation named by a verifier configuration.
pub fn for_provider(
    provider: &str,
    client: reqwest::Client,
) -> Result<Box<dyn Verifier>, CoreError> {
    match provider {
        PROVIDER_OPENAI => Ok(Box::new(OpenAiVerifier::new(client))),
        PROVIDER_ANTHROPIC => Ok(Box::new(AnthropicVerifier::new(client))),
        other => {
            tracing::warn!(provider = other, "Unknown verification provider");
            Err(CoreError::VerifierNotConfigured)
        }
    }
}

/// Build the instruction text sent to the judge. The configured custom
/// prompt replaces the default instruction but the response contract stays
/// fixed.
pub(crate) fn build_prompt(request: &JudgementRequest) -> String {
    let instruction = match &request.custom_prompt {
        Some(custom) => custom.clone(),
        None => format!(
            "Assess whether the submitted proof plausibly shows completion of the task \
             \"{}\"{}.",
            request.task_title,
            request
                .task_description
                .as_deref()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default(),
        ),
    };
    format!(
        "{instruction}\n\nProof: {}\n\nRespond with only a JSON object of the form \
         {{\"confidence\": <number between 0 and 1>, \"reason\": <short string>}}.",
        request.proof_url
    )
}

/// Parse the judge's reply into a [`Judgement`].
///
/// Models occasionally wrap JSON in a code fence; tolerate that, but reject
/// anything that does not contain the contract fields. Confidence is clamped
/// to `[0, 1]`.
pub(crate) fn parse_judgement(raw: &str) -> Result<Judgement, VerifierError> {
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    #[derive(serde::Deserialize)]
    struct Reply {
        confidence: f32,
        reason: String,
    }

    let reply: Reply = serde_json::from_str(trimmed)
        .map_err(|e| VerifierError::Malformed(format!("invalid judgement JSON: {e}")))?;

    Ok(Judgement {
        confidence: reply.confidence.clamp(0.0, 1.0),
        reason: reply.reason,
    })
}

/// Fixed-answer verifier for tests.
pub struct StubVerifier {
    pub result: Result<Judgement, String>,
}

#[async_trait]
impl Verifier for StubVerifier {
    async fn judge(&self, _request: &JudgementRequest) -> Result<Judgement, VerifierError> {
        match &self.result {
            Ok(judgement) => Ok(judgement.clone()),
            Err(msg) => Err(VerifierError::Malformed(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JudgementRequest {
        JudgementRequest {
            model: "gpt-4o".to_string(),
            api_key: "sk-test".to_string(),
            proof_url: "https://example.com/proof.jpg".to_string(),
            task_title: "Morning run".to_string(),
            task_description: Some("5km minimum".to_string()),
            custom_prompt: None,
        }
    }

    #[test]
    fn test_default_prompt_mentions_task_and_contract() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("Morning run"));
        assert!(prompt.contains("5km minimum"));
        assert!(prompt.contains("https://example.com/proof.jpg"));
        assert!(prompt.contains("\"confidence\""));
    }

    #[test]
    fn test_custom_prompt_replaces_instruction() {
        let mut req = request();
        req.custom_prompt = Some("Check for a treadmill screenshot.".to_string());
        let prompt = build_prompt(&req);
        assert!(prompt.contains("Check for a treadmill screenshot."));
        assert!(!prompt.contains("plausibly shows completion"));
    }

    #[test]
    fn test_parse_plain_judgement() {
        let judgement =
            parse_judgement(r#"{"confidence": 0.92, "reason": "clear photo"}"#).unwrap();
        assert!((judgement.confidence - 0.92).abs() < f32::EPSILON);
        assert_eq!(judgement.reason, "clear photo");
    }

    #[test]
    fn test_parse_fenced_judgement() {
        let raw = "```json\n{\"confidence\": 0.5, \"reason\": \"unclear\"}\n```";
        let judgement = parse_judgement(raw).unwrap();
        assert!((judgement.confidence - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_clamps_confidence() {
        let judgement = parse_judgement(r#"{"confidence": 1.7, "reason": "x"}"#).unwrap();
        assert!((judgement.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_judgement("I think this looks fine.").is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result = for_provider("palmtree", reqwest::Client::new());
        assert!(result.is_err());
    }
}
