//! Anthropic messages-API judge.

use async_trait::async_trait;
use questline_core::verification::Judgement;
use serde_json::json;

use super::{build_prompt, parse_judgement, JudgementRequest, Verifier, VerifierError};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicVerifier {
    client: reqwest::Client,
}

impl AnthropicVerifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Verifier for AnthropicVerifier {
    async fn judge(&self, request: &JudgementRequest) -> Result<Judgement, VerifierError> {
        let body = json!({
            "model": request.model,
            "max_tokens": 200,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": build_prompt(request) },
                        {
                            "type": "image",
                            "source": { "type": "url", "url": request.proof_url },
                        },
                    ],
                },
            ],
        });

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &request.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let reply: serde_json::Value = response.json().await?;
        let content = reply["content"][0]["text"].as_str().ok_or_else(|| {
            VerifierError::Malformed("response missing content[0].text".into())
        })?;

        parse_judgement(content)
    }
}
