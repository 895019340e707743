//! OpenAI chat-completions judge.

use async_trait::async_trait;
use questline_core::verification::Judgement;
use serde_json::json;

use super::{build_prompt, parse_judgement, JudgementRequest, Verifier, VerifierError};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiVerifier {
    client: reqwest::Client,
}

impl OpenAiVerifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Verifier for OpenAiVerifier {
    async fn judge(&self, request: &JudgementRequest) -> Result<Judgement, VerifierError> {
        let body = json!({
            "model": request.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": build_prompt(request) },
                        { "type": "image_url", "image_url": { "url": request.proof_url } },
                    ],
                },
            ],
            "max_tokens": 200,
        });

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&request.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let reply: serde_json::Value = response.json().await?;
        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                VerifierError::Malformed("response missing choices[0].message.content".into())
            })?;

        parse_judgement(content)
    }
}
