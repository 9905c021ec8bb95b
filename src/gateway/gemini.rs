//! Gemini generateContent backend.
//!
//! The request shape has no separate system field, so the system-level
//! instruction is folded in front of the user prompt.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use super::{MAX_TOKENS, TEMPERATURE};
use crate::error::{EngineError, Result};
use crate::gateway::CompletionGateway;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiGateway {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiGateway {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl CompletionGateway for GeminiGateway {
    async fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let full_prompt = match system_prompt {
            Some(system) => format!("{system}\n\n{prompt}"),
            None => prompt.to_string(),
        };

        let body = json!({
            "contents": [{ "parts": [{ "text": full_prompt }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_TOKENS,
            },
        });

        debug!(model = %self.model, "requesting content generation");

        let url = format!(
            "{BASE_URL}/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Gateway(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::Gateway(format!(
                "Gemini API error {status}: {error_text}"
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| EngineError::Gateway(format!("invalid response body: {e}")))?;

        data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .filter(|c| !c.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                EngineError::Gateway(
                    "Gemini returned empty response - no candidates or content".to_string(),
                )
            })
    }
}
