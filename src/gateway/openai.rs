//! OpenAI-compatible chat completions backend.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use super::{MAX_TOKENS, TEMPERATURE};
use crate::error::{EngineError, Result};
use crate::gateway::CompletionGateway;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiGateway {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiGateway {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        debug!(model = %self.model, "requesting chat completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Gateway(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::Gateway(format!(
                "completion API error {status}: {error_text}"
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| EngineError::Gateway(format!("invalid response body: {e}")))?;

        data["choices"][0]["message"]["content"]
            .as_str()
            .filter(|c| !c.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                EngineError::Gateway(
                    "backend returned empty response - no choices or message content".to_string(),
                )
            })
    }
}
