//! Completion gateway: one operation over a configured text-generation
//! backend.
//!
//! The backend is resolved once at construction from the tagged config
//! variant; the gateway's identity is an explicit, testable dependency.
//! No retry or throttling happens here - that discipline belongs to the
//! caller.

pub mod gemini;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::GatewayConfig;
use crate::error::{EngineError, Result};

pub use gemini::GeminiGateway;
pub use openai::OpenAiGateway;

/// Sampling temperature shared by both backends.
pub const TEMPERATURE: f64 = 0.8;
/// Completion length cap shared by both backends.
pub const MAX_TOKENS: u32 = 500;

/// Abstract "generate a completion for a text prompt" capability.
///
/// Implementations must accept an optional system-level instruction separate
/// from the user prompt, return the single text completion, and fail
/// explicitly when the backend reports an error status or returns no usable
/// content.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String>;
}

/// Resolve the configured backend into a gateway instance.
pub fn build_gateway(config: &GatewayConfig) -> Result<Arc<dyn CompletionGateway>> {
    match config {
        GatewayConfig::OpenAi {
            api_key,
            base_url,
            model,
        } => {
            let api_key = resolve_key(api_key.as_deref(), "OPENAI_API_KEY")?;
            Ok(Arc::new(OpenAiGateway::new(
                api_key,
                base_url.clone(),
                model.clone(),
            )))
        }
        GatewayConfig::Gemini { api_key, model } => {
            let api_key = resolve_key(api_key.as_deref(), "GEMINI_API_KEY")?;
            Ok(Arc::new(GeminiGateway::new(api_key, model.clone())))
        }
    }
}

/// Prefer the configured key, fall back to the environment variable.
fn resolve_key(configured: Option<&str>, env_var: &str) -> Result<String> {
    if let Some(key) = configured
        && !key.trim().is_empty()
    {
        return Ok(key.to_string());
    }
    std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| EngineError::Gateway(format!("{env_var} is not configured")))
}
