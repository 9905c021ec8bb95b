//! Structured payload extraction from raw model output.
//!
//! Language models reliably wrap valid JSON in prose or code fencing, so a
//! strict decode would reject turns the engine can recover. Decoding is
//! therefore two-tier: strip fence markers and parse directly, then fall
//! back to the outermost brace-delimited substring. This leniency is
//! deliberate; the upstream output format is not contractually guaranteed.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::EngineError;

/// How much of the raw response to include in a parse error.
const ERROR_PREFIX_LEN: usize = 200;

/// Heat value reported when the model omits it or reports garbage.
pub const DEFAULT_HEAT: u8 = 3;

// ============================================================================
// Payload shapes
// ============================================================================

/// Payload of the session-creation summary call.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryPayload {
    pub summary: String,
    #[serde(default)]
    pub assumptions: Vec<String>,
}

/// Payload of a persona turn.
#[derive(Debug, Clone, Deserialize)]
pub struct TurnPayload {
    pub content: String,
    #[serde(default)]
    pub assumptions: Vec<String>,
    /// Self-reported 1-5 intensity. Kept loose: a missing or non-numeric
    /// value must not fail the whole turn.
    #[serde(default)]
    heat: Option<Value>,
}

impl TurnPayload {
    /// Heat clamped to 1-5, defaulting to 3 when absent or invalid.
    pub fn heat(&self) -> u8 {
        match self.heat.as_ref().and_then(Value::as_i64) {
            Some(h) if (1..=5).contains(&h) => h as u8,
            _ => DEFAULT_HEAT,
        }
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Remove ``` fence markers (with an optional language tag such as `json`)
/// from the text, leaving the fenced content in place.
fn strip_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("```") {
        out.push_str(&rest[..idx]);
        rest = &rest[idx + 3..];
        // Skip the language tag glued to the opening fence. ASCII only, so
        // char count equals byte length.
        let tag_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        rest = &rest[tag_len..];
    }
    out.push_str(rest);
    out
}

/// Extract the outermost brace-delimited substring, if any.
fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse one structured payload out of raw model output.
///
/// Tier 1: strip fencing and whitespace, parse directly. Tier 2: parse the
/// first outermost `{...}` substring. Both failing is a [`EngineError::Parse`]
/// carrying a bounded prefix of the original text for diagnosability.
pub fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T, EngineError> {
    let cleaned = strip_fences(raw);
    let cleaned = cleaned.trim();

    if let Ok(parsed) = serde_json::from_str(cleaned) {
        return Ok(parsed);
    }

    if let Some(block) = extract_json_block(cleaned)
        && let Ok(parsed) = serde_json::from_str(block)
    {
        return Ok(parsed);
    }

    let prefix: String = raw.chars().take(ERROR_PREFIX_LEN).collect();
    Err(EngineError::Parse(format!(
        "response is not the expected JSON payload: {prefix}"
    )))
}
