//! Verdict produced by the synthesis flow.

use serde::{Deserialize, Serialize};

/// Structured synthesis of a completed debate. Attached to the session if
/// and only if the session is in `verdict_ready`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Best points attributed to the Risk-Taker (2-3).
    pub best_points_a: Vec<String>,
    /// Best points attributed to the Pragmatist (2-3).
    pub best_points_b: Vec<String>,
    /// Facts both sides agreed on.
    pub shared_facts: Vec<String>,
    /// Unresolved questions worth investigating.
    pub open_questions: Vec<String>,
    /// One actionable next step that flags its own uncertainty.
    pub recommended_next_step: String,
    /// User-recorded final decision. Append-only, set at most once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_decision: Option<String>,
    /// Rationale accompanying the final decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_reason: Option<String>,
}

impl Verdict {
    /// Whether the user has already recorded their final decision.
    pub fn is_decided(&self) -> bool {
        self.user_decision.is_some()
    }
}
