//! Session aggregate and debate transcript types.
//!
//! A `Session` is the single shared mutable resource of the engine. It is
//! mutated exclusively through the orchestrator operations, which work on an
//! owned copy and persist only on success, so a failed operation leaves the
//! stored session untouched.

use serde::{Deserialize, Serialize};

use crate::models::Verdict;

/// Generate a short session/message identifier (8 hex chars of a v4 UUID).
pub fn short_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============================================================================
// Calibration
// ============================================================================

/// Four sliders (0-100) biasing how strongly each persona argues.
/// Immutable once the debate starts; passed through to every prompt build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    pub risk_tolerance: u8,
    pub time_horizon: u8,
    pub social_impact: u8,
    pub money_sensitivity: u8,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            risk_tolerance: 50,
            time_horizon: 50,
            social_impact: 50,
            money_sensitivity: 50,
        }
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Lifecycle state of a debate session.
///
/// `intake` exists only pre-creation on the caller side; a materialized
/// session starts in `confirm`. `debate_paused` and `synthesis` are
/// display-oriented values the engine accepts but never requires: pause is
/// enforced by the caller not issuing turn requests, and synthesis-in-flight
/// is never persisted as an intermediate state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Intake,
    Confirm,
    DebateRunning,
    DebatePaused,
    Synthesis,
    VerdictReady,
}

// ============================================================================
// Transcript
// ============================================================================

/// Speaker role of a transcript entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PersonaA,
    PersonaB,
    User,
    System,
}

impl Role {
    /// Wire/transcript tag, e.g. `persona_a`.
    pub fn tag(&self) -> &'static str {
        match self {
            Role::PersonaA => "persona_a",
            Role::PersonaB => "persona_b",
            Role::User => "user",
            Role::System => "system",
        }
    }

    pub fn is_persona(&self) -> bool {
        matches!(self, Role::PersonaA | Role::PersonaB)
    }
}

/// One entry in the debate transcript. Immutable once appended, except the
/// user-toggled `pinned` flag. Append order IS the debate order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Creation time in unix milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub pinned: bool,
    /// Assumption strings the speaker declared for this turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assumptions: Vec<String>,
}

impl DebateMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: short_id(),
            role,
            content: content.into(),
            timestamp: now_millis(),
            pinned: false,
            assumptions: Vec::new(),
        }
    }

    pub fn with_assumptions(mut self, assumptions: Vec<String>) -> Self {
        self.assumptions = assumptions;
        self
    }
}

// ============================================================================
// Interventions
// ============================================================================

/// A user-initiated action that alters the next turn's prompt or the
/// transcript directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intervention {
    /// Pop the most recent transcript message; no completion call is made.
    Undo,
    /// Challenge the current line of argument; the next persona must
    /// address it directly.
    Pushback(String),
    /// Replace the decision statement and steer the debate accordingly.
    Reframe(String),
    /// Ask the next persona to state assumptions and ask one clarifying
    /// question; nothing is appended for the user.
    Clarify,
}

// ============================================================================
// Session
// ============================================================================

/// The aggregate root: full state of one debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    /// Owning user reference.
    pub user_id: String,
    /// The decision statement. Mutable exactly once, via a reframe
    /// intervention.
    pub decision: String,
    pub context: String,
    pub constraints: String,
    pub optimizing_for: String,
    pub calibration: Calibration,
    pub state: SessionState,
    pub messages: Vec<DebateMessage>,
    /// Deduplicated accumulation of every assumption discovered so far,
    /// in insertion order. Never shrunk by the turn flow.
    pub assumptions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    /// Number of persona messages appended via the turn flow. User
    /// intervention messages do not count.
    pub turn_count: u32,
    /// Creation time in unix milliseconds.
    pub created_at: i64,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        decision: impl Into<String>,
        context: impl Into<String>,
        constraints: impl Into<String>,
        optimizing_for: impl Into<String>,
        calibration: Calibration,
    ) -> Self {
        Self {
            id: short_id(),
            user_id: user_id.into(),
            decision: decision.into(),
            context: context.into(),
            constraints: constraints.into(),
            optimizing_for: optimizing_for.into(),
            calibration,
            state: SessionState::Confirm,
            messages: Vec::new(),
            assumptions: Vec::new(),
            summary: None,
            verdict: None,
            turn_count: 0,
            created_at: now_millis(),
        }
    }

    /// Determine who speaks next by scanning the transcript from the end
    /// for the most recent persona message. Guarantees strict alternation
    /// and that `persona_a` opens the debate.
    pub fn next_speaker(&self) -> Role {
        let last_persona = self.messages.iter().rev().find(|m| m.role.is_persona());
        match last_persona {
            None => Role::PersonaA,
            Some(m) if m.role == Role::PersonaB => Role::PersonaA,
            Some(_) => Role::PersonaB,
        }
    }

    /// Append a message to the transcript.
    pub fn push_message(&mut self, message: DebateMessage) {
        self.messages.push(message);
    }

    /// Merge new assumption strings into the accumulated set, skipping ones
    /// already present and preserving insertion order.
    pub fn record_assumptions<I>(&mut self, assumptions: I)
    where
        I: IntoIterator<Item = String>,
    {
        for a in assumptions {
            if !self.assumptions.contains(&a) {
                self.assumptions.push(a);
            }
        }
    }

    /// Remove the trailing transcript message and decrement the turn count
    /// by one, floored at zero. No-op on an empty transcript.
    pub fn undo_last(&mut self) -> Option<DebateMessage> {
        let popped = self.messages.pop()?;
        self.turn_count = self.turn_count.saturating_sub(1);
        Some(popped)
    }

    /// Toggle the user-curated highlight flag on a transcript message.
    /// Returns false if no message has that id.
    pub fn set_pinned(&mut self, message_id: &str, pinned: bool) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message_id) {
            Some(m) => {
                m.pinned = pinned;
                true
            }
            None => false,
        }
    }

    /// Role-tagged `[role]: content` lines for prompt embedding.
    pub fn transcript_lines(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|m| format!("[{}]: {}", m.role.tag(), m.content))
            .collect()
    }

    /// Pinned-message excerpts in transcript order.
    pub fn pinned_lines(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.pinned)
            .map(|m| format!("[{}]: {}", m.role.tag(), m.content))
            .collect()
    }
}
