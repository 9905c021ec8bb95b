//! Debate orchestration engine.
//!
//! Composes the prompt builders, the completion gateway, the response
//! parser and the session state machine. Every operation works on an owned
//! copy of the session and persists only after fully applying its effect,
//! so a failed call leaves the stored session exactly as it was before -
//! except synthesis, which persists an explicit rollback to
//! `debate_running` so a stuck transient state can never survive a failure.
//!
//! The engine assumes at most one in-flight turn or synthesis call per
//! session; serializing calls against a session is the caller's job.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::gateway::CompletionGateway;
use crate::models::{
    Calibration, DebateMessage, Intervention, Role, Session, SessionState, Verdict,
};
use crate::parse::{DEFAULT_HEAT, SummaryPayload, TurnPayload, parse_payload};
use crate::prompts;
use crate::store::SessionStore;

/// Hard turn cutoff. The 6-10 turn synthesis-readiness guidance in the
/// moderator prompt is a hint to the model only; this constant is the one
/// that drives `should_end`.
pub const MAX_TURNS: u32 = 10;

/// Assumption recorded when the creation-time summary call fails.
const NO_SUMMARY_ASSUMPTION: &str = "No AI summary available - using your input as-is";

/// Inputs for session creation.
#[derive(Debug, Clone)]
pub struct NewSessionRequest {
    pub user_id: String,
    pub decision: String,
    pub context: String,
    pub constraints: String,
    pub optimizing_for: String,
    pub calibration: Calibration,
}

/// Result of a turn: the updated session, the model's self-reported heat
/// (display only), and whether the debate reached the hard cutoff.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session: Session,
    pub heat: u8,
    pub should_end: bool,
}

pub struct DebateEngine {
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn CompletionGateway>,
}

impl DebateEngine {
    pub fn new(store: Arc<dyn SessionStore>, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { store, gateway }
    }

    // ========================================================================
    // Session creation
    // ========================================================================

    /// Create a session in `confirm` with an empty transcript.
    ///
    /// A one-shot summarization call is attempted; if it fails (gateway or
    /// parse), the session is still created, falling back to the raw
    /// decision text plus a sentinel assumption.
    pub async fn create_session(&self, request: NewSessionRequest) -> Result<Session> {
        if request.decision.trim().is_empty() {
            return Err(EngineError::Validation("decision text is required".to_string()));
        }

        let mut session = Session::new(
            request.user_id,
            request.decision.clone(),
            request.context.clone(),
            request.constraints,
            request.optimizing_for,
            request.calibration,
        );

        match self.summarize_decision(&request.decision, &request.context).await {
            Ok(payload) => {
                session.summary = Some(payload.summary);
                session.record_assumptions(payload.assumptions);
            }
            Err(e) => {
                warn!("summary call failed, creating session without it: {e}");
                session.summary = Some(request.decision);
                session.record_assumptions([NO_SUMMARY_ASSUMPTION.to_string()]);
            }
        }

        self.store.put(&session).await?;
        info!(session_id = %session.id, "created debate session");
        Ok(session)
    }

    async fn summarize_decision(&self, decision: &str, context: &str) -> Result<SummaryPayload> {
        let prompt = prompts::summary_prompt(decision, context);
        let raw = self.gateway.complete(&prompt, None).await?;
        parse_payload(&raw)
    }

    // ========================================================================
    // Turn flow
    // ========================================================================

    /// Generate the next persona turn, optionally preceded by a user
    /// intervention. See [`Intervention`] for the variants.
    pub async fn take_turn(
        &self,
        session_id: &str,
        intervention: Option<Intervention>,
    ) -> Result<TurnOutcome> {
        let mut session = self.load_required(session_id).await?;

        // Undo bypasses generation entirely.
        if matches!(intervention, Some(Intervention::Undo)) {
            if session.undo_last().is_some() {
                self.store.put(&session).await?;
                info!(session_id = %session.id, "undid last transcript message");
            }
            let should_end = session.turn_count >= MAX_TURNS;
            return Ok(TurnOutcome {
                session,
                heat: DEFAULT_HEAT,
                should_end,
            });
        }

        // First turn against a confirmed session starts the debate.
        if session.state == SessionState::Confirm {
            session.state = SessionState::DebateRunning;
        }
        if session.state != SessionState::DebateRunning {
            return Err(EngineError::IllegalState {
                state: session.state,
                reason: "debate is not running".to_string(),
            });
        }

        // Pushback/reframe append a user message before generation;
        // reframe also replaces the decision statement.
        match &intervention {
            Some(Intervention::Pushback(message)) => {
                session.push_message(DebateMessage::new(
                    Role::User,
                    format!("[PUSHBACK]: {message}"),
                ));
            }
            Some(Intervention::Reframe(message)) => {
                session.push_message(DebateMessage::new(
                    Role::User,
                    format!("[REFRAME]: {message}"),
                ));
                session.decision = message.clone();
            }
            _ => {}
        }

        let speaker = session.next_speaker();
        let system = prompts::moderator_system_prompt(&session);
        let prompt = prompts::turn_prompt(&session, speaker, intervention.as_ref());

        // Any failure from here on propagates without persisting: the
        // stored session keeps its pre-call shape and stays running.
        let raw = self.gateway.complete(&prompt, Some(&system)).await?;
        let payload: TurnPayload = parse_payload(&raw)?;

        let message = DebateMessage::new(speaker, payload.content.clone())
            .with_assumptions(payload.assumptions.clone());
        session.push_message(message);
        session.turn_count += 1;
        let heat = payload.heat();
        session.record_assumptions(payload.assumptions);

        let should_end = session.turn_count >= MAX_TURNS;
        self.store.put(&session).await?;

        info!(
            session_id = %session.id,
            speaker = speaker.tag(),
            turn = session.turn_count,
            "persona turn appended"
        );

        Ok(TurnOutcome {
            heat,
            should_end,
            session,
        })
    }

    // ========================================================================
    // Synthesis
    // ========================================================================

    /// Distill the debate into a verdict and move the session to
    /// `verdict_ready`.
    ///
    /// Idempotent: a session already holding a verdict is returned as-is
    /// with no gateway call. On failure the session is rolled back to
    /// `debate_running` (and the rollback persisted) before the error is
    /// re-raised, so retrying is always possible.
    pub async fn synthesize(&self, session_id: &str) -> Result<Session> {
        let mut session = self.load_required(session_id).await?;

        if session.state == SessionState::VerdictReady && session.verdict.is_some() {
            return Ok(session);
        }

        let prompt = prompts::synthesis_prompt(&session);
        let verdict: Verdict = match self.run_synthesis_call(&prompt).await {
            Ok(v) => v,
            Err(e) => {
                session.state = SessionState::DebateRunning;
                if let Err(persist_err) = self.store.put(&session).await {
                    warn!("failed to persist synthesis rollback: {persist_err}");
                }
                return Err(e);
            }
        };

        session.verdict = Some(verdict);
        session.state = SessionState::VerdictReady;
        self.store.put(&session).await?;

        info!(session_id = %session.id, "verdict attached");
        Ok(session)
    }

    async fn run_synthesis_call(&self, prompt: &str) -> Result<Verdict> {
        let raw = self.gateway.complete(prompt, None).await?;
        parse_payload(&raw)
    }

    // ========================================================================
    // User curation
    // ========================================================================

    /// Toggle the highlight flag on a transcript message.
    pub async fn set_pinned(
        &self,
        session_id: &str,
        message_id: &str,
        pinned: bool,
    ) -> Result<Session> {
        let mut session = self.load_required(session_id).await?;
        if !session.set_pinned(message_id, pinned) {
            return Err(EngineError::NotFound(format!(
                "message {message_id} in session {session_id}"
            )));
        }
        self.store.put(&session).await?;
        Ok(session)
    }

    /// Record the user's final decision against an existing verdict.
    /// Append-only: rejected if the verdict is absent or already decided.
    pub async fn record_decision(
        &self,
        session_id: &str,
        decision: String,
        reason: Option<String>,
    ) -> Result<Session> {
        let mut session = self.load_required(session_id).await?;

        let Some(verdict) = session.verdict.as_mut() else {
            return Err(EngineError::IllegalState {
                state: session.state,
                reason: "no verdict to decide against".to_string(),
            });
        };
        if verdict.is_decided() {
            return Err(EngineError::IllegalState {
                state: session.state,
                reason: "final decision already recorded".to_string(),
            });
        }

        verdict.user_decision = Some(decision);
        verdict.user_reason = reason;
        self.store.put(&session).await?;
        Ok(session)
    }

    // ========================================================================
    // Read paths
    // ========================================================================

    pub async fn load_session(&self, session_id: &str) -> Result<Session> {
        self.load_required(session_id).await
    }

    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        self.store.list_for_user(user_id).await
    }

    async fn load_required(&self, session_id: &str) -> Result<Session> {
        self.store
            .get(session_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(session_id.to_string()))
    }
}
