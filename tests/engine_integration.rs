//! Integration tests for the debate orchestration engine.
//!
//! These tests drive the engine against a scripted mock gateway and the
//! in-memory store, covering:
//! - Session creation with and without a working summary call
//! - Turn alternation and the hard 10-turn cutoff
//! - Interventions (pushback, reframe, clarify, undo)
//! - Failure propagation and rollback guarantees
//! - Synthesis idempotence

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use counterpoint::{
    Calibration, CompletionGateway, DebateEngine, EngineError, Intervention, MemoryStore,
    NewSessionRequest, Role, Session, SessionState, SessionStore,
};

// ============================================================================
// Mock Gateway
// ============================================================================

/// Gateway returning a scripted sequence of responses. `Err` entries become
/// gateway failures; an exhausted script also fails, so tests notice
/// unexpected extra calls.
struct MockGateway {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
}

impl MockGateway {
    fn new(script: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionGateway for MockGateway {
    async fn complete(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
    ) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().await;
        match script.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(EngineError::Gateway(message)),
            None => Err(EngineError::Gateway("mock script exhausted".to_string())),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn summary_json() -> Result<String, String> {
    Ok(r#"{"summary":"A relocation decision.","assumptions":["Job is remote"]}"#.to_string())
}

fn turn_json(content: &str, heat: u8) -> Result<String, String> {
    Ok(format!(
        r#"{{"content":"{content}","assumptions":[],"heat":{heat}}}"#
    ))
}

fn turn_json_with_assumptions(content: &str, assumptions: &[&str]) -> Result<String, String> {
    let assumptions = assumptions
        .iter()
        .map(|a| format!("\"{a}\""))
        .collect::<Vec<_>>()
        .join(",");
    Ok(format!(
        r#"{{"content":"{content}","assumptions":[{assumptions}],"heat":3}}"#
    ))
}

fn verdict_json() -> Result<String, String> {
    Ok(r#"{
        "bestPointsA": ["The upside is real", "Waiting has a cost"],
        "bestPointsB": ["Savings only cover three months"],
        "sharedFacts": ["The lease ends in June"],
        "openQuestions": ["What does the job market look like?"],
        "recommendedNextStep": "Visit for a week first; the job market remains uncertain."
    }"#
    .to_string())
}

fn request() -> NewSessionRequest {
    NewSessionRequest {
        user_id: "u1".to_string(),
        decision: "Should I move cities?".to_string(),
        context: "Remote job, lease ends in June".to_string(),
        constraints: String::new(),
        optimizing_for: "long-term happiness".to_string(),
        calibration: Calibration::default(),
    }
}

fn build(script: Vec<Result<String, String>>) -> (DebateEngine, Arc<MemoryStore>, Arc<MockGateway>) {
    let store = Arc::new(MemoryStore::new());
    let gateway = MockGateway::new(script);
    let engine = DebateEngine::new(store.clone(), gateway.clone());
    (engine, store, gateway)
}

async fn stored(store: &MemoryStore, id: &str) -> Session {
    store.get(id).await.unwrap().expect("session should exist")
}

// ============================================================================
// Session Creation
// ============================================================================

#[tokio::test]
async fn test_create_session_with_summary() {
    let (engine, _, gateway) = build(vec![summary_json()]);

    let session = engine.create_session(request()).await.unwrap();

    assert_eq!(session.state, SessionState::Confirm);
    assert_eq!(session.turn_count, 0);
    assert!(session.messages.is_empty());
    assert_eq!(session.summary.as_deref(), Some("A relocation decision."));
    assert_eq!(session.assumptions, vec!["Job is remote"]);
    assert_eq!(session.id.len(), 8);
    assert_eq!(gateway.call_count(), 1);
}

#[tokio::test]
async fn test_create_session_survives_summary_failure() {
    let (engine, _, _) = build(vec![Err("quota exceeded".to_string())]);

    let session = engine.create_session(request()).await.unwrap();

    assert_eq!(session.state, SessionState::Confirm);
    assert_eq!(session.summary.as_deref(), Some("Should I move cities?"));
    assert_eq!(session.assumptions.len(), 1);
    assert!(session.assumptions[0].contains("No AI summary"));
}

#[tokio::test]
async fn test_create_session_survives_summary_parse_failure() {
    let (engine, _, _) = build(vec![Ok("I cannot produce JSON today.".to_string())]);

    let session = engine.create_session(request()).await.unwrap();
    assert_eq!(session.summary.as_deref(), Some("Should I move cities?"));
}

#[tokio::test]
async fn test_create_session_rejects_blank_decision() {
    let (engine, _, gateway) = build(vec![]);

    let mut req = request();
    req.decision = "   ".to_string();

    let err = engine.create_session(req).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(gateway.call_count(), 0, "no gateway call before validation");
}

// ============================================================================
// Turn Flow
// ============================================================================

#[tokio::test]
async fn test_end_to_end_ten_turns() {
    let mut script = vec![summary_json()];
    for i in 0..10 {
        script.push(turn_json(&format!("turn {i}"), 2));
    }
    let (engine, _, _) = build(script);

    let session = engine.create_session(request()).await.unwrap();
    let id = session.id.clone();

    let mut last = None;
    for _ in 0..4 {
        last = Some(engine.take_turn(&id, None).await.unwrap());
    }
    let outcome = last.take().unwrap();
    assert_eq!(outcome.session.messages.len(), 4);
    assert_eq!(outcome.session.turn_count, 4);
    assert!(!outcome.should_end);

    // Alternation invariant: persona_a opens, no speaker repeats.
    let roles: Vec<Role> = outcome.session.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles[0], Role::PersonaA);
    for pair in roles.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }

    for _ in 0..6 {
        last = Some(engine.take_turn(&id, None).await.unwrap());
    }
    let outcome = last.unwrap();
    assert_eq!(outcome.session.turn_count, 10);
    assert!(outcome.should_end);
    assert_eq!(outcome.session.state, SessionState::DebateRunning);
}

#[tokio::test]
async fn test_first_turn_promotes_confirm_to_running() {
    let (engine, store, _) = build(vec![summary_json(), turn_json("opening", 3)]);

    let session = engine.create_session(request()).await.unwrap();
    assert_eq!(session.state, SessionState::Confirm);

    let outcome = engine.take_turn(&session.id, None).await.unwrap();
    assert_eq!(outcome.session.state, SessionState::DebateRunning);
    assert_eq!(stored(&store, &session.id).await.state, SessionState::DebateRunning);
}

#[tokio::test]
async fn test_turn_reports_heat_and_defaults_it() {
    let (engine, _, _) = build(vec![
        summary_json(),
        turn_json("hot take", 5),
        Ok(r#"{"content":"calm take","assumptions":[]}"#.to_string()),
    ]);

    let session = engine.create_session(request()).await.unwrap();

    let outcome = engine.take_turn(&session.id, None).await.unwrap();
    assert_eq!(outcome.heat, 5);

    let outcome = engine.take_turn(&session.id, None).await.unwrap();
    assert_eq!(outcome.heat, 3, "missing heat falls back to 3");
}

#[tokio::test]
async fn test_turn_rejected_after_verdict() {
    let (engine, store, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        verdict_json(),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();
    engine.synthesize(&session.id).await.unwrap();

    let err = engine.take_turn(&session.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::IllegalState { .. }));

    // No mutation happened.
    let s = stored(&store, &session.id).await;
    assert_eq!(s.state, SessionState::VerdictReady);
    assert_eq!(s.messages.len(), 1);
}

#[tokio::test]
async fn test_turn_not_found() {
    let (engine, _, _) = build(vec![]);
    let err = engine.take_turn("missing", None).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn test_turn_failure_leaves_session_unchanged() {
    let (engine, store, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        Err("connection reset".to_string()),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();

    let err = engine.take_turn(&session.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Gateway(_)));

    let s = stored(&store, &session.id).await;
    assert_eq!(s.messages.len(), 1, "no partial persona message appended");
    assert_eq!(s.turn_count, 1);
    assert_eq!(s.state, SessionState::DebateRunning);
}

#[tokio::test]
async fn test_parse_failure_propagates_like_gateway_failure() {
    let (engine, store, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        Ok("total nonsense, no braces".to_string()),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();

    let err = engine.take_turn(&session.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Parse(_)));

    let s = stored(&store, &session.id).await;
    assert_eq!(s.messages.len(), 1);
    assert_eq!(s.turn_count, 1);
}

#[tokio::test]
async fn test_assumptions_accumulate_as_set() {
    let (engine, _, _) = build(vec![
        summary_json(),
        turn_json_with_assumptions("one", &["a", "b"]),
        turn_json_with_assumptions("two", &["b", "c"]),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();
    let outcome = engine.take_turn(&session.id, None).await.unwrap();

    assert_eq!(
        outcome.session.assumptions,
        vec!["Job is remote", "a", "b", "c"]
    );
}

// ============================================================================
// Interventions
// ============================================================================

#[tokio::test]
async fn test_pushback_appends_user_message_then_reply() {
    let (engine, _, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        turn_json("addressed", 4),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();

    let outcome = engine
        .take_turn(
            &session.id,
            Some(Intervention::Pushback("what about money?".to_string())),
        )
        .await
        .unwrap();

    let messages = &outcome.session.messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "[PUSHBACK]: what about money?");
    assert_eq!(messages[2].role, Role::PersonaB);
    // The user message does not count as a turn; the reply does.
    assert_eq!(outcome.session.turn_count, 2);
}

#[tokio::test]
async fn test_reframe_replaces_decision_and_appends() {
    let (engine, _, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        turn_json("reframed reply", 3),
    ]);

    let mut req = request();
    req.decision = "A".to_string();
    let session = engine.create_session(req).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();

    let outcome = engine
        .take_turn(&session.id, Some(Intervention::Reframe("B".to_string())))
        .await
        .unwrap();

    assert_eq!(outcome.session.decision, "B");
    let messages = &outcome.session.messages;
    assert_eq!(messages[1].role, Role::User);
    assert!(messages[1].content.contains("B"));
    assert!(messages[2].role.is_persona());
}

#[tokio::test]
async fn test_clarify_appends_no_user_message() {
    let (engine, _, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        turn_json("clarified", 3),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();

    let outcome = engine
        .take_turn(&session.id, Some(Intervention::Clarify))
        .await
        .unwrap();

    assert_eq!(outcome.session.messages.len(), 2);
    assert!(outcome.session.messages.iter().all(|m| m.role.is_persona()));
}

#[tokio::test]
async fn test_undo_removes_trailing_message_without_gateway_call() {
    let (engine, store, gateway) = build(vec![
        summary_json(),
        turn_json("one", 3),
        turn_json("two", 3),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();
    let calls_before = gateway.call_count();

    let outcome = engine
        .take_turn(&session.id, Some(Intervention::Undo))
        .await
        .unwrap();

    assert_eq!(gateway.call_count(), calls_before, "undo never calls the gateway");
    assert_eq!(outcome.session.messages.len(), 1);
    assert_eq!(outcome.session.turn_count, 1);
    assert_eq!(stored(&store, &session.id).await.messages.len(), 1);
}

#[tokio::test]
async fn test_undo_on_empty_transcript_is_noop() {
    let (engine, _, _) = build(vec![summary_json()]);

    let session = engine.create_session(request()).await.unwrap();
    let outcome = engine
        .take_turn(&session.id, Some(Intervention::Undo))
        .await
        .unwrap();

    assert!(outcome.session.messages.is_empty());
    assert_eq!(outcome.session.turn_count, 0);
}

// ============================================================================
// Synthesis
// ============================================================================

#[tokio::test]
async fn test_synthesize_attaches_verdict() {
    let (engine, store, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        verdict_json(),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();

    let session = engine.synthesize(&session.id).await.unwrap();
    assert_eq!(session.state, SessionState::VerdictReady);
    let verdict = session.verdict.as_ref().unwrap();
    assert_eq!(verdict.best_points_a.len(), 2);
    assert!(verdict.recommended_next_step.contains("uncertain"));

    let s = stored(&store, &session.id).await;
    assert_eq!(s.state, SessionState::VerdictReady);
}

#[tokio::test]
async fn test_synthesize_is_idempotent() {
    let (engine, _, gateway) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        verdict_json(),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();

    let first = engine.synthesize(&session.id).await.unwrap();
    let calls_after_first = gateway.call_count();
    let second = engine.synthesize(&session.id).await.unwrap();

    assert_eq!(gateway.call_count(), calls_after_first, "no second gateway call");
    assert_eq!(first.verdict, second.verdict);
}

#[tokio::test]
async fn test_synthesis_failure_rolls_back_to_running() {
    let (engine, store, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        Err("model overloaded".to_string()),
        verdict_json(),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();

    let err = engine.synthesize(&session.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Gateway(_)));

    let s = stored(&store, &session.id).await;
    assert_eq!(s.state, SessionState::DebateRunning, "rolled back, not stuck");
    assert!(s.verdict.is_none());

    // Retrying succeeds against the rolled-back session.
    let session = engine.synthesize(&session.id).await.unwrap();
    assert_eq!(session.state, SessionState::VerdictReady);
}

#[tokio::test]
async fn test_synthesis_parse_failure_also_rolls_back() {
    let (engine, store, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        Ok("no json in sight".to_string()),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();

    let err = engine.synthesize(&session.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Parse(_)));
    assert_eq!(
        stored(&store, &session.id).await.state,
        SessionState::DebateRunning
    );
}

#[tokio::test]
async fn test_synthesize_not_found() {
    let (engine, _, _) = build(vec![]);
    let err = engine.synthesize("missing").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

// ============================================================================
// User Curation
// ============================================================================

#[tokio::test]
async fn test_record_decision_once_only() {
    let (engine, _, _) = build(vec![
        summary_json(),
        turn_json("opening", 3),
        verdict_json(),
    ]);

    let session = engine.create_session(request()).await.unwrap();
    engine.take_turn(&session.id, None).await.unwrap();
    engine.synthesize(&session.id).await.unwrap();

    let session = engine
        .record_decision(&session.id, "Move".to_string(), Some("The upside won".to_string()))
        .await
        .unwrap();
    let verdict = session.verdict.as_ref().unwrap();
    assert_eq!(verdict.user_decision.as_deref(), Some("Move"));

    let err = engine
        .record_decision(&session.id, "Stay".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::IllegalState { .. }));
}

#[tokio::test]
async fn test_record_decision_requires_verdict() {
    let (engine, _, _) = build(vec![summary_json()]);

    let session = engine.create_session(request()).await.unwrap();
    let err = engine
        .record_decision(&session.id, "Move".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::IllegalState { .. }));
}

#[tokio::test]
async fn test_pin_flows_into_synthesis_prompt_source() {
    let (engine, _, _) = build(vec![summary_json(), turn_json("key point", 3)]);

    let session = engine.create_session(request()).await.unwrap();
    let outcome = engine.take_turn(&session.id, None).await.unwrap();
    let message_id = outcome.session.messages[0].id.clone();

    let session = engine.set_pinned(&session.id, &message_id, true).await.unwrap();
    assert!(session.messages[0].pinned);
    assert_eq!(session.pinned_lines(), vec!["[persona_a]: key point"]);
}
