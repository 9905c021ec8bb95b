//! Prompt rendering for the debate flows.
//!
//! All builders are pure functions over session data; the orchestrator
//! decides which one to render and when.

use crate::models::{Calibration, Intervention, Role, Session};

fn optional_line(label: &str, value: &str) -> String {
    if value.trim().is_empty() {
        String::new()
    } else {
        format!("{label}: \"{value}\"\n")
    }
}

/// Moderator system prompt: decision framing, calibration and the behavioral
/// rules every persona turn must follow.
pub fn moderator_system_prompt(session: &Session) -> String {
    let cal = &session.calibration;
    format!(
        r#"You are the Director/Moderator of a structured internal debate. The user is facing a decision and you are orchestrating two personas that represent different aspects of their thinking.

DECISION: "{decision}"
{context}{constraints}{optimizing}
CALIBRATION (0-100):
- Risk tolerance: {risk}
- Time horizon: {horizon} (0=short-term, 100=long-term)
- Social/relationship impact sensitivity: {social}
- Money sensitivity: {money}

RULES:
1. Each persona speaks in first person ("I think...", "I would...")
2. Each turn must be <=120 words
3. Personas must ONLY use facts provided by the user - no hallucinated data
4. Each persona must label assumptions explicitly as "Assumption: ..."
5. Each persona may ask at most 1 question per turn
6. NEVER provide medical, legal, or financial advice. Add disclaimer if topics approach these areas
7. Keep the debate productive, not repetitive
8. After 6-10 turns, signal that synthesis is appropriate

Respond ONLY with the JSON format requested."#,
        decision = session.decision,
        context = optional_line("CONTEXT", &session.context),
        constraints = optional_line("CONSTRAINTS", &session.constraints),
        optimizing = optional_line("OPTIMIZING FOR", &session.optimizing_for),
        risk = cal.risk_tolerance,
        horizon = cal.time_horizon,
        social = cal.social_impact,
        money = cal.money_sensitivity,
    )
}

/// Style prompt for the Risk-Taker persona.
fn persona_a_prompt(calibration: &Calibration) -> String {
    let intensity = if calibration.risk_tolerance > 60 {
        "strongly"
    } else {
        "moderately"
    };
    format!(
        r#"You are Persona A - the Risk-Taker version of the user. You speak in first person ("I").

Your style:
- You {intensity} push for action, upside, speed, and boldness
- You challenge fear-based thinking and over-analysis
- You highlight opportunity cost of inaction
- You are optimistic but not delusional
- You label any assumptions explicitly as "Assumption: ..."
- You may ask at most 1 question per turn
- Keep responses under 120 words
- Never give medical, legal, or professional financial advice"#
    )
}

/// Style prompt for the Pragmatist persona.
fn persona_b_prompt(calibration: &Calibration) -> String {
    let intensity = if calibration.money_sensitivity > 60 {
        "strongly"
    } else {
        "moderately"
    };
    format!(
        r#"You are Persona B - the Pragmatist version of the user. You speak in first person ("I").

Your style:
- You {intensity} push for caution, downside protection, planning, and realism
- You challenge impulsive thinking and blind optimism
- You highlight risks and what could go wrong
- You value preparation and reversibility
- You label any assumptions explicitly as "Assumption: ..."
- You may ask at most 1 question per turn
- Keep responses under 120 words
- Never give medical, legal, or professional financial advice"#
    )
}

/// Context sentence injected when the user intervened before this turn.
fn intervention_context(intervention: Option<&Intervention>) -> String {
    match intervention {
        Some(Intervention::Pushback(message)) => format!(
            "\n\nThe user just pushed back with: \"{message}\"\nYou must directly address this challenge."
        ),
        Some(Intervention::Clarify) => "\n\nThe user asked for clarification. State your key assumptions clearly and ask one question."
            .to_string(),
        Some(Intervention::Reframe(message)) => format!(
            "\n\nThe user has reframed the decision as: \"{message}\"\nAdjust your argument accordingly."
        ),
        _ => String::new(),
    }
}

/// Per-turn prompt: persona style, decision framing, intervention context,
/// and the full role-tagged transcript so far.
pub fn turn_prompt(
    session: &Session,
    next_speaker: Role,
    intervention: Option<&Intervention>,
) -> String {
    let (persona_name, persona_prompt) = match next_speaker {
        Role::PersonaA => ("Risk-Taker (A)", persona_a_prompt(&session.calibration)),
        _ => ("Pragmatist (B)", persona_b_prompt(&session.calibration)),
    };

    let history = session.transcript_lines().join("\n");
    let history = if history.is_empty() {
        "(Opening statement)".to_string()
    } else {
        history
    };

    format!(
        r#"{persona_prompt}

DECISION: "{decision}"
{context}{constraints}{optimizing}{action}

DEBATE SO FAR:
{history}

Now respond as the {persona_name}. Output ONLY a JSON object:
{{
  "content": "your response text (max 120 words, first person)",
  "assumptions": ["any assumptions you're making"],
  "heat": <number 1-5 indicating argument intensity>
}}"#,
        decision = session.decision,
        context = optional_line("CONTEXT", &session.context),
        constraints = optional_line("CONSTRAINTS", &session.constraints),
        optimizing = optional_line("OPTIMIZING FOR", &session.optimizing_for),
        action = intervention_context(intervention),
    )
}

/// Synthesis prompt: full transcript plus user-pinned excerpts, asking for
/// the verdict shape.
pub fn synthesis_prompt(session: &Session) -> String {
    let history = session.transcript_lines().join("\n");
    let pinned = session.pinned_lines();
    let pinned = if pinned.is_empty() {
        String::new()
    } else {
        format!("\nUSER-PINNED BEST POINTS:\n{}", pinned.join("\n"))
    };

    format!(
        r#"You are analyzing a completed debate about the decision: "{decision}"

DEBATE TRANSCRIPT:
{history}
{pinned}

Generate a verdict summary. Output ONLY a JSON object:
{{
  "bestPointsA": ["top 2-3 points from the Risk-Taker"],
  "bestPointsB": ["top 2-3 points from the Pragmatist"],
  "sharedFacts": ["facts both sides agree on"],
  "openQuestions": ["unresolved questions worth investigating"],
  "recommendedNextStep": "a specific, actionable next step with explicit uncertainty acknowledgment"
}}

RULES:
- Be concise and specific
- Do NOT give medical, legal, or financial advice
- Acknowledge uncertainty in the recommendation
- Base everything on what was actually discussed"#,
        decision = session.decision,
    )
}

/// Moderator-less summarization prompt used once at session creation.
pub fn summary_prompt(decision: &str, context: &str) -> String {
    format!(
        r#"Summarize the user's decision situation in 1-2 sentences. Be concise and neutral.

Decision: "{decision}"
{context}
Output ONLY a JSON object:
{{
  "summary": "your summary",
  "assumptions": ["2-4 key assumptions being made"]
}}"#,
        context = optional_line("Context", context),
    )
}
