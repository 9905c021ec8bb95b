pub mod engine;

pub use engine::{DebateEngine, MAX_TURNS, NewSessionRequest, TurnOutcome};
