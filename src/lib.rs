pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod orchestrator;
pub mod parse;
pub mod prompts;
pub mod store;

// Re-export main types
pub use config::{CliConfig, GatewayConfig, StoreConfig};
pub use error::EngineError;
pub use gateway::{CompletionGateway, GeminiGateway, OpenAiGateway, build_gateway};
pub use models::{
    Calibration, DebateMessage, Intervention, Role, Session, SessionState, Verdict,
};
pub use orchestrator::{DebateEngine, MAX_TURNS, NewSessionRequest, TurnOutcome};
pub use store::{JsonFileStore, MemoryStore, SessionStore};
