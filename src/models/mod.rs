pub mod session;
pub mod verdict;

pub use session::{
    Calibration, DebateMessage, Intervention, Role, Session, SessionState, short_id,
};
pub use verdict::Verdict;
