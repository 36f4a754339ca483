//! `flatframe-studio`: the application state machine and the orchestrator
//! that drives extraction and generation in the background.

pub mod session;
pub mod studio;

pub use session::{GenerationOutcome, GenerationTicket, Session};
pub use studio::Studio;
