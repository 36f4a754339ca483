//! `flatframe-generation`: remote video generation.
//!
//! Submits a snapshot with the flat-vector style prompt, polls the job
//! until it is done, and downloads the resulting video.

pub mod client;
pub mod poll;
pub mod prompt;
pub mod wire;

pub use client::GenerationClient;
pub use poll::{poll_until, PollError, PollPolicy};
pub use prompt::STYLE_PROMPT;
pub use wire::Operation;
