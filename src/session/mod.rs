//! Capture-control context: drives the state machine and performs the
//! side effects of every state.

pub mod handshake;
mod orchestrator;
#[cfg(test)]
mod tests;

pub use handshake::SessionError;
pub use orchestrator::{Orchestrator, SessionSettings};
