use crate::error::{BoothError, ChannelError, ProtocolError, ValidationError};
use crate::machine::{Event, State, TeardownTarget};

pub const WELCOME: &[&str] = &["start", "exit", Event::TEARDOWN];
pub const IDLE: &[&str] = &["trigger", Event::TEARDOWN];
pub const ACK: &[&str] = &["ack", CANCEL, Event::TEARDOWN];
pub const COUNTDOWN: &[&str] = &["capture", CANCEL, Event::TEARDOWN];
pub const ERROR: &[&str] = &["retry", "abort", Event::TEARDOWN];
pub const TEARDOWN_WELCOME: &[&str] = &["welcome", Event::TEARDOWN];

const CANCEL: &str = "cancel";

/// Names the orchestrator waits for while in `state`; empty for states
/// that advance on their own
pub fn expected_for(state: &State) -> &'static [&'static str] {
    match state {
        State::Welcome => WELCOME,
        State::Idle => IDLE,
        State::Greeter | State::Review(_) | State::Postprocess => ACK,
        State::Countdown(_) => COUNTDOWN,
        State::Error(_) => ERROR,
        State::Teardown(TeardownTarget::Welcome) => TEARDOWN_WELCOME,
        State::Startup
        | State::Capture(_)
        | State::Assemble
        | State::Teardown(TeardownTarget::Exit | TeardownTarget::Restart) => &[],
    }
}

/// Event to feed into the state machine after a handshake.
///
/// Error and teardown events are always accepted, `cancel` becomes a
/// restart teardown.
pub fn accept(state: &State, event: Event, expected: &[&str]) -> Result<Event, ProtocolError> {
    if matches!(event, Event::Error(_) | Event::Teardown(_)) {
        return Ok(event);
    }

    let name = event.name();
    if name == CANCEL && expected.iter().any(|e| *e == CANCEL) {
        return Ok(Event::teardown(TeardownTarget::Restart));
    }
    if expected.iter().any(|e| *e == name) {
        return Ok(event);
    }

    Err(ProtocolError::UnknownEvent {
        state: state.to_string(),
        event: event.to_string(),
        expected: expected.iter().map(|name| name.to_string()).collect(),
    })
}

/// Why an orchestration step stopped early
#[derive(Debug)]
pub enum SessionError {
    /// Unwind to the run loop and perform the teardown
    Teardown(TeardownTarget),
    /// Unrecoverable; ends the capture-control context
    Fatal(BoothError),
}

impl From<BoothError> for SessionError {
    fn from(error: BoothError) -> Self {
        SessionError::Fatal(error)
    }
}

impl From<ProtocolError> for SessionError {
    fn from(error: ProtocolError) -> Self {
        SessionError::Fatal(error.into())
    }
}

impl From<ChannelError> for SessionError {
    fn from(error: ChannelError) -> Self {
        SessionError::Fatal(error.into())
    }
}

impl From<ValidationError> for SessionError {
    fn from(error: ValidationError) -> Self {
        SessionError::Fatal(error.into())
    }
}
