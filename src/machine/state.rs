use super::event::{Label, TeardownTarget};
use crate::error::ValidationError;
use crate::picture::Picture;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a shot inside a session, always within `1..=total`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawShot")]
pub struct Shot {
    index: u32,
    total: u32,
}

#[derive(Deserialize)]
struct RawShot {
    index: u32,
    total: u32,
}

impl TryFrom<RawShot> for Shot {
    type Error = ValidationError;

    fn try_from(raw: RawShot) -> Result<Self, Self::Error> {
        Shot::new(raw.index, raw.total)
    }
}

impl Shot {
    pub fn new(index: u32, total: u32) -> Result<Self, ValidationError> {
        if total == 0 {
            return Err(ValidationError::NoShots);
        }
        if index == 0 || index > total {
            return Err(ValidationError::ShotOutOfRange { index, total });
        }
        Ok(Self { index, total })
    }

    /// First shot of a session with `total` shots
    pub fn first(total: u32) -> Result<Self, ValidationError> {
        Self::new(1, total)
    }

    /// Following shot, or `None` after the last one
    pub fn next(&self) -> Option<Shot> {
        if self.is_last() {
            None
        } else {
            Some(Shot {
                index: self.index + 1,
                total: self.total,
            })
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.index == self.total
    }
}

impl fmt::Display for Shot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.total)
    }
}

/// Payload of the `Error` state: what failed and where to resume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorState {
    origin: Label,
    message: Label,
    previous: Box<State>,
    session_running: bool,
}

impl ErrorState {
    pub fn new(origin: Label, message: Label, previous: State, session_running: bool) -> Self {
        Self {
            origin,
            message,
            previous: Box::new(previous),
            session_running,
        }
    }

    pub fn origin(&self) -> &Label {
        &self.origin
    }

    pub fn message(&self) -> &Label {
        &self.message
    }

    pub fn previous(&self) -> &State {
        &self.previous
    }

    pub fn session_running(&self) -> bool {
        self.session_running
    }
}

/// Lifecycle of a photo session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum State {
    Welcome,
    Startup,
    Idle,
    Greeter,
    Countdown(Shot),
    Capture(Shot),
    Assemble,
    Review(Picture),
    Postprocess,
    Error(ErrorState),
    Teardown(TeardownTarget),
}

impl State {
    /// Get the state name as a string for logging and display
    pub fn name(&self) -> &'static str {
        match self {
            State::Welcome => "welcome",
            State::Startup => "startup",
            State::Idle => "idle",
            State::Greeter => "greeter",
            State::Countdown(_) => "countdown",
            State::Capture(_) => "capture",
            State::Assemble => "assemble",
            State::Review(_) => "review",
            State::Postprocess => "postprocess",
            State::Error(_) => "error",
            State::Teardown(_) => "teardown",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Welcome => f.write_str("Welcome"),
            State::Startup => f.write_str("Startup"),
            State::Idle => f.write_str("Idle"),
            State::Greeter => f.write_str("Greeter"),
            State::Countdown(shot) => write!(f, "Countdown({})", shot),
            State::Capture(shot) => write!(f, "Capture({})", shot),
            State::Assemble => f.write_str("Assemble"),
            State::Review(picture) => write!(f, "Review({})", picture),
            State::Postprocess => f.write_str("Postprocess"),
            State::Error(error) => write!(
                f,
                "Error({}: {}, previous={}, running={})",
                error.origin, error.message, error.previous, error.session_running
            ),
            State::Teardown(target) => write!(f, "Teardown({})", target),
        }
    }
}
