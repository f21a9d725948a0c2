use super::event::{Event, TeardownTarget};
use super::state::{ErrorState, Shot, State};
use crate::communicator::{Communicator, Role};
use crate::error::{ProtocolError, ValidationError};
use tracing::{debug, info};

/// Result of applying one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// The run should end with the given process exit code
    ExitRequested(i32),
}

/// New state produced by [`transition`]
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: State,
    pub session_running: bool,
    pub outcome: Outcome,
}

impl Transition {
    fn to(state: State, session_running: bool) -> Self {
        Self {
            state,
            session_running,
            outcome: Outcome::Continue,
        }
    }
}

/// Pure transition rule over `(state, event)`.
///
/// Error events win over everything, teardown events over the per-state
/// table. `first_shot` is where a new capture sequence begins.
pub fn transition(
    current: &State,
    session_running: bool,
    first_shot: Shot,
    event: &Event,
) -> Result<Transition, ProtocolError> {
    if let Event::Error(error) = event {
        let state = State::Error(ErrorState::new(
            error.origin().clone(),
            error.message().clone(),
            current.clone(),
            session_running,
        ));
        return Ok(Transition::to(state, session_running));
    }

    if let Event::Teardown(target) = event {
        let outcome = match target.exit_code() {
            Some(code) => Outcome::ExitRequested(code),
            None => Outcome::Continue,
        };
        return Ok(Transition {
            state: State::Teardown(*target),
            session_running: false,
            outcome,
        });
    }

    let unexpected = || ProtocolError::UnexpectedEvent {
        state: current.to_string(),
        event: event.to_string(),
    };

    let next = match current {
        State::Welcome if event.is_gui("start") => Transition::to(State::Startup, session_running),
        State::Welcome if event.is_gui("exit") => Transition {
            state: State::Teardown(TeardownTarget::Exit),
            session_running: false,
            outcome: Outcome::ExitRequested(super::event::EXIT_CODE_CLEAN),
        },
        State::Startup if event.is_camera("ready") => Transition::to(State::Idle, true),
        State::Idle if event.is_input("trigger") => Transition::to(State::Greeter, session_running),
        State::Greeter if event.is_input("ack") => {
            Transition::to(State::Countdown(first_shot), session_running)
        }
        State::Countdown(shot) if event.is_gui("capture") => {
            Transition::to(State::Capture(*shot), session_running)
        }
        State::Capture(shot) if event.is_camera("countdown") => {
            let next = shot.next().ok_or_else(unexpected)?;
            Transition::to(State::Countdown(next), session_running)
        }
        State::Capture(shot) if event.is_camera("assemble") && shot.is_last() => {
            Transition::to(State::Assemble, session_running)
        }
        State::Assemble => match event {
            Event::Camera(camera) => match camera.picture() {
                Some(picture) => Transition::to(State::Review(picture.clone()), session_running),
                None => return Err(unexpected()),
            },
            _ => return Err(unexpected()),
        },
        State::Review(_) if event.is_input("ack") => {
            Transition::to(State::Postprocess, session_running)
        }
        State::Postprocess if event.is_input("ack") => Transition::to(State::Idle, session_running),
        State::Error(error) if event.is_gui("retry") => {
            Transition::to(error.previous().clone(), error.session_running())
        }
        State::Error(error) if event.is_gui("abort") => {
            if error.session_running() {
                Transition::to(State::Idle, true)
            } else {
                Transition::to(State::Teardown(TeardownTarget::Welcome), false)
            }
        }
        State::Teardown(TeardownTarget::Welcome) if event.is_gui("welcome") => {
            Transition::to(State::Welcome, false)
        }
        _ => return Err(unexpected()),
    };

    Ok(next)
}

/// Owner of the single current state.
///
/// Applies events through [`transition`] and broadcasts every new state to
/// the other roles. It never drives hardware itself.
pub struct Context {
    state: State,
    session_running: bool,
    first_shot: Shot,
    comm: Communicator,
}

impl Context {
    /// Create a new context and broadcast the initial state
    pub fn new(
        initial: State,
        total_shots: u32,
        comm: Communicator,
    ) -> Result<Self, ValidationError> {
        if !matches!(initial, State::Welcome | State::Startup) {
            return Err(ValidationError::InitialState {
                state: initial.to_string(),
            });
        }
        let first_shot = Shot::first(total_shots)?;

        info!(
            "State machine starting in {} with {} shots per session",
            initial, total_shots
        );
        comm.broadcast(Role::Master, &initial);

        Ok(Self {
            state: initial,
            session_running: false,
            first_shot,
            comm,
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn session_running(&self) -> bool {
        self.session_running
    }

    pub fn total_shots(&self) -> u32 {
        self.first_shot.total()
    }

    pub fn communicator(&self) -> &Communicator {
        &self.comm
    }

    /// Apply an event, replace the current state and broadcast it
    pub fn handle_event(&mut self, event: Event) -> Result<Outcome, ProtocolError> {
        let next = transition(&self.state, self.session_running, self.first_shot, &event)?;
        debug!("{} + {} -> {}", self.state, event, next.state);

        self.state = next.state;
        self.session_running = next.session_running;
        self.comm.broadcast(Role::Master, &self.state);

        Ok(next.outcome)
    }
}
