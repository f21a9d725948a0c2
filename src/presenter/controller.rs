use super::screen::Screen;
use crate::communicator::{Communicator, Message, Role};
use crate::error::{ChannelError, Result};
use crate::machine::{Event, State, TeardownTarget};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Requests coming from the touch screen or keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    /// Touch trigger on the idle screen
    Trigger,
    Start,
    Exit,
    Retry,
    Abort,
    Welcome,
    Cancel,
    /// Leave the booth from any state
    Quit,
    /// Restart the booth from any state
    Restart,
}

/// How long each automatic stage is shown
#[derive(Debug, Clone)]
pub struct PresenterTimings {
    pub greeter: Duration,
    /// Number of countdown ticks before a shot
    pub countdown: u32,
    pub tick: Duration,
    pub display: Duration,
    pub postprocess: Duration,
}

impl Default for PresenterTimings {
    fn default() -> Self {
        Self {
            greeter: Duration::from_secs(4),
            countdown: 8,
            tick: Duration::from_secs(1),
            display: Duration::from_secs(5),
            postprocess: Duration::from_secs(10),
        }
    }
}

enum Timer {
    Ack { deadline: Instant },
    Countdown { remaining: u32, deadline: Instant },
}

impl Timer {
    fn deadline(&self) -> Instant {
        match self {
            Timer::Ack { deadline } | Timer::Countdown { deadline, .. } => *deadline,
        }
    }
}

enum Wake {
    Message(std::result::Result<Message, ChannelError>),
    Input(Option<UserInput>),
    Timer,
}

/// Presentation context: shows every broadcast state and answers the
/// orchestrator's handshakes from timers and user input
pub struct Presenter {
    comm: Communicator,
    screen: Box<dyn Screen>,
    input: mpsc::UnboundedReceiver<UserInput>,
    input_open: bool,
    timings: PresenterTimings,
    state: Option<State>,
    timer: Option<Timer>,
    answered: bool,
}

impl Presenter {
    pub fn new(
        comm: Communicator,
        screen: Box<dyn Screen>,
        input: mpsc::UnboundedReceiver<UserInput>,
        timings: PresenterTimings,
    ) -> Self {
        Self {
            comm,
            screen,
            input,
            input_open: true,
            timings,
            state: None,
            timer: None,
            answered: false,
        }
    }

    /// Run until the presenter channel is closed
    pub async fn run(mut self) -> Result<()> {
        info!("Presenter started");

        loop {
            let armed = self.timer.is_some();
            let deadline = self
                .timer
                .as_ref()
                .map(Timer::deadline)
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            let wake = tokio::select! {
                message = self.comm.receive(Role::Presenter) => Wake::Message(message),
                input = self.input.recv(), if self.input_open => Wake::Input(input),
                _ = sleep_until(deadline), if armed => Wake::Timer,
            };

            match wake {
                Wake::Message(Ok(message)) => self.handle_message(message),
                Wake::Message(Err(ChannelError::ChannelClosed(_))) => {
                    info!("Presenter channel closed");
                    return Ok(());
                }
                Wake::Message(Err(e)) => {
                    error!("Presenter cannot receive: {}", e);
                    return Err(e.into());
                }
                Wake::Input(Some(input)) => self.handle_input(input),
                Wake::Input(None) => {
                    debug!("User input closed");
                    self.input_open = false;
                }
                Wake::Timer => self.fire_timer(),
            }
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::State(state) => self.enter(state),
            Message::Preview(frame) => self.screen.show_preview(&frame),
            Message::Event(event) if event.is_camera("ready") => {
                self.screen.show_notice("Camera ready")
            }
            Message::Event(event) => debug!("Presenter ignoring {}", event),
            Message::Task(_) => warn!("Presenter received a finishing task"),
        }
    }

    fn enter(&mut self, state: State) {
        self.timer = None;
        self.answered = false;
        self.screen.show_state(&state);

        let now = Instant::now();
        self.timer = match &state {
            State::Greeter => Some(Timer::Ack {
                deadline: now + self.timings.greeter,
            }),
            State::Countdown(_) => {
                self.screen.show_countdown(self.timings.countdown);
                Some(Timer::Countdown {
                    remaining: self.timings.countdown,
                    deadline: now + self.timings.tick,
                })
            }
            State::Review(_) => Some(Timer::Ack {
                deadline: now + self.timings.display,
            }),
            State::Postprocess => Some(Timer::Ack {
                deadline: now + self.timings.postprocess,
            }),
            _ => None,
        };
        self.state = Some(state);
    }

    fn fire_timer(&mut self) {
        match self.timer.take() {
            Some(Timer::Ack { .. }) => self.answer("ack"),
            Some(Timer::Countdown { remaining, .. }) => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.answer("capture");
                } else {
                    self.screen.show_countdown(remaining);
                    self.timer = Some(Timer::Countdown {
                        remaining,
                        deadline: Instant::now() + self.timings.tick,
                    });
                }
            }
            None => {}
        }
    }

    fn handle_input(&mut self, input: UserInput) {
        let event = match input {
            UserInput::Quit => Some(Event::teardown(TeardownTarget::Exit)),
            UserInput::Restart => Some(Event::teardown(TeardownTarget::Restart)),
            _ => None,
        };
        if let Some(event) = event {
            self.timer = None;
            self.answered = true;
            self.send(event);
            return;
        }

        let name = match (&self.state, input) {
            (Some(State::Idle), UserInput::Trigger) => "trigger",
            (Some(State::Welcome), UserInput::Start) => "start",
            (Some(State::Welcome), UserInput::Exit) => "exit",
            (Some(State::Error(_)), UserInput::Retry) => "retry",
            (Some(State::Error(_)), UserInput::Abort) => "abort",
            (Some(State::Teardown(TeardownTarget::Welcome)), UserInput::Welcome) => "welcome",
            (
                Some(
                    State::Greeter | State::Countdown(_) | State::Review(_) | State::Postprocess,
                ),
                UserInput::Cancel,
            ) => "cancel",
            (state, input) => {
                debug!(
                    "Ignoring {:?} in {}",
                    input,
                    state.as_ref().map(State::name).unwrap_or("no state")
                );
                return;
            }
        };
        self.answer(name);
    }

    /// Send the single answer allowed for the current state
    fn answer(&mut self, name: &str) {
        if self.answered {
            debug!(
                "Already answered {}, dropping {}",
                self.state.as_ref().map(State::name).unwrap_or("no state"),
                name
            );
            return;
        }
        self.timer = None;
        self.answered = true;
        match Event::gui(name) {
            Ok(event) => self.send(event),
            Err(e) => error!("Invalid presenter event '{}': {}", name, e),
        }
    }

    fn send(&self, event: Event) {
        debug!("Presenter sending {}", event);
        if let Err(e) = self.comm.send_event(Role::Master, event) {
            warn!("Presenter could not reach the orchestrator: {}", e);
        }
    }
}
