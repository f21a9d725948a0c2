use super::lamp::Lamp;
use crate::communicator::{Communicator, Message, Role};
use crate::error::{ChannelError, HardwareError, Result, ValidationError};
use crate::machine::{Event, State, TeardownTarget};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Physical push buttons of the booth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Trigger,
    Exit,
}

enum Wake {
    Message(std::result::Result<Message, ChannelError>),
    Button(Option<Button>),
}

/// Hardware-input context: owns the lamp and the buttons and turns presses
/// into events for the orchestrator.
///
/// The trigger is armed (and the lamp lit) only while the booth is idle.
pub struct HardwareInput {
    comm: Communicator,
    lamp: Box<dyn Lamp>,
    buttons: mpsc::UnboundedReceiver<Button>,
    buttons_open: bool,
    armed: bool,
}

impl HardwareInput {
    pub fn new(
        comm: Communicator,
        lamp: Box<dyn Lamp>,
        buttons: mpsc::UnboundedReceiver<Button>,
    ) -> Self {
        Self {
            comm,
            lamp,
            buttons,
            buttons_open: true,
            armed: false,
        }
    }

    /// Run until the hardware channel is closed
    pub async fn run(mut self) -> Result<()> {
        info!("Hardware input started (lamp on pin {})", self.lamp.pin());

        loop {
            let wake = tokio::select! {
                message = self.comm.receive(Role::Gpio) => Wake::Message(message),
                button = self.buttons.recv(), if self.buttons_open => Wake::Button(button),
            };

            match wake {
                Wake::Message(Ok(Message::State(state))) => self.handle_state(&state),
                Wake::Message(Ok(other)) => debug!("Hardware input ignoring {}", other.kind()),
                Wake::Message(Err(ChannelError::ChannelClosed(_))) => break,
                Wake::Message(Err(e)) => {
                    error!("Hardware input cannot receive: {}", e);
                    return Err(e.into());
                }
                Wake::Button(Some(button)) => self.handle_button(button),
                Wake::Button(None) => {
                    debug!("Button input closed");
                    self.buttons_open = false;
                }
            }
        }

        if let Err(e) = self.lamp.set(false) {
            warn!("Could not switch lamp off: {}", e);
        }
        info!("Hardware input stopped");
        Ok(())
    }

    fn handle_state(&mut self, state: &State) {
        match state {
            State::Idle => self.arm(),
            _ if self.armed => self.disarm(),
            _ => {}
        }
    }

    fn handle_button(&mut self, button: Button) {
        match button {
            Button::Trigger if self.armed => {
                info!("Trigger pressed");
                self.disarm();
                self.send(Event::gpio("trigger"));
            }
            Button::Trigger => debug!("Trigger pressed while disarmed"),
            Button::Exit => {
                info!("Exit button pressed");
                self.send(Ok(Event::teardown(TeardownTarget::Welcome)));
            }
        }
    }

    fn arm(&mut self) {
        self.armed = true;
        self.set_lamp(true);
    }

    fn disarm(&mut self) {
        self.armed = false;
        self.set_lamp(false);
    }

    fn set_lamp(&mut self, lit: bool) {
        if let Err(e) = self.lamp.set(lit) {
            self.report(e);
        }
    }

    fn report(&self, e: HardwareError) {
        error!("Hardware error: {}", e);
        self.send(Event::error("Gpio", e.to_string()));
    }

    fn send(&self, event: std::result::Result<Event, ValidationError>) {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                error!("Invalid hardware event: {}", e);
                return;
            }
        };
        if let Err(e) = self.comm.send_event(Role::Master, event) {
            warn!("Hardware input could not reach the orchestrator: {}", e);
        }
    }
}
