use super::input::Button;
use crate::error::Result;
use crate::presenter::UserInput;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a key press stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Button(Button),
    Input(UserInput),
}

/// Keyboard layout of the booth when run from a terminal
pub fn map_key(code: KeyCode) -> Option<KeyAction> {
    let action = match code {
        KeyCode::Char(' ') => KeyAction::Button(Button::Trigger),
        KeyCode::Char('e') => KeyAction::Button(Button::Exit),
        KeyCode::Char('s') => KeyAction::Input(UserInput::Start),
        KeyCode::Char('r') => KeyAction::Input(UserInput::Retry),
        KeyCode::Char('a') => KeyAction::Input(UserInput::Abort),
        KeyCode::Char('w') => KeyAction::Input(UserInput::Welcome),
        KeyCode::Char('c') => KeyAction::Input(UserInput::Cancel),
        KeyCode::Char('x') => KeyAction::Input(UserInput::Restart),
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Input(UserInput::Quit),
        _ => return None,
    };
    Some(action)
}

/// Keyboard stand-in for the buttons and the touch screen
pub struct KeyboardInputHandler {
    input: mpsc::UnboundedSender<UserInput>,
    buttons: Option<mpsc::UnboundedSender<Button>>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    /// Create a new keyboard input handler.
    ///
    /// Without a button channel the space bar acts as a touch trigger.
    pub fn new(
        input: mpsc::UnboundedSender<UserInput>,
        buttons: Option<mpsc::UnboundedSender<Button>>,
    ) -> Self {
        Self {
            input,
            buttons,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Starting keyboard input handler - press SPACE to trigger, 'q' to quit");

        let input = self.input.clone();
        let buttons = self.buttons.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            while !cancellation_token.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let key_event = match event::read() {
                            Ok(Event::Key(key_event)) if key_event.kind == KeyEventKind::Press => {
                                key_event
                            }
                            _ => continue,
                        };

                        let Some(action) = map_key(key_event.code) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        let delivered = match (action, &buttons) {
                            (KeyAction::Button(button), Some(buttons)) => {
                                buttons.send(button).is_ok()
                            }
                            (KeyAction::Button(Button::Trigger), None) => {
                                input.send(UserInput::Trigger).is_ok()
                            }
                            (KeyAction::Button(Button::Exit), None) => {
                                input.send(UserInput::Exit).is_ok()
                            }
                            (KeyAction::Input(user_input), _) => input.send(user_input).is_ok(),
                        };
                        if !delivered {
                            warn!("Keyboard input no longer consumed");
                            break;
                        }

                        if action == KeyAction::Input(UserInput::Quit) {
                            info!("Quit key pressed - requesting shutdown");
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;

        let _ = disable_raw_mode();

        Ok(())
    }
}
