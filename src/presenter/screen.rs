use crate::machine::{State, TeardownTarget};
use crate::picture::Picture;
use tracing::{info, trace};

/// Rendering surface of the presenter
pub trait Screen: Send {
    fn show_state(&mut self, state: &State);

    /// Seconds left until the next shot
    fn show_countdown(&mut self, remaining: u32);

    fn show_preview(&mut self, frame: &Picture);

    fn show_notice(&mut self, notice: &str);
}

/// Screen that renders every view as a log line
#[derive(Debug, Default)]
pub struct LogScreen {
    previews: u64,
}

impl LogScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previews(&self) -> u64 {
        self.previews
    }
}

impl Screen for LogScreen {
    fn show_state(&mut self, state: &State) {
        match state {
            State::Welcome => info!("[screen] Welcome! Press 's' to start or 'q' to quit"),
            State::Startup => info!("[screen] Starting up..."),
            State::Idle => info!("[screen] Press the trigger (space) to take a picture"),
            State::Greeter => info!("[screen] Get ready!"),
            State::Countdown(shot) => info!("[screen] Shot {}", shot),
            State::Capture(shot) => info!("[screen] Cheese! ({})", shot),
            State::Assemble => info!("[screen] Processing picture..."),
            State::Review(picture) => info!("[screen] Here is your picture: {}", picture),
            State::Postprocess => info!("[screen] Saving, press 'c' to cancel"),
            State::Error(error) => info!(
                "[screen] Error in {}: {}. Press 'r' to retry or 'a' to abort",
                error.origin(),
                error.message()
            ),
            State::Teardown(TeardownTarget::Welcome) => {
                info!("[screen] Session ended, press 'w' for the welcome screen")
            }
            State::Teardown(target) => info!("[screen] Shutting down ({})", target),
        }
    }

    fn show_countdown(&mut self, remaining: u32) {
        info!("[screen] {}...", remaining);
    }

    fn show_preview(&mut self, frame: &Picture) {
        self.previews += 1;
        trace!("[screen] preview #{}: {}", self.previews, frame);
    }

    fn show_notice(&mut self, notice: &str) {
        info!("[screen] {}", notice);
    }
}
