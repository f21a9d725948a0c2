use super::types::ComponentState;
use crate::communicator::Communicator;
use crate::config::BoothConfig;
use crate::error::Result;
use crate::finisher::FinisherStats;
use crate::hardware::Button;
#[cfg(feature = "keyboard")]
use crate::hardware::KeyboardInputHandler;
use crate::presenter::{PresenterTimings, UserInput};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Join handles of the execution contexts of a running booth
#[derive(Default)]
pub(super) struct Contexts {
    pub(super) orchestrator: Option<JoinHandle<Result<i32>>>,
    pub(super) presenter: Option<JoinHandle<Result<()>>>,
    pub(super) hardware: Option<JoinHandle<Result<()>>>,
    pub(super) finisher: Option<JoinHandle<FinisherStats>>,
    pub(super) signals: Vec<JoinHandle<()>>,
}

/// The photo booth: owns the configuration and runs every execution
/// context (orchestrator, presenter, hardware input, finisher) as its own
/// task until the orchestrator asks the process to end
pub struct Booth {
    pub(super) config: BoothConfig,
    pub(super) run_now: bool,
    pub(super) timings: PresenterTimings,

    // User input endpoints, receivers move into their contexts on start
    pub(super) input_sender: mpsc::UnboundedSender<UserInput>,
    pub(super) input_receiver: Option<mpsc::UnboundedReceiver<UserInput>>,
    pub(super) button_sender: mpsc::UnboundedSender<Button>,
    pub(super) button_receiver: Option<mpsc::UnboundedReceiver<Button>>,

    #[cfg(feature = "keyboard")]
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) keyboard_enabled: bool,

    // Lifecycle management
    pub(super) comm: Option<Communicator>,
    pub(super) contexts: Contexts,
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) finisher_stats: Option<FinisherStats>,
    pub(super) join_timeout: Duration,
}

impl Booth {
    /// Create a booth for the given configuration; nothing runs until
    /// [`Booth::run`]
    pub fn new(config: BoothConfig) -> Self {
        let (input_sender, input_receiver) = mpsc::unbounded_channel();
        let (button_sender, button_receiver) = mpsc::unbounded_channel();
        let timings = PresenterTimings {
            greeter: config.session.greeter(),
            countdown: config.session.countdown_time,
            display: config.session.display(),
            postprocess: config.session.postprocess(),
            ..PresenterTimings::default()
        };

        Self {
            config,
            run_now: false,
            timings,
            input_sender,
            input_receiver: Some(input_receiver),
            button_sender,
            button_receiver: Some(button_receiver),
            #[cfg(feature = "keyboard")]
            keyboard_handler: None,
            keyboard_enabled: false,
            comm: None,
            contexts: Contexts::default(),
            component_states: Arc::new(Mutex::new(HashMap::new())),
            finisher_stats: None,
            join_timeout: Duration::from_secs(5),
        }
    }

    /// Skip the welcome screen and start the camera right away
    pub fn set_run_now(&mut self, run_now: bool) {
        self.run_now = run_now;
    }

    /// Enable or disable the terminal keyboard handler
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    pub fn set_timings(&mut self, timings: PresenterTimings) {
        self.timings = timings;
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    /// Endpoint for touch-screen style input
    pub fn input_sender(&self) -> mpsc::UnboundedSender<UserInput> {
        self.input_sender.clone()
    }

    /// Endpoint for the physical buttons
    pub fn button_sender(&self) -> mpsc::UnboundedSender<Button> {
        self.button_sender.clone()
    }

    /// Totals of the finisher, available once the booth has stopped
    pub fn finisher_stats(&self) -> Option<FinisherStats> {
        self.finisher_stats
    }
}
