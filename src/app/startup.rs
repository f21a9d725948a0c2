use super::types::{FINISHER, HARDWARE, KEYBOARD, ORCHESTRATOR, PRESENTER};
use super::{Booth, ComponentState};
use crate::camera::{preview_interval, CameraBuilder};
use crate::communicator::{Communicator, Role};
use crate::error::{BoothError, Result};
use crate::finisher::{Finisher, MetadataWriter, PictureNaming, PictureSaver};
#[cfg(feature = "keyboard")]
use crate::hardware::KeyboardInputHandler;
use crate::hardware::{HardwareInput, LogLamp};
use crate::layout::VerticalStrip;
use crate::machine::Context;
use crate::presenter::{LogScreen, Presenter};
use crate::session::{Orchestrator, SessionSettings};
use std::path::Path;
use tracing::{error, info};

impl Booth {
    /// Register all components as stopped
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing photo booth components");

        let mut states = self.component_states.lock().await;
        states.insert(ORCHESTRATOR.to_string(), ComponentState::Stopped);
        states.insert(PRESENTER.to_string(), ComponentState::Stopped);
        states.insert(FINISHER.to_string(), ComponentState::Stopped);

        if self.config.gpio.enable {
            states.insert(HARDWARE.to_string(), ComponentState::Stopped);
        }

        // Only register keyboard component if enabled
        if self.keyboard_enabled {
            states.insert(KEYBOARD.to_string(), ComponentState::Stopped);
        }

        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Build every execution context and spawn it on its own task
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting photo booth");

        let mut roles = vec![Role::Master, Role::Presenter, Role::Worker];
        if self.config.gpio.enable {
            roles.push(Role::Gpio);
        }
        let comm = Communicator::new(&roles);
        self.comm = Some(comm.clone());

        // Finisher first so that no job is ever queued without a consumer
        self.set_component_state(FINISHER, ComponentState::Starting)
            .await;
        let finisher = self.build_finisher(comm.clone());
        info!("Finishing tasks: {}", finisher.task_names().join(", "));
        self.contexts.finisher = Some(tokio::spawn(finisher.run()));
        self.set_component_state(FINISHER, ComponentState::Running)
            .await;

        self.set_component_state(PRESENTER, ComponentState::Starting)
            .await;
        let input = self
            .input_receiver
            .take()
            .ok_or_else(|| BoothError::system("Booth has already been started"))?;
        let presenter = Presenter::new(
            comm.clone(),
            Box::new(LogScreen::new()),
            input,
            self.timings.clone(),
        );
        self.contexts.presenter = Some(tokio::spawn(presenter.run()));
        self.set_component_state(PRESENTER, ComponentState::Running)
            .await;

        if self.config.gpio.enable {
            self.set_component_state(HARDWARE, ComponentState::Starting)
                .await;
            let buttons = self
                .button_receiver
                .take()
                .ok_or_else(|| BoothError::system("Booth has already been started"))?;
            let lamp = LogLamp::new(self.config.gpio.lamp_pin);
            let hardware = HardwareInput::new(comm.clone(), Box::new(lamp), buttons);
            self.contexts.hardware = Some(tokio::spawn(hardware.run()));
            self.set_component_state(HARDWARE, ComponentState::Running)
                .await;
            info!(
                "Hardware input on pins trigger={} exit={} lamp={}",
                self.config.gpio.trigger_pin, self.config.gpio.exit_pin, self.config.gpio.lamp_pin
            );
        }

        self.set_component_state(ORCHESTRATOR, ComponentState::Starting)
            .await;
        let orchestrator = self.build_orchestrator(comm.clone()).map_err(|e| {
            error!("Failed to build the session orchestrator: {}", e);
            e
        })?;
        self.contexts.orchestrator = Some(tokio::spawn(orchestrator.run()));
        self.set_component_state(ORCHESTRATOR, ComponentState::Running)
            .await;

        self.start_keyboard().await?;
        self.setup_signal_handlers(comm);

        info!("Photo booth started successfully");
        Ok(())
    }

    fn build_finisher(&self, comm: Communicator) -> Finisher {
        let storage = &self.config.storage;
        let mut finisher =
            Finisher::new(comm).with_composite_task(PictureSaver::new(&storage.basedir));
        if storage.save_metadata {
            finisher = finisher.with_composite_task(MetadataWriter::new(&storage.basedir));
        }
        if storage.keep_shots {
            finisher = finisher.with_shot_task(PictureSaver::new(&storage.basedir));
        }
        finisher
    }

    fn build_orchestrator(&self, comm: Communicator) -> Result<Orchestrator> {
        let session = &self.config.session;
        let storage = &self.config.storage;

        let context = Context::new(
            session.initial_state(self.run_now),
            session.total_shots(),
            comm,
        )?;
        let camera = CameraBuilder::new()
            .config(self.config.camera.clone())
            .build()?;
        let naming = PictureNaming::new(
            Path::new(&storage.basedir),
            &storage.basename,
            storage.naming,
        )?;
        let settings = SessionSettings {
            preview: self.config.camera.preview,
            preview_interval: preview_interval(self.config.camera.preview_fps),
            keep_shots: storage.keep_shots,
        };

        info!(
            "Sessions take {} shots ({}x{}{})",
            session.total_shots(),
            session.num_x,
            session.num_y,
            if session.skip_last { ", last skipped" } else { "" }
        );

        Ok(Orchestrator::new(
            context,
            camera,
            Box::new(VerticalStrip),
            naming,
            settings,
        ))
    }

    #[cfg(feature = "keyboard")]
    async fn start_keyboard(&mut self) -> Result<()> {
        if !self.keyboard_enabled {
            return Ok(());
        }

        self.set_component_state(KEYBOARD, ComponentState::Starting)
            .await;
        let buttons = self
            .config
            .gpio
            .enable
            .then(|| self.button_sender.clone());
        let keyboard_handler = KeyboardInputHandler::new(self.input_sender.clone(), buttons);
        keyboard_handler.start().await.map_err(|e| {
            error!("Failed to start keyboard handler: {}", e);
            e
        })?;
        self.keyboard_handler = Some(keyboard_handler);
        self.set_component_state(KEYBOARD, ComponentState::Running)
            .await;
        Ok(())
    }

    #[cfg(not(feature = "keyboard"))]
    async fn start_keyboard(&mut self) -> Result<()> {
        if self.keyboard_enabled {
            tracing::warn!("Keyboard input requested but not compiled in");
            self.set_component_state(KEYBOARD, ComponentState::Failed)
                .await;
        }
        Ok(())
    }
}
