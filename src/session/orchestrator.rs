use super::handshake::{self, SessionError};
use crate::camera::Camera;
use crate::communicator::{Communicator, Message, Role};
use crate::error::{BoothError, CameraError, ChannelError, Result};
use crate::finisher::{FinisherQueue, FinishingJob, PictureNaming};
use crate::layout::Layout;
use crate::machine::{Context, Event, Shot, State, TeardownTarget};
use crate::picture::Picture;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Capture-side behaviour switches
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Stream preview frames to the presenter during countdowns
    pub preview: bool,
    pub preview_interval: Duration,
    /// Archive every single shot in addition to the composite
    pub keep_shots: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            preview: true,
            preview_interval: Duration::from_millis(100),
            keep_shots: false,
        }
    }
}

/// Pictures of the session in progress
#[derive(Debug, Default)]
struct Session {
    id: Uuid,
    shots: Vec<Picture>,
    composite: Option<Picture>,
}

impl Session {
    fn start() -> Self {
        Self {
            id: Uuid::new_v4(),
            shots: Vec::new(),
            composite: None,
        }
    }
}

/// Drives the state machine from the capture-control context.
///
/// Each loop iteration performs the side effects of the current state and
/// feeds exactly one event back into the [`Context`].
pub struct Orchestrator {
    context: Context,
    comm: Communicator,
    camera: Box<dyn Camera>,
    layout: Box<dyn Layout>,
    queue: FinisherQueue,
    naming: PictureNaming,
    settings: SessionSettings,
    session: Session,
    camera_released: bool,
}

impl Orchestrator {
    pub fn new(
        context: Context,
        camera: Box<dyn Camera>,
        layout: Box<dyn Layout>,
        naming: PictureNaming,
        settings: SessionSettings,
    ) -> Self {
        let comm = context.communicator().clone();
        Self {
            queue: FinisherQueue::new(comm.clone()),
            context,
            comm,
            camera,
            layout,
            naming,
            settings,
            session: Session::default(),
            camera_released: false,
        }
    }

    pub fn state(&self) -> &State {
        self.context.state()
    }

    /// Run until a teardown asks for the process to end.
    ///
    /// Returns the exit code of the teardown target. Protocol violations and
    /// other non-camera failures end the run with an error after the
    /// other contexts have been told to stop.
    pub async fn run(mut self) -> Result<i32> {
        info!(
            "Orchestrator running with camera '{}' and layout '{}'",
            self.camera.name(),
            self.layout.name()
        );

        loop {
            let unwound = match self.step().await {
                Ok(()) => continue,
                Err(SessionError::Teardown(target)) => self.teardown(target).await,
                Err(SessionError::Fatal(e)) => Err(e),
            };

            match unwound {
                Ok(Some(code)) => return Ok(code),
                Ok(None) => {}
                Err(e) => {
                    error!("Orchestrator failed in {}: {}", self.context.state(), e);
                    self.release_camera().await;
                    self.close_channels();
                    return Err(e);
                }
            }
        }
    }

    async fn step(&mut self) -> std::result::Result<(), SessionError> {
        let state = self.context.state().clone();
        debug!("Entering {}", state);

        match state {
            State::Startup => self.startup().await,
            State::Idle => self.idle().await,
            State::Greeter => self.greeter().await,
            State::Countdown(_) => self.countdown().await,
            State::Capture(shot) => self.capture(shot).await,
            State::Assemble => self.assemble().await,
            State::Postprocess => self.postprocess().await,
            State::Teardown(target) => Err(SessionError::Teardown(target)),
            State::Welcome | State::Review(_) | State::Error(_) => {
                self.await_event(handshake::expected_for(&state)).await
            }
        }
    }

    /// Feed an event into the context; unwinds if it leads into a teardown
    fn apply(&mut self, event: Event) -> std::result::Result<(), SessionError> {
        self.context.handle_event(event)?;
        match self.context.state() {
            State::Teardown(target) => Err(SessionError::Teardown(*target)),
            _ => Ok(()),
        }
    }

    /// Block until the presenter or hardware input answers, then apply the
    /// answer
    async fn await_event(&mut self, expected: &[&str]) -> std::result::Result<(), SessionError> {
        loop {
            let message = match self.comm.receive(Role::Master).await {
                Ok(message) => message,
                Err(ChannelError::ChannelClosed(_)) => {
                    info!("Master channel closed, tearing down");
                    return self.apply(Event::teardown(TeardownTarget::Exit));
                }
                Err(e) => return Err(e.into()),
            };

            let event = match message {
                Message::Event(event) => event,
                other => {
                    warn!("Orchestrator ignoring {} message", other.kind());
                    continue;
                }
            };

            debug!("Received {} in {}", event, self.context.state());
            let event = handshake::accept(self.context.state(), event, expected)?;
            return self.apply(event);
        }
    }

    /// Report a camera failure to the state machine
    fn camera_failed(&mut self, e: CameraError) -> std::result::Result<(), SessionError> {
        error!("Camera error: {}", e);
        self.apply(Event::error("Camera", e.to_string())?)
    }

    async fn startup(&mut self) -> std::result::Result<(), SessionError> {
        if let Err(e) = self.camera.activate().await {
            return self.camera_failed(e);
        }
        self.camera_released = false;
        info!("Camera '{}' ready", self.camera.name());

        let ready = Event::camera("ready")?;
        self.apply(ready.clone())?;
        if let Err(e) = self.comm.send_event(Role::Presenter, ready) {
            debug!("Presenter not notified of camera readiness: {}", e);
        }
        Ok(())
    }

    async fn idle(&mut self) -> std::result::Result<(), SessionError> {
        if self.camera.has_idle() {
            if let Err(e) = self.camera.idle().await {
                return self.camera_failed(e);
            }
        }
        self.session = Session::default();
        self.await_event(handshake::IDLE).await
    }

    async fn greeter(&mut self) -> std::result::Result<(), SessionError> {
        self.session = Session::start();
        self.naming.start_session(self.session.id);
        info!("Starting session {}", self.session.id);

        if let Err(e) = self.camera.activate().await {
            return self.camera_failed(e);
        }
        self.await_event(handshake::ACK).await
    }

    async fn countdown(&mut self) -> std::result::Result<(), SessionError> {
        if self.settings.preview && self.camera.has_preview() {
            // A closed inbox stays empty, so it ends the polling as well
            while self.comm.is_empty(Role::Master)? && !self.comm.is_closed(Role::Master)? {
                let frame = match self.camera.capture_preview_frame().await {
                    Ok(frame) => frame,
                    Err(e) => return self.camera_failed(e),
                };
                if let Err(e) = self.comm.send(Role::Presenter, Message::Preview(frame)) {
                    debug!("Preview frame dropped: {}", e);
                }
                sleep(self.settings.preview_interval).await;
            }
        }
        self.await_event(handshake::COUNTDOWN).await
    }

    async fn capture(&mut self, shot: Shot) -> std::result::Result<(), SessionError> {
        if self.camera.has_idle() {
            if let Err(e) = self.camera.idle().await {
                return self.camera_failed(e);
            }
        }

        let picture = match self.camera.capture_picture().await {
            Ok(picture) => picture,
            Err(e) => return self.camera_failed(e),
        };
        info!("Captured shot {}: {}", shot, picture);

        // A retried capture replaces the shot that failed
        self.session.shots.truncate(shot.index() as usize - 1);
        self.session.shots.push(picture.clone());

        if let Err(e) = self.camera.activate().await {
            return self.camera_failed(e);
        }

        // Archived only once the shot is final; a retry captures it again
        if self.settings.keep_shots {
            let destination = self.naming.next_shot(shot.index());
            self.queue.enqueue(FinishingJob::shot(
                shot.index(),
                picture,
                destination,
                self.session.id,
            ))?;
        }

        let next = if shot.is_last() { "assemble" } else { "countdown" };
        self.apply(Event::camera(next)?)
    }

    async fn assemble(&mut self) -> std::result::Result<(), SessionError> {
        if self.camera.has_idle() {
            if let Err(e) = self.camera.idle().await {
                return self.camera_failed(e);
            }
        }

        let composite = self
            .layout
            .assemble(&self.session.shots)
            .map_err(BoothError::from)?;
        info!(
            "Assembled {} shots of session {} into {}",
            self.session.shots.len(),
            self.session.id,
            composite
        );

        self.session.composite = Some(composite.clone());
        self.apply(Event::review(composite))
    }

    async fn postprocess(&mut self) -> std::result::Result<(), SessionError> {
        match self.session.composite.take() {
            Some(composite) => {
                let destination = self.naming.next_composite();
                self.queue.enqueue(FinishingJob::composite(
                    composite,
                    destination,
                    self.session.id,
                ))?;
            }
            None => debug!("Composite of session {} already queued", self.session.id),
        }
        self.await_event(handshake::ACK).await
    }

    /// Side effects of a teardown; `Some(code)` when the run is over
    async fn teardown(&mut self, mut target: TeardownTarget) -> Result<Option<i32>> {
        self.release_camera().await;

        loop {
            if let Some(code) = target.exit_code() {
                info!("Teardown to {} with exit code {}", target, code);
                self.close_channels();
                return Ok(Some(code));
            }

            info!("Teardown to welcome screen");
            match self.await_event(handshake::TEARDOWN_WELCOME).await {
                Ok(()) => return Ok(None),
                Err(SessionError::Teardown(next)) => target = next,
                Err(SessionError::Fatal(e)) => return Err(e),
            }
        }
    }

    async fn release_camera(&mut self) {
        if self.camera_released {
            return;
        }
        self.camera_released = true;
        match self.camera.release().await {
            Ok(()) => info!("Camera '{}' released", self.camera.name()),
            Err(e) => warn!("Failed to release camera: {}", e),
        }
    }

    fn close_channels(&self) {
        if let Err(e) = self.queue.shutdown() {
            debug!("Finisher queue already closed: {}", e);
        }
        self.comm.close();
    }
}
