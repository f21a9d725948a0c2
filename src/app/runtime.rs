use super::types::ORCHESTRATOR;
use super::{Booth, ComponentState};
use crate::communicator::{Communicator, Role};
use crate::error::{BoothError, Result};
use crate::machine::{Event, TeardownTarget};
use tracing::{error, info, warn};

impl Booth {
    /// Run the booth until the orchestrator ends the process.
    ///
    /// Returns the exit code chosen by the teardown (0 to exit, 123 to
    /// restart the booth).
    pub async fn run(&mut self) -> Result<i32> {
        self.initialize().await?;
        if let Err(e) = self.start().await {
            error!("Photo booth failed to start: {}", e);
            self.shutdown().await;
            return Err(e);
        }

        info!("Photo booth is running");

        let orchestrator = self
            .contexts
            .orchestrator
            .take()
            .ok_or_else(|| BoothError::system("Orchestrator was not started"))?;

        let outcome = match orchestrator.await {
            Ok(outcome) => outcome,
            Err(e) => Err(BoothError::component(
                ORCHESTRATOR.to_string(),
                format!("task failed: {}", e),
            )),
        };

        let orchestrator_state = match outcome {
            Ok(_) => ComponentState::Stopped,
            Err(_) => ComponentState::Failed,
        };
        self.set_component_state(ORCHESTRATOR, orchestrator_state)
            .await;
        self.shutdown().await;

        match outcome {
            Ok(code) => {
                info!("Photo booth stopped with exit code {}", code);
                Ok(code)
            }
            Err(e) => {
                error!("Photo booth stopped on error: {}", e);
                Err(e)
            }
        }
    }

    /// Translate SIGINT and SIGTERM into an exit teardown
    pub(super) fn setup_signal_handlers(&mut self, comm: Communicator) {
        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let comm = comm.clone();
            self.contexts.signals.push(tokio::spawn(async move {
                let mut sigterm =
                    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            warn!("Failed to register SIGTERM handler: {}", e);
                            return;
                        }
                    };
                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    request_exit(&comm);
                }
            }));
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        self.contexts.signals.push(tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                request_exit(&comm);
            }
        }));
    }
}

fn request_exit(comm: &Communicator) {
    if let Err(e) = comm.send_event(Role::Master, Event::teardown(TeardownTarget::Exit)) {
        warn!("Could not request shutdown: {}", e);
    }
}
