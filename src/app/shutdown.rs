#[cfg(feature = "keyboard")]
use super::types::KEYBOARD;
use super::types::{FINISHER, HARDWARE, PRESENTER};
use super::{Booth, ComponentState};
use crate::error::Result;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info};

impl Booth {
    /// Stop the remaining contexts once the orchestrator is done.
    ///
    /// Closing the channels lets every loop drain what is queued and end;
    /// each one gets a bounded time to do so.
    pub async fn shutdown(&mut self) {
        info!("Beginning graceful shutdown");

        if let Some(comm) = self.comm.take() {
            comm.close();
        }
        for signal in self.contexts.signals.drain(..) {
            signal.abort();
        }

        self.stop_keyboard().await;

        let presenter = self.contexts.presenter.take();
        self.join_loop(PRESENTER, presenter).await;

        let hardware = self.contexts.hardware.take();
        self.join_loop(HARDWARE, hardware).await;

        if let Some(finisher) = self.contexts.finisher.take() {
            let stats = self.join_component(FINISHER, finisher).await;
            if let Some(stats) = stats {
                info!(
                    "Finisher ran {} jobs ({} tasks failed)",
                    stats.jobs, stats.failed
                );
                self.finisher_stats = Some(stats);
            }
        }

        info!("Graceful shutdown completed");
    }

    async fn join_loop(&self, component: &str, handle: Option<JoinHandle<Result<()>>>) {
        let Some(handle) = handle else {
            return;
        };
        if let Some(Err(e)) = self.join_component(component, handle).await {
            error!("{} component ended with error: {}", component, e);
            self.set_component_state(component, ComponentState::Failed)
                .await;
        }
    }

    /// Wait for a context task, aborting it when it overruns the timeout
    async fn join_component<T>(&self, component: &str, mut handle: JoinHandle<T>) -> Option<T> {
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        match timeout(self.join_timeout, &mut handle).await {
            Ok(Ok(output)) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
                Some(output)
            }
            Ok(Err(e)) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("{} component task failed: {}", component, e);
                None
            }
            Err(_) => {
                handle.abort();
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("{} component stop timeout", component);
                None
            }
        }
    }

    #[cfg(feature = "keyboard")]
    async fn stop_keyboard(&mut self) {
        let Some(keyboard_handler) = self.keyboard_handler.take() else {
            return;
        };
        self.set_component_state(KEYBOARD, ComponentState::Stopping)
            .await;
        match timeout(std::time::Duration::from_secs(2), keyboard_handler.stop()).await {
            Ok(Ok(())) => {
                self.set_component_state(KEYBOARD, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", KEYBOARD);
            }
            Ok(Err(e)) => {
                self.set_component_state(KEYBOARD, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", KEYBOARD, e);
            }
            Err(_) => {
                self.set_component_state(KEYBOARD, ComponentState::Failed)
                    .await;
                tracing::warn!("{} component stop timeout", KEYBOARD);
            }
        }
    }

    #[cfg(not(feature = "keyboard"))]
    async fn stop_keyboard(&mut self) {}
}
