use super::{Booth, ComponentState};
use std::collections::HashMap;
use tracing::debug;

impl Booth {
    pub(super) async fn set_component_state(&self, component: &str, state: ComponentState) {
        let previous = self
            .component_states
            .lock()
            .await
            .insert(component.to_string(), state.clone());
        match previous {
            Some(previous) => debug!("Component '{}': {:?} -> {:?}", component, previous, state),
            None => debug!("Component '{}' registered as {:?}", component, state),
        }
    }

    pub async fn get_component_state(&self, component: &str) -> Option<ComponentState> {
        self.component_states.lock().await.get(component).cloned()
    }

    /// Snapshot of every registered component
    pub async fn get_all_component_states(&self) -> HashMap<String, ComponentState> {
        self.component_states.lock().await.clone()
    }

    /// True when no registered component ended up failed
    pub async fn all_components_healthy(&self) -> bool {
        self.component_states
            .lock()
            .await
            .values()
            .all(|state| *state != ComponentState::Failed)
    }
}
