/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

pub(super) const ORCHESTRATOR: &str = "orchestrator";
pub(super) const PRESENTER: &str = "presenter";
pub(super) const HARDWARE: &str = "hardware";
pub(super) const FINISHER: &str = "finisher";
pub(super) const KEYBOARD: &str = "keyboard";
