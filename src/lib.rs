pub mod app;
pub mod camera;
pub mod communicator;
pub mod config;
pub mod error;
pub mod finisher;
pub mod hardware;
pub mod layout;
pub mod machine;
pub mod picture;
pub mod presenter;
pub mod session;

pub use app::{Booth, ComponentState};
pub use communicator::{Communicator, Message, Role, WorkItem};
pub use config::BoothConfig;
pub use error::{BoothError, Result};
pub use machine::{
    Context, Event, Outcome, Shot, State, TeardownTarget, EXIT_CODE_CLEAN, EXIT_CODE_RESTART,
};
pub use picture::{Picture, PictureFormat};
pub use session::{Orchestrator, SessionSettings};
