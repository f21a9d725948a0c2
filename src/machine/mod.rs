//! Session state machine: event and state vocabulary plus the pure
//! transition rule owned by [`Context`].

pub mod context;
pub mod event;
pub mod state;

pub use context::{transition, Context, Outcome, Transition};
pub use event::{
    CameraEvent, ErrorEvent, Event, Label, TeardownTarget, EXIT_CODE_CLEAN, EXIT_CODE_RESTART,
};
pub use state::{ErrorState, Shot, State};
