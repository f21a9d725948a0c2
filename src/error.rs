use crate::communicator::Role;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoothError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value: {0}")]
    Validation(#[from] ValidationError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Finishing task error: {0}")]
    Task(#[from] TaskError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl BoothError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Rejected construction of an event, state or picture
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("shot index {index} outside 1..={total}")]
    ShotOutOfRange { index: u32, total: u32 },

    #[error("a session needs at least one shot")]
    NoShots,

    #[error("only the review camera event carries a picture, got '{name}'")]
    PictureMismatch { name: String },

    #[error("picture dimensions must be positive, got {width}x{height}")]
    PictureDimensions { width: u32, height: u32 },

    #[error("picture buffer holds {actual} bytes, expected {expected}")]
    PictureSize { expected: usize, actual: usize },

    #[error("initial state must be Welcome or Startup, got {state}")]
    InitialState { state: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("role {0} has no channel attached")]
    InvalidRole(Role),

    #[error("channel for role {0} is closed")]
    ChannelClosed(Role),
}

/// Broken contract between the presenter and the orchestrator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unexpected event {event} in state {state}")]
    UnexpectedEvent { state: String, event: String },

    #[error("unknown event {event} in state {state} (expected one of {expected:?})")]
    UnknownEvent {
        state: String,
        event: String,
        expected: Vec<String>,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera initialization failed: {details}")]
    Initialization { details: String },

    #[error("capture failed: {details}")]
    Capture { details: String },

    #[error("camera does not support {operation}")]
    Unsupported { operation: &'static str },

    #[error("camera has been released")]
    Released,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("no shots to assemble")]
    Empty,

    #[error("shot {index} does not match the first shot: {details}")]
    Mismatch { index: usize, details: String },
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{task} failed for {destination}: {source}")]
    Io {
        task: String,
        destination: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{task} could not serialize {destination}: {details}")]
    Serialization {
        task: String,
        destination: String,
        details: String,
    },

    #[error("{task} failed: {details}")]
    Failed { task: String, details: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    #[error("lamp on pin {pin} failed: {details}")]
    Lamp { pin: u8, details: String },
}

pub type Result<T> = std::result::Result<T, BoothError>;
