use crate::error::ValidationError;
use crate::picture::Picture;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-empty text used for event names, error origins and messages
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    pub fn new<S: Into<String>>(field: &'static str, value: S) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Label {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Label::new("label", value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where control lands after a teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeardownTarget {
    Exit,
    Restart,
    Welcome,
}

pub const EXIT_CODE_CLEAN: i32 = 0;
pub const EXIT_CODE_RESTART: i32 = 123;

impl TeardownTarget {
    /// Process exit code for targets that end the run
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            TeardownTarget::Exit => Some(EXIT_CODE_CLEAN),
            TeardownTarget::Restart => Some(EXIT_CODE_RESTART),
            TeardownTarget::Welcome => None,
        }
    }
}

impl fmt::Display for TeardownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownTarget::Exit => f.write_str("Exit"),
            TeardownTarget::Restart => f.write_str("Restart"),
            TeardownTarget::Welcome => f.write_str("Welcome"),
        }
    }
}

/// Failure report from one of the subsystems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    origin: Label,
    message: Label,
}

impl ErrorEvent {
    pub fn origin(&self) -> &Label {
        &self.origin
    }

    pub fn message(&self) -> &Label {
        &self.message
    }
}

/// Progress notification from the capture side.
///
/// Only `review` carries a picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCameraEvent")]
pub struct CameraEvent {
    name: Label,
    picture: Option<Picture>,
}

#[derive(Deserialize)]
struct RawCameraEvent {
    name: Label,
    picture: Option<Picture>,
}

impl TryFrom<RawCameraEvent> for CameraEvent {
    type Error = ValidationError;

    fn try_from(raw: RawCameraEvent) -> Result<Self, Self::Error> {
        let RawCameraEvent { name, picture } = raw;

        if name.as_str() == CameraEvent::REVIEW {
            return picture
                .map(CameraEvent::review)
                .ok_or(ValidationError::Empty {
                    field: "review picture",
                });
        }

        if picture.is_some() {
            return Err(ValidationError::PictureMismatch { name: name.into() });
        }

        Ok(CameraEvent {
            name,
            picture: None,
        })
    }
}

impl CameraEvent {
    pub const REVIEW: &'static str = "review";

    fn named(name: &str) -> Result<Self, ValidationError> {
        if name == Self::REVIEW {
            return Err(ValidationError::PictureMismatch {
                name: name.to_string(),
            });
        }
        Ok(Self {
            name: Label::new("camera event name", name)?,
            picture: None,
        })
    }

    fn review(picture: Picture) -> Self {
        Self {
            name: Label(Self::REVIEW.to_string()),
            picture: Some(picture),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn picture(&self) -> Option<&Picture> {
        self.picture.as_ref()
    }
}

/// Everything that can drive the session state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Error(ErrorEvent),
    Teardown(TeardownTarget),
    Gui(Label),
    Gpio(Label),
    Camera(CameraEvent),
    Worker(Label),
}

impl Event {
    pub const ERROR: &'static str = "error";
    pub const TEARDOWN: &'static str = "teardown";

    pub fn error<O: Into<String>, M: Into<String>>(
        origin: O,
        message: M,
    ) -> Result<Self, ValidationError> {
        Ok(Event::Error(ErrorEvent {
            origin: Label::new("error origin", origin)?,
            message: Label::new("error message", message)?,
        }))
    }

    pub fn teardown(target: TeardownTarget) -> Self {
        Event::Teardown(target)
    }

    pub fn gui(name: &str) -> Result<Self, ValidationError> {
        Ok(Event::Gui(Label::new("gui event name", name)?))
    }

    pub fn gpio(name: &str) -> Result<Self, ValidationError> {
        Ok(Event::Gpio(Label::new("gpio event name", name)?))
    }

    /// Camera notification without a picture; `review` must use [`Event::review`]
    pub fn camera(name: &str) -> Result<Self, ValidationError> {
        Ok(Event::Camera(CameraEvent::named(name)?))
    }

    pub fn review(picture: Picture) -> Self {
        Event::Camera(CameraEvent::review(picture))
    }

    pub fn worker(name: &str) -> Result<Self, ValidationError> {
        Ok(Event::Worker(Label::new("worker event name", name)?))
    }

    /// Rendered name, matched against handshake expectations
    pub fn name(&self) -> &str {
        match self {
            Event::Error(_) => Self::ERROR,
            Event::Teardown(_) => Self::TEARDOWN,
            Event::Gui(name) | Event::Gpio(name) | Event::Worker(name) => name.as_str(),
            Event::Camera(camera) => camera.name(),
        }
    }

    /// Gui or Gpio event with the given name
    pub fn is_input(&self, name: &str) -> bool {
        matches!(self, Event::Gui(label) | Event::Gpio(label) if label.as_str() == name)
    }

    pub fn is_gui(&self, name: &str) -> bool {
        matches!(self, Event::Gui(label) if label.as_str() == name)
    }

    pub fn is_camera(&self, name: &str) -> bool {
        matches!(self, Event::Camera(camera) if camera.name() == name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Error(error) => write!(f, "ErrorEvent({}: {})", error.origin, error.message),
            Event::Teardown(target) => write!(f, "TeardownEvent({})", target),
            Event::Gui(name) => write!(f, "GuiEvent({})", name),
            Event::Gpio(name) => write!(f, "GpioEvent({})", name),
            Event::Camera(camera) => match &camera.picture {
                Some(picture) => write!(f, "CameraEvent({}, {})", camera.name, picture),
                None => write!(f, "CameraEvent({})", camera.name),
            },
            Event::Worker(name) => write!(f, "WorkerEvent({})", name),
        }
    }
}
