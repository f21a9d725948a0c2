mod controller;
mod screen;

pub use controller::{Presenter, PresenterTimings, UserInput};
pub use screen::{LogScreen, Screen};
