mod input;
#[cfg(feature = "keyboard")]
mod keyboard;
mod lamp;

pub use input::{Button, HardwareInput};
#[cfg(feature = "keyboard")]
pub use keyboard::{map_key, KeyAction, KeyboardInputHandler};
pub use lamp::{Lamp, LogLamp};
