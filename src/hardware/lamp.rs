use crate::error::HardwareError;
use tracing::debug;

/// Output pin driving the trigger button light
pub trait Lamp: Send {
    fn pin(&self) -> u8;

    fn set(&mut self, lit: bool) -> Result<(), HardwareError>;

    fn is_lit(&self) -> bool;
}

/// Lamp that only logs its pin level
#[derive(Debug)]
pub struct LogLamp {
    pin: u8,
    lit: bool,
}

impl LogLamp {
    pub fn new(pin: u8) -> Self {
        Self { pin, lit: false }
    }
}

impl Lamp for LogLamp {
    fn pin(&self) -> u8 {
        self.pin
    }

    fn set(&mut self, lit: bool) -> Result<(), HardwareError> {
        if self.lit != lit {
            debug!("Lamp on pin {} {}", self.pin, if lit { "on" } else { "off" });
        }
        self.lit = lit;
        Ok(())
    }

    fn is_lit(&self) -> bool {
        self.lit
    }
}
