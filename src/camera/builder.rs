use super::dummy::DummyCamera;
use super::interface::Camera;
use crate::config::CameraConfig;
use crate::error::{BoothError, Result};
use std::time::Duration;

/// Builder for the booth camera
pub struct CameraBuilder {
    config: Option<CameraConfig>,
}

impl CameraBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<Box<dyn Camera>> {
        let config = self
            .config
            .ok_or_else(|| BoothError::system("Camera configuration must be specified"))?;

        let (width, height) = config.resolution;
        let camera = DummyCamera::new(width, height)?.with_preview(config.preview);
        Ok(Box::new(camera))
    }
}

impl Default for CameraBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sleep between two preview frames for the given frame rate
pub fn preview_interval(preview_fps: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(preview_fps.max(1)))
}
