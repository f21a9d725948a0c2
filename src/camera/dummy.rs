use super::interface::Camera;
use crate::error::{CameraError, ValidationError};
use crate::picture::Picture;
use async_trait::async_trait;
use tracing::{debug, info};

const SATURATION: f32 = 0.2;
const VALUE: f32 = 0.9;

/// Camera stand-in that produces solid pictures of a slowly cycling hue
pub struct DummyCamera {
    width: u32,
    height: u32,
    hue: u16,
    preview: bool,
    released: bool,
}

impl DummyCamera {
    /// Create a new dummy camera producing `width`x`height` RGB pictures
    pub fn new(width: u32, height: u32) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::PictureDimensions { width, height });
        }
        info!("Using dummy camera at {}x{}", width, height);
        Ok(Self {
            width,
            height,
            hue: 0,
            preview: true,
            released: false,
        })
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    fn next_picture(&mut self) -> Result<Picture, CameraError> {
        if self.released {
            return Err(CameraError::Released);
        }
        self.hue = (self.hue + 1) % 360;
        let rgb = hsv_to_rgb(f32::from(self.hue) / 360.0, SATURATION, VALUE);
        Picture::filled(self.width, self.height, rgb).map_err(|e| CameraError::Capture {
            details: e.to_string(),
        })
    }
}

#[async_trait]
impl Camera for DummyCamera {
    fn name(&self) -> &str {
        "dummy"
    }

    fn has_preview(&self) -> bool {
        self.preview
    }

    fn has_idle(&self) -> bool {
        false
    }

    async fn activate(&mut self) -> Result<(), CameraError> {
        if self.released {
            info!("Reopening dummy camera");
            self.released = false;
        }
        Ok(())
    }

    async fn capture_preview_frame(&mut self) -> Result<Picture, CameraError> {
        if !self.preview {
            return Err(CameraError::Unsupported {
                operation: "preview",
            });
        }
        self.next_picture()
    }

    async fn capture_picture(&mut self) -> Result<Picture, CameraError> {
        let picture = self.next_picture()?;
        debug!("Dummy camera captured {} at hue {}", picture, self.hue);
        Ok(picture)
    }

    async fn release(&mut self) -> Result<(), CameraError> {
        self.released = true;
        info!("Dummy camera released");
        Ok(())
    }
}

/// HSV in `0.0..=1.0` to 8-bit RGB
pub(crate) fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let to_byte = |x: f32| (x * 255.0) as u8;
    if s == 0.0 {
        return [to_byte(v); 3];
    }

    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match (sector as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [to_byte(r), to_byte(g), to_byte(b)]
}
