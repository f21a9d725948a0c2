use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

/// Pixel encoding of a picture buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PictureFormat {
    /// Uncompressed 8-bit RGB, row-major
    Rgb24,
    /// JPEG compressed image
    Jpeg,
}

impl PictureFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PictureFormat::Rgb24 => 3,
            PictureFormat::Jpeg => 0, // Variable size, compressed
        }
    }

    /// Check if format is compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, PictureFormat::Jpeg)
    }

    /// File extension used when the picture is written to disk
    pub fn extension(&self) -> &'static str {
        match self {
            PictureFormat::Rgb24 => "rgb",
            PictureFormat::Jpeg => "jpg",
        }
    }
}

/// An image as it crosses a channel: dimensions plus an owned byte buffer.
///
/// The buffer is reference counted and never mutated, so clones are cheap
/// and share storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPicture")]
pub struct Picture {
    width: u32,
    height: u32,
    format: PictureFormat,
    data: Arc<Vec<u8>>,
    captured_at: SystemTime,
}

#[derive(Deserialize)]
struct RawPicture {
    width: u32,
    height: u32,
    format: PictureFormat,
    data: Vec<u8>,
    captured_at: SystemTime,
}

impl TryFrom<RawPicture> for Picture {
    type Error = ValidationError;

    fn try_from(raw: RawPicture) -> Result<Self, Self::Error> {
        let mut picture = Picture::new(raw.width, raw.height, raw.format, raw.data)?;
        picture.captured_at = raw.captured_at;
        Ok(picture)
    }
}

impl Picture {
    /// Create a new picture, validating dimensions against the buffer
    pub fn new(
        width: u32,
        height: u32,
        format: PictureFormat,
        data: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::PictureDimensions { width, height });
        }

        if !format.is_compressed() {
            let expected = width as usize * height as usize * format.bytes_per_pixel();
            if data.len() != expected {
                return Err(ValidationError::PictureSize {
                    expected,
                    actual: data.len(),
                });
            }
        } else if data.is_empty() {
            return Err(ValidationError::Empty {
                field: "picture data",
            });
        }

        Ok(Self {
            width,
            height,
            format,
            data: Arc::new(data),
            captured_at: SystemTime::now(),
        })
    }

    /// Solid-colour RGB picture
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, ValidationError> {
        let pixels = width as usize * height as usize;
        let data = rgb.iter().copied().cycle().take(pixels * 3).collect();
        Self::new(width, height, PictureFormat::Rgb24, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PictureFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when both pictures share the same underlying buffer
    pub fn same_buffer(&self, other: &Picture) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl std::fmt::Display for Picture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} {:?} ({} bytes)",
            self.width,
            self.height,
            self.format,
            self.data.len()
        )
    }
}
