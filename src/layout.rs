use crate::error::LayoutError;
use crate::picture::{Picture, PictureFormat};
use tracing::debug;

/// Composes the shots of one session into the final picture
pub trait Layout: Send + Sync {
    fn name(&self) -> &str;

    fn assemble(&self, shots: &[Picture]) -> Result<Picture, LayoutError>;
}

/// Stacks equal-width RGB shots top to bottom
#[derive(Debug, Default, Clone, Copy)]
pub struct VerticalStrip;

impl Layout for VerticalStrip {
    fn name(&self) -> &str {
        "vertical-strip"
    }

    fn assemble(&self, shots: &[Picture]) -> Result<Picture, LayoutError> {
        let first = shots.first().ok_or(LayoutError::Empty)?;

        for (index, shot) in shots.iter().enumerate() {
            if shot.format() != PictureFormat::Rgb24 {
                return Err(LayoutError::Mismatch {
                    index,
                    details: format!("{:?} shots cannot be stacked", shot.format()),
                });
            }
            if shot.width() != first.width() {
                return Err(LayoutError::Mismatch {
                    index,
                    details: format!("width {} != {}", shot.width(), first.width()),
                });
            }
        }

        if shots.len() == 1 {
            return Ok(first.clone());
        }

        let height = shots.iter().map(Picture::height).sum();
        let mut data = Vec::with_capacity(shots.iter().map(Picture::len).sum());
        for shot in shots {
            data.extend_from_slice(shot.data());
        }

        let composite = Picture::new(first.width(), height, PictureFormat::Rgb24, data).map_err(
            |e| LayoutError::Mismatch {
                index: 0,
                details: e.to_string(),
            },
        )?;
        debug!("Assembled {} shots into {}", shots.len(), composite);
        Ok(composite)
    }
}
