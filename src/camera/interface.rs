use crate::error::CameraError;
use crate::picture::Picture;
use async_trait::async_trait;

/// Capture collaborator driven exclusively by the session orchestrator.
///
/// `idle` is only called when `has_idle` is true and
/// `capture_preview_frame` only when `has_preview` is true.
#[async_trait]
pub trait Camera: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn has_preview(&self) -> bool;

    fn has_idle(&self) -> bool;

    /// Wake the camera up for preview and capture
    async fn activate(&mut self) -> Result<(), CameraError>;

    /// Put the camera into its low-power state
    async fn idle(&mut self) -> Result<(), CameraError> {
        Err(CameraError::Unsupported { operation: "idle" })
    }

    async fn capture_preview_frame(&mut self) -> Result<Picture, CameraError> {
        Err(CameraError::Unsupported {
            operation: "preview",
        })
    }

    async fn capture_picture(&mut self) -> Result<Picture, CameraError>;

    /// Free the device; only `activate` may be called afterwards
    async fn release(&mut self) -> Result<(), CameraError>;
}
