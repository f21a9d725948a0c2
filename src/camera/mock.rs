use super::interface::Camera;
use crate::error::CameraError;
use crate::picture::Picture;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct MockCameraState {
    activate_calls: AtomicUsize,
    idle_calls: AtomicUsize,
    preview_calls: AtomicUsize,
    capture_calls: AtomicUsize,
    release_calls: AtomicUsize,
    fail_activate: AtomicBool,
    failing_captures: Mutex<HashSet<usize>>,
    failing_activations: Mutex<HashSet<usize>>,
}

/// Scriptable camera for orchestrator tests.
///
/// Counts every call and fails the calls it was told to fail.
pub struct MockCamera {
    state: Arc<MockCameraState>,
    preview: bool,
    idle: bool,
    size: (u32, u32),
}

/// Shared view on a [`MockCamera`] that stays usable after the camera has
/// been moved into the orchestrator
#[derive(Clone)]
pub struct MockCameraProbe {
    state: Arc<MockCameraState>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockCameraState::default()),
            preview: false,
            idle: false,
            size: (4, 3),
        }
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_idle(mut self, idle: bool) -> Self {
        self.idle = idle;
        self
    }

    /// Fail the `call`-th invocation of `capture_picture` (1-based)
    pub fn fail_capture(self, call: usize) -> Self {
        self.state.failing_captures.lock().insert(call);
        self
    }

    /// Fail the `call`-th invocation of `activate` (1-based)
    pub fn fail_activation(self, call: usize) -> Self {
        self.state.failing_activations.lock().insert(call);
        self
    }

    pub fn fail_activate(self) -> Self {
        self.state.fail_activate.store(true, Ordering::SeqCst);
        self
    }

    pub fn probe(&self) -> MockCameraProbe {
        MockCameraProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCameraProbe {
    pub fn activate_calls(&self) -> usize {
        self.state.activate_calls.load(Ordering::SeqCst)
    }

    pub fn idle_calls(&self) -> usize {
        self.state.idle_calls.load(Ordering::SeqCst)
    }

    pub fn preview_calls(&self) -> usize {
        self.state.preview_calls.load(Ordering::SeqCst)
    }

    pub fn capture_calls(&self) -> usize {
        self.state.capture_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.state.release_calls.load(Ordering::SeqCst)
    }

    /// Clear every scripted failure
    pub fn heal(&self) {
        self.state.fail_activate.store(false, Ordering::SeqCst);
        self.state.failing_captures.lock().clear();
        self.state.failing_activations.lock().clear();
    }
}

#[async_trait]
impl Camera for MockCamera {
    fn name(&self) -> &str {
        "mock"
    }

    fn has_preview(&self) -> bool {
        self.preview
    }

    fn has_idle(&self) -> bool {
        self.idle
    }

    async fn activate(&mut self) -> Result<(), CameraError> {
        let call = self.state.activate_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.state.fail_activate.load(Ordering::SeqCst)
            || self.state.failing_activations.lock().contains(&call)
        {
            return Err(CameraError::Initialization {
                details: "mock camera refused to start".to_string(),
            });
        }
        Ok(())
    }

    async fn idle(&mut self) -> Result<(), CameraError> {
        self.state.idle_calls.fetch_add(1, Ordering::SeqCst);
        if !self.idle {
            return Err(CameraError::Unsupported { operation: "idle" });
        }
        Ok(())
    }

    async fn capture_preview_frame(&mut self) -> Result<Picture, CameraError> {
        let call = self.state.preview_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.preview {
            return Err(CameraError::Unsupported {
                operation: "preview",
            });
        }
        filled(self.size, call)
    }

    async fn capture_picture(&mut self) -> Result<Picture, CameraError> {
        let call = self.state.capture_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.state.failing_captures.lock().contains(&call) {
            return Err(CameraError::Capture {
                details: format!("mock capture {} failed", call),
            });
        }
        filled(self.size, call)
    }

    async fn release(&mut self) -> Result<(), CameraError> {
        self.state.release_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn filled((width, height): (u32, u32), call: usize) -> Result<Picture, CameraError> {
    let shade = (call % 256) as u8;
    Picture::filled(width, height, [shade, shade, shade]).map_err(|e| CameraError::Capture {
        details: e.to_string(),
    })
}
