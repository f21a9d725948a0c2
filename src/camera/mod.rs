mod builder;
mod dummy;
mod interface;
mod mock;
#[cfg(test)]
mod tests;

pub use builder::{preview_interval, CameraBuilder};
pub use dummy::DummyCamera;
pub use interface::Camera;
pub use mock::{MockCamera, MockCameraProbe};
