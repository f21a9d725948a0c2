use super::dummy::hsv_to_rgb;
use super::*;
use crate::config::CameraConfig;
use crate::error::{BoothError, CameraError};

fn create_test_camera_config() -> CameraConfig {
    CameraConfig {
        preview: true,
        preview_fps: 10,
        resolution: (8, 6),
    }
}

#[tokio::test]
async fn test_dummy_camera_cycles_hue() {
    let mut camera = DummyCamera::new(8, 6).unwrap();
    assert!(camera.has_preview());
    assert!(!camera.has_idle());

    camera.activate().await.unwrap();
    let first = camera.capture_picture().await.unwrap();
    let mut later = camera.capture_preview_frame().await.unwrap();
    for _ in 0..60 {
        later = camera.capture_preview_frame().await.unwrap();
    }

    assert_eq!((first.width(), first.height()), (8, 6));
    assert_eq!(first.len(), 8 * 6 * 3);
    assert_ne!(first.data()[..3], later.data()[..3]);
}

#[tokio::test]
async fn test_dummy_camera_reopens_after_release() {
    let mut camera = DummyCamera::new(2, 2).unwrap();
    camera.release().await.unwrap();

    assert_eq!(
        camera.capture_picture().await.unwrap_err(),
        CameraError::Released
    );
    camera.activate().await.unwrap();
    assert!(camera.capture_picture().await.is_ok());
}

#[tokio::test]
async fn test_dummy_camera_without_preview() {
    let mut camera = DummyCamera::new(2, 2).unwrap().with_preview(false);
    assert!(!camera.has_preview());
    assert!(matches!(
        camera.capture_preview_frame().await,
        Err(CameraError::Unsupported { .. })
    ));
    assert!(camera.idle().await.is_err());
}

#[test]
fn test_dummy_camera_rejects_zero_resolution() {
    assert!(DummyCamera::new(0, 480).is_err());
}

#[test]
fn test_hsv_conversion() {
    assert_eq!(hsv_to_rgb(0.0, 0.0, 1.0), [255, 255, 255]);
    assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
    assert_eq!(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0)[1], 255);
}

#[test]
fn test_camera_builder_pattern() {
    let camera = CameraBuilder::new()
        .config(create_test_camera_config())
        .build()
        .unwrap();
    assert_eq!(camera.name(), "dummy");
    assert!(camera.has_preview());
}

#[test]
fn test_camera_builder_validation() {
    let result = CameraBuilder::new().build();

    if let Err(BoothError::System { message }) = result {
        assert!(message.contains("Camera configuration must be specified"));
    } else {
        panic!("Expected system error for missing configuration");
    }
}

#[test]
fn test_preview_interval() {
    assert_eq!(preview_interval(10).as_millis(), 100);
    assert_eq!(preview_interval(0).as_millis(), 1000);
}

#[tokio::test]
async fn test_mock_camera_scripted_failures() {
    let mut camera = MockCamera::new().fail_capture(2).fail_activate();
    let probe = camera.probe();

    assert!(camera.activate().await.is_err());
    assert!(camera.capture_picture().await.is_ok());
    assert!(matches!(
        camera.capture_picture().await,
        Err(CameraError::Capture { .. })
    ));

    probe.heal();
    assert!(camera.activate().await.is_ok());
    assert!(camera.capture_picture().await.is_ok());
    camera.release().await.unwrap();

    assert_eq!(probe.activate_calls(), 2);
    assert_eq!(probe.capture_calls(), 3);
    assert_eq!(probe.release_calls(), 1);
}
