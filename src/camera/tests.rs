use super::*;
use crate::config::CameraConfig;
use std::io::Write;

fn create_test_camera_config(source: &str, still_image_path: Option<String>) -> CameraConfig {
    CameraConfig {
        source: source.to_string(),
        index: 0,
        resolution: (640, 480),
        fps: 30,
        still_image_path,
    }
}

#[tokio::test]
async fn test_mock_source_lifecycle() {
    let mut source = MockMediaSource::new(vec![fake_jpeg(1), fake_jpeg(2)]);
    let counters = source.counters();

    assert!(matches!(source.capture(), Err(CameraError::NotOpen)));

    source.open().await.unwrap();
    assert!(source.is_open());
    assert_eq!(source.capture().unwrap(), fake_jpeg(1));
    assert_eq!(source.capture().unwrap(), fake_jpeg(2));
    assert_eq!(source.capture().unwrap(), fake_jpeg(1));

    source.close().await.unwrap();
    source.close().await.unwrap();
    assert!(!source.is_open());

    assert_eq!(counters.opens(), 1);
    assert_eq!(counters.closes(), 1);
    assert_eq!(counters.captures(), 3);
}

#[tokio::test]
async fn test_mock_source_denied() {
    let mut source = MockMediaSource::denied();
    let counters = source.counters();

    assert!(matches!(
        source.open().await,
        Err(CameraError::PermissionDenied)
    ));
    assert!(!source.is_open());
    assert_eq!(counters.opens(), 0);
}

#[tokio::test]
async fn test_still_source_cycles_directory() {
    let dir = tempfile::tempdir().unwrap();
    for (name, seed) in [("b.jpg", 2u8), ("a.jpeg", 1u8)] {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        file.write_all(&fake_jpeg(seed)).unwrap();
    }
    std::fs::write(dir.path().join("notes.txt"), b"not a frame").unwrap();

    let mut source = StillImageSource::new(dir.path());
    source.open().await.unwrap();

    assert_eq!(source.capture().unwrap(), fake_jpeg(1));
    assert_eq!(source.capture().unwrap(), fake_jpeg(2));
    assert_eq!(source.capture().unwrap(), fake_jpeg(1));

    source.close().await.unwrap();
    assert!(!source.is_open());
}

#[tokio::test]
async fn test_still_source_missing_path() {
    let mut source = StillImageSource::new("/nonexistent/posecoach/frames");
    let result = source.open().await;
    assert!(matches!(result, Err(CameraError::DeviceOpen { .. })));
    assert!(!source.is_open());
}

#[tokio::test]
async fn test_still_source_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = StillImageSource::new(dir.path());
    assert!(matches!(
        source.open().await,
        Err(CameraError::DeviceOpen { .. })
    ));
}

#[test]
fn test_builder_selects_still_source() {
    let config = create_test_camera_config("still", Some("./frames".to_string()));
    let source = MediaSourceBuilder::new().config(config).build().unwrap();
    assert!(source.describe().contains("frames"));
    assert!(!source.is_open());
}

#[test]
fn test_builder_validation() {
    assert!(MediaSourceBuilder::new().build().is_err());

    let missing_path = create_test_camera_config("still", None);
    assert!(MediaSourceBuilder::new().config(missing_path).build().is_err());

    let unknown = create_test_camera_config("webcam", None);
    assert!(MediaSourceBuilder::new().config(unknown).build().is_err());
}
