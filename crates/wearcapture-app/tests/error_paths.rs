//! 크레이트 경계 에러 경로 테스트.

use std::time::Duration;

use wearcapture_core::config::CaptureConfig;
use wearcapture_core::error::CoreError;
use wearcapture_core::models::capture::RunFailure;
use wearcapture_core::models::device::DeviceInfo;
use wearcapture_core::ports::device::DeviceTransport;
use wearcapture_device::AdbTransport;
use wearcapture_engine::{resolve_device, CaptureSession};

fn missing_adb() -> AdbTransport {
    AdbTransport::new("/nonexistent/wearcapture/adb", Duration::from_secs(2))
}

#[tokio::test]
async fn missing_adb_is_reported_before_device_selection() {
    let transport = missing_adb();
    let err = resolve_device(&transport, None).await.unwrap_err();
    assert_eq!(err.code(), "adb_not_found");
    assert!(err.is_transport_failure());
}

#[tokio::test]
async fn run_with_missing_adb_fails_without_partial() {
    let device = DeviceInfo {
        id: "wear-1".into(),
        state: "device".into(),
        model: None,
        display_size: Some((384, 384)),
    };
    let transport: std::sync::Arc<dyn DeviceTransport> = std::sync::Arc::new(missing_adb());
    let failure = CaptureSession::new(transport, CaptureConfig::default(), device)
        .run()
        .await
        .unwrap_err();
    assert_eq!(failure.code(), "adb_not_found");
    assert!(failure.partial.is_none());
}

#[test]
fn failure_codes_are_stable() {
    let failure = RunFailure::bare(CoreError::StitchFailure {
        confidence: 0.42,
        floor: 0.7,
    });
    assert_eq!(failure.code(), "stitch_failure");
    assert!(failure.to_string().contains("0.42"));

    let failure: RunFailure = CoreError::WidthMismatch {
        expected: 450,
        actual: 384,
    }
    .into();
    assert_eq!(failure.code(), "width_mismatch");
}
