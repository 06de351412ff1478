//! 디바이스 전송 포트.
//!
//! 구현: `wearcapture-device` crate (adb)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::device::{DeviceInfo, SwipeSpec};
use crate::models::frame::Frame;

/// 디바이스 전송 계층 (목록 조회, 화면 캡처, 스와이프)
///
/// 구현체: `AdbTransport` (실제 디바이스), 테스트용 스크립트 전송
/// 재시도 정책은 구현체 또는 호출자 책임이다.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// 연결된 디바이스 목록. 빈 목록은 에러가 아니다.
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, CoreError>;

    /// 화면 한 장 캡처
    ///
    /// 실패 시 `CoreError::CaptureFailure`.
    async fn capture_frame(&self, device_id: &str) -> Result<Frame, CoreError>;

    /// 스와이프 제스처 발행
    ///
    /// 실패 시 `CoreError::GestureFailure`.
    async fn scroll(&self, device_id: &str, gesture: &SwipeSpec) -> Result<(), CoreError>;

    /// 전송 계층 이름 (로그용)
    fn name(&self) -> &str {
        "device"
    }
}
