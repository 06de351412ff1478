//! 디바이스 모델.

use serde::{Deserialize, Serialize};

/// 연결된 디바이스 정보 (`adb devices -l` 한 줄)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// 시리얼
    pub id: String,
    /// 연결 상태 (`device`, `offline`, `unauthorized` 등)
    pub state: String,
    /// 모델명 (예: `SM-R910`)
    pub model: Option<String>,
    /// 화면 크기 (width, height), 보고하지 않으면 None
    pub display_size: Option<(u32, u32)>,
}

impl DeviceInfo {
    /// 온라인(명령 수신 가능) 여부
    pub fn is_online(&self) -> bool {
        self.state == "device"
    }
}

/// 스와이프 제스처 파라미터
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeSpec {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
    /// 지속 시간 (ms)
    pub duration_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_device_state_is_online() {
        let mut info = DeviceInfo {
            id: "R3CT10ABCDE".into(),
            state: "device".into(),
            model: Some("SM-R910".into()),
            display_size: Some((450, 450)),
        };
        assert!(info.is_online());
        info.state = "unauthorized".into();
        assert!(!info.is_online());
    }
}
