//! WearCapture 핵심 에러 타입.
//!
//! 모든 크레이트가 `CoreError`를 그대로 전파한다.
//! 각 변형은 CLI/UI에 노출되는 안정적인 사유 코드(`code()`)를 가진다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정 파일/디렉토리 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패 (캡처 시작 전에만 발생)
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 온라인 디바이스 없음
    #[error("온라인 ADB 디바이스가 없습니다: {0}")]
    NoDeviceFound(String),

    /// 디바이스가 여러 개라 자동 선택 불가
    #[error("디바이스가 여러 개 연결됨 ({}). --serial 로 지정하세요", .0.join(", "))]
    MultipleDevices(Vec<String>),

    /// 요청한 디바이스가 온라인이 아님
    #[error("디바이스 '{serial}' 가 온라인이 아닙니다 (온라인: {online})")]
    DeviceNotOnline {
        /// 요청한 시리얼
        serial: String,
        /// 현재 온라인 시리얼 목록 (쉼표 구분)
        online: String,
    },

    /// adb 바이너리 미발견
    #[error("adb 바이너리를 찾을 수 없음: {0}")]
    AdbNotFound(String),

    /// 화면 캡처 실패 (전송 계층)
    #[error("화면 캡처 실패: {0}")]
    CaptureFailure(String),

    /// 스와이프 제스처 실패 (전송 계층)
    #[error("스와이프 실패: {0}")]
    GestureFailure(String),

    /// 두 프레임의 크기가 다름 (상류 계약 위반)
    #[error("프레임 크기 불일치: expected={}x{}, actual={}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        /// 기준 크기 (width, height)
        expected: (u32, u32),
        /// 실제 크기 (width, height)
        actual: (u32, u32),
    },

    /// 캔버스 너비와 프레임 너비가 다름
    #[error("캔버스 너비 불일치: canvas={expected}, frame={actual}")]
    WidthMismatch {
        /// 캔버스 너비
        expected: u32,
        /// 프레임 너비
        actual: u32,
    },

    /// 새 행 수가 프레임 높이를 넘음
    #[error("겹침 오프셋 범위 초과: offset={offset}, frame height={height}")]
    OffsetOutOfRange { offset: u32, height: u32 },

    /// 겹침 영역을 찾지 못해 이어붙일 수 없음
    #[error("겹침 탐색 실패: 신뢰도 {confidence:.4} < 하한 {floor:.4}")]
    StitchFailure {
        /// 최고 점수
        confidence: f64,
        /// 최소 신뢰도 하한
        floor: f64,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Profile")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 이미지 디코딩/인코딩 실패
    #[error("이미지 에러: {0}")]
    Image(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 유효성 검증 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 안정적인 사유 코드 (CLI 종료 메시지, 로그 필드용)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::Validation { .. } => "invalid_config",
            Self::NoDeviceFound(_) => "no_device_found",
            Self::MultipleDevices(_) => "multiple_devices",
            Self::DeviceNotOnline { .. } => "device_not_online",
            Self::AdbNotFound(_) => "adb_not_found",
            Self::CaptureFailure(_) => "capture_failure",
            Self::GestureFailure(_) => "gesture_failure",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::WidthMismatch { .. } => "width_mismatch",
            Self::OffsetOutOfRange { .. } => "offset_out_of_range",
            Self::StitchFailure { .. } => "stitch_failure",
            Self::NotFound { .. } => "not_found",
            Self::Image(_) => "image",
            Self::Io(_) => "io",
            Self::Internal(_) => "internal",
        }
    }

    /// 전송 계층(디바이스) 실패 여부
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::CaptureFailure(_) | Self::GestureFailure(_) | Self::AdbNotFound(_)
        )
    }
}

impl From<image::ImageError> for CoreError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = CoreError::WidthMismatch {
            expected: 450,
            actual: 384,
        };
        assert_eq!(err.code(), "width_mismatch");
        assert!(err.to_string().contains("450"));

        let err = CoreError::StitchFailure {
            confidence: 0.41,
            floor: 0.7,
        };
        assert_eq!(err.code(), "stitch_failure");

        let err = CoreError::OffsetOutOfRange {
            offset: 300,
            height: 260,
        };
        assert_eq!(err.code(), "offset_out_of_range");
    }

    #[test]
    fn multiple_devices_lists_serials() {
        let err = CoreError::MultipleDevices(vec!["a".into(), "b".into()]);
        assert!(err.to_string().contains("a, b"));
    }

    #[test]
    fn transport_failures() {
        assert!(CoreError::CaptureFailure("x".into()).is_transport_failure());
        assert!(CoreError::GestureFailure("x".into()).is_transport_failure());
        assert!(!CoreError::Internal("x".into()).is_transport_failure());
    }
}
