//! 캡처 실행 결과 모델.
//!
//! 실행 지표, 종료 사유, 최종/부분 결과, 진행 이벤트.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// 실행 중 갱신되는 지표
///
/// 오케스트레이터만 갱신하며, 외부에는 복제본으로만 노출된다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// 캡처한 프레임 수 (첫 프레임 포함)
    pub frames_captured: u32,
    /// 발행한 스와이프 수
    pub swipes_issued: u32,
    /// 경과 시간 (ms)
    pub elapsed_ms: u64,
    /// 직전 두 프레임의 전역 유사도
    pub last_similarity: Option<f64>,
    /// 직전 모션 추정량 (px)
    pub last_motion_px: Option<u32>,
    /// 직전 겹침 탐색 신뢰도
    pub last_overlap_confidence: Option<f64>,
    /// 현재 캔버스 높이
    pub canvas_height: u32,
}

/// 종료 사유 (실행당 정확히 하나)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// 콘텐츠 끝 도달
    ContentExhausted,
    /// 연속 저모션 (스크롤 정체/바운스)
    NoMotion,
    /// 최대 스와이프 도달
    SwipeBudgetExhausted,
    /// 사용자 중단 후 저장
    UserRequested,
    /// 취소
    Cancelled,
}

impl StopReason {
    /// 안정적인 사유 코드
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContentExhausted => "content_exhausted",
            Self::NoMotion => "no_motion",
            Self::SwipeBudgetExhausted => "swipe_budget_exhausted",
            Self::UserRequested => "user_requested",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// 정상 종료된 캡처 결과
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// 실행 식별자
    pub run_id: Uuid,
    /// 대상 디바이스 시리얼
    pub device_id: String,
    /// 마스크 미적용 합성 이미지 (첫 프레임 전에 취소되면 0x0)
    pub image: RgbImage,
    pub stop_reason: StopReason,
    pub metrics: RunMetrics,
}

/// 실패 시점까지 누적된 부분 결과
#[derive(Debug, Clone)]
pub struct PartialCapture {
    pub image: RgbImage,
    pub metrics: RunMetrics,
}

/// 실행 실패 (누적된 캔버스가 있으면 함께 반환)
#[derive(Debug)]
pub struct RunFailure {
    pub error: CoreError,
    pub partial: Option<PartialCapture>,
}

impl RunFailure {
    /// 부분 결과 없는 실패 (첫 프레임 이전)
    pub fn bare(error: CoreError) -> Self {
        Self {
            error,
            partial: None,
        }
    }

    /// 사유 코드
    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<CoreError> for RunFailure {
    fn from(error: CoreError) -> Self {
        Self::bare(error)
    }
}

/// 진행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    /// 첫 프레임 수신
    Initial,
    /// 반복 완료
    Iteration,
    /// 종료 판정됨
    Stopping,
    /// 결과 생성 완료
    Complete,
}

/// 진행 이벤트
#[derive(Debug, Clone)]
pub struct CaptureProgress {
    pub phase: CapturePhase,
    pub message: String,
    pub metrics: RunMetrics,
    /// 현재 캔버스 미리보기 (PNG)
    pub preview_png: Option<Vec<u8>>,
}
