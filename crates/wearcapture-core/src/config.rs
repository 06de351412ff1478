//! 애플리케이션 설정 구조체.
//!
//! [`CaptureConfig`]는 한 번의 캡처 실행에 필요한 모든 파라미터를 담는다.
//! 실행이 시작된 뒤에는 읽기 전용이며, 검증은 디바이스 I/O 이전에 끝난다.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::device::SwipeSpec;

/// 간단 모드 스와이프 시작 Y 비율
pub const SIMPLE_SWIPE_START_RATIO: f64 = 0.78;

/// 간단 모드 스와이프 끝 Y 비율
pub const SIMPLE_SWIPE_END_RATIO: f64 = 0.24;

/// 전역 유사도 계산 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// 전역 SSIM (0~1로 클램프)
    #[default]
    Ssim,
    /// 1 − 평균 절대 차이 / 255
    PixelDiff,
}

impl SimilarityMetric {
    /// 문자열 파싱 (`ssim`, `pixel_diff`, `pixeldiff`)
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ssim" => Ok(Self::Ssim),
            "pixel_diff" | "pixeldiff" | "pixel-diff" => Ok(Self::PixelDiff),
            other => Err(CoreError::validation(
                "metric",
                format!("알 수 없는 유사도 방식: {other}"),
            )),
        }
    }

    /// 직렬화 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssim => "ssim",
            Self::PixelDiff => "pixel_diff",
        }
    }
}

/// 캡처 실행 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 대상 디바이스 시리얼 (없으면 자동 선택)
    pub serial: Option<String>,
    /// 간단 모드 (화면 크기에서 스와이프 좌표 유도)
    pub simple_mode: bool,
    /// 고급 모드 스와이프 좌표
    pub swipe_x1: Option<u32>,
    pub swipe_y1: Option<u32>,
    pub swipe_x2: Option<u32>,
    pub swipe_y2: Option<u32>,
    /// 스와이프 지속 시간 (ms)
    pub swipe_duration_ms: u32,
    /// 스와이프 후 다음 캡처까지 대기 (ms)
    pub scroll_delay_ms: u64,
    /// 최대 스와이프 횟수
    pub max_swipes: u32,
    /// 콘텐츠 소진 판정용 전역 유사도 임계값
    pub similarity_threshold: f64,
    /// 전역 유사도 계산 방식
    pub metric: SimilarityMetric,
    /// 정지 판정 영역 상단 (프레임 높이 비율)
    pub stop_region_top_ratio: f64,
    /// 정지 판정 영역 높이 (프레임 높이 비율)
    pub stop_region_ratio: f64,
    /// 저모션 판정 이동량 상한 (px)
    pub low_motion_px: u32,
    /// 저모션 판정 영역 유사도 하한
    pub low_motion_similarity: f64,
    /// 연속 저모션 횟수
    pub low_motion_consecutive: u32,
    /// 최소 겹침 비율
    pub min_overlap_ratio: f64,
    /// 최대 겹침 비율
    pub max_overlap_ratio: f64,
    /// 겹침 탐색 최소 신뢰도 (이어붙이기 정확성 하한)
    pub overlap_min_similarity: f64,
    /// 비교용 다운스케일 너비
    pub downscale_width: u32,
    /// 내보내기 시 원형 마스크 적용
    pub circular_mask: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            serial: None,
            simple_mode: true,
            swipe_x1: None,
            swipe_y1: None,
            swipe_x2: None,
            swipe_y2: None,
            swipe_duration_ms: 300,
            scroll_delay_ms: 500,
            max_swipes: 30,
            similarity_threshold: 0.995,
            metric: SimilarityMetric::Ssim,
            stop_region_top_ratio: 0.40,
            stop_region_ratio: 0.20,
            low_motion_px: 20,
            low_motion_similarity: 0.93,
            low_motion_consecutive: 2,
            min_overlap_ratio: 0.08,
            max_overlap_ratio: 0.92,
            overlap_min_similarity: 0.70,
            downscale_width: 320,
            circular_mask: false,
        }
    }
}

impl CaptureConfig {
    /// 디바이스와 무관한 필드 검증
    ///
    /// 실패 시 어떤 캡처도 시작하지 않는다.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_swipes < 1 {
            return Err(CoreError::validation("max_swipes", "1 이상이어야 합니다"));
        }
        unit_interval("similarity_threshold", self.similarity_threshold)?;
        unit_interval("low_motion_similarity", self.low_motion_similarity)?;
        unit_interval("overlap_min_similarity", self.overlap_min_similarity)?;

        if self.low_motion_px > 200 {
            return Err(CoreError::validation(
                "low_motion_px",
                "0~200 범위여야 합니다",
            ));
        }
        if self.low_motion_consecutive < 1 {
            return Err(CoreError::validation(
                "low_motion_consecutive",
                "1 이상이어야 합니다",
            ));
        }
        if !(self.stop_region_ratio > 0.0 && self.stop_region_ratio < 1.0) {
            return Err(CoreError::validation(
                "stop_region_ratio",
                "(0, 1) 범위여야 합니다",
            ));
        }
        if !(self.stop_region_top_ratio >= 0.0
            && self.stop_region_top_ratio + self.stop_region_ratio <= 1.0)
        {
            return Err(CoreError::validation(
                "stop_region_top_ratio",
                "정지 판정 영역이 프레임 밖으로 나갑니다",
            ));
        }
        if !(self.min_overlap_ratio > 0.0
            && self.min_overlap_ratio < self.max_overlap_ratio
            && self.max_overlap_ratio < 1.0)
        {
            return Err(CoreError::validation(
                "min_overlap_ratio",
                "0 < min_overlap_ratio < max_overlap_ratio < 1 이어야 합니다",
            ));
        }
        if self.downscale_width < 64 {
            return Err(CoreError::validation(
                "downscale_width",
                "64 이상이어야 합니다",
            ));
        }
        if self.swipe_duration_ms < 1 {
            return Err(CoreError::validation(
                "swipe_duration_ms",
                "1 이상이어야 합니다",
            ));
        }
        Ok(())
    }

    /// 화면 크기 기준 스와이프 좌표 결정 및 검증
    ///
    /// 간단 모드는 화면 크기에서 좌표를 유도한다.
    /// 고급 모드는 지정 좌표를 쓰되, 빠진 좌표는 간단 모드 값으로 채운다.
    pub fn resolve_swipe(&self, display: (u32, u32)) -> Result<SwipeSpec, CoreError> {
        let (width, height) = display;
        if width == 0 || height == 0 {
            return Err(CoreError::validation(
                "display",
                format!("화면 크기가 비어 있습니다: {width}x{height}"),
            ));
        }

        let simple = SwipeSpec {
            x1: width / 2,
            y1: ((height as f64) * SIMPLE_SWIPE_START_RATIO).round() as u32,
            x2: width / 2,
            y2: ((height as f64) * SIMPLE_SWIPE_END_RATIO).round() as u32,
            duration_ms: self.swipe_duration_ms,
        };
        if self.simple_mode {
            return Ok(simple);
        }

        let spec = SwipeSpec {
            x1: self.swipe_x1.unwrap_or(simple.x1),
            y1: self.swipe_y1.unwrap_or(simple.y1),
            x2: self.swipe_x2.unwrap_or(simple.x2),
            y2: self.swipe_y2.unwrap_or(simple.y2),
            duration_ms: self.swipe_duration_ms,
        };

        for (field, value, bound) in [
            ("swipe_x1", spec.x1, width),
            ("swipe_y1", spec.y1, height),
            ("swipe_x2", spec.x2, width),
            ("swipe_y2", spec.y2, height),
        ] {
            if value >= bound {
                return Err(CoreError::validation(
                    field,
                    format!("좌표 {value} 가 화면 범위(0..{bound})를 벗어납니다"),
                ));
            }
        }
        if spec.x1 == spec.x2 && spec.y1 == spec.y2 {
            return Err(CoreError::validation(
                "swipe",
                "시작점과 끝점이 같습니다",
            ));
        }
        Ok(spec)
    }
}

fn unit_interval(field: &str, value: f64) -> Result<(), CoreError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(CoreError::validation(field, "(0, 1] 범위여야 합니다"))
    }
}

/// ADB 실행 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdbConfig {
    /// adb 실행 파일 경로 (PATH 탐색 시 "adb")
    pub path: String,
    /// 명령당 타임아웃 (초)
    pub command_timeout_secs: u64,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            path: "adb".to_string(),
            command_timeout_secs: 20,
        }
    }
}

/// 미리보기 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// 진행 이벤트에 미리보기 PNG 포함 여부
    pub enabled: bool,
    /// 미리보기 최대 변 길이 (px)
    pub max_side: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_side: 240,
        }
    }
}

/// 전체 애플리케이션 설정
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub adb: AdbConfig,
    /// 기본 캡처 파라미터
    pub capture: CaptureConfig,
    pub preview: PreviewConfig,
    /// 사용자 프로필 저장 경로 (없으면 설정 디렉토리의 profiles.json)
    pub profiles_path: Option<PathBuf>,
    /// 결과 이미지 기본 저장 디렉토리
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_swipes, 30);
        assert_eq!(config.metric, SimilarityMetric::Ssim);
        assert!((config.similarity_threshold - 0.995).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let cases: Vec<(&str, Box<dyn Fn(&mut CaptureConfig)>)> = vec![
            ("max_swipes", Box::new(|c| c.max_swipes = 0)),
            ("similarity_threshold", Box::new(|c| c.similarity_threshold = 0.0)),
            ("similarity_threshold", Box::new(|c| c.similarity_threshold = 1.2)),
            ("low_motion_similarity", Box::new(|c| c.low_motion_similarity = -0.1)),
            ("overlap_min_similarity", Box::new(|c| c.overlap_min_similarity = 1.01)),
            ("low_motion_px", Box::new(|c| c.low_motion_px = 201)),
            ("low_motion_consecutive", Box::new(|c| c.low_motion_consecutive = 0)),
            ("stop_region_ratio", Box::new(|c| c.stop_region_ratio = 1.0)),
            ("stop_region_top_ratio", Box::new(|c| c.stop_region_top_ratio = 0.9)),
            ("min_overlap_ratio", Box::new(|c| c.min_overlap_ratio = 0.95)),
            ("downscale_width", Box::new(|c| c.downscale_width = 32)),
            ("swipe_duration_ms", Box::new(|c| c.swipe_duration_ms = 0)),
        ];

        for (expected_field, mutate) in cases {
            let mut config = CaptureConfig::default();
            mutate(&mut config);
            match config.validate() {
                Err(CoreError::Validation { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("{expected_field}: 검증 실패 기대, 실제 {other:?}"),
            }
        }
    }

    #[test]
    fn simple_swipe_geometry() {
        let config = CaptureConfig::default();
        let swipe = config.resolve_swipe((450, 450)).unwrap();
        assert_eq!(swipe.x1, 225);
        assert_eq!(swipe.x2, 225);
        assert_eq!(swipe.y1, 351);
        assert_eq!(swipe.y2, 108);
        assert_eq!(swipe.duration_ms, 300);
    }

    #[test]
    fn advanced_swipe_fills_missing_and_checks_bounds() {
        let config = CaptureConfig {
            simple_mode: false,
            swipe_y1: Some(400),
            ..Default::default()
        };
        let swipe = config.resolve_swipe((450, 450)).unwrap();
        assert_eq!(swipe.y1, 400);
        assert_eq!(swipe.y2, 108);

        let config = CaptureConfig {
            simple_mode: false,
            swipe_x1: Some(500),
            ..Default::default()
        };
        let err = config.resolve_swipe((450, 450)).unwrap_err();
        assert_eq!(err.code(), "invalid_config");
    }

    #[test]
    fn advanced_swipe_rejects_degenerate_gesture() {
        let config = CaptureConfig {
            simple_mode: false,
            swipe_x1: Some(100),
            swipe_y1: Some(100),
            swipe_x2: Some(100),
            swipe_y2: Some(100),
            ..Default::default()
        };
        assert!(config.resolve_swipe((450, 450)).is_err());
    }

    #[test]
    fn metric_parse() {
        assert_eq!(SimilarityMetric::parse("SSIM").unwrap(), SimilarityMetric::Ssim);
        assert_eq!(
            SimilarityMetric::parse("pixel_diff").unwrap(),
            SimilarityMetric::PixelDiff
        );
        assert!(SimilarityMetric::parse("mse").is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: CaptureConfig = serde_json::from_str(r#"{"max_swipes": 5}"#).unwrap();
        assert_eq!(config.max_swipes, 5);
        assert_eq!(config.downscale_width, 320);
    }
}
