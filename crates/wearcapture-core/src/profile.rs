//! 캡처 프로필.
//!
//! 프로필은 [`CaptureConfig`]에 덮어쓸 값의 묶음이다.
//! 디바이스 모델/화면 크기로 적합한 프로필을 고르는 로직은
//! 캡처 루프와 분리된 순수 함수([`suggest_profile`])로 둔다.

use serde::{Deserialize, Serialize};

use crate::config::{CaptureConfig, SimilarityMetric};

/// 기본(폴백) 프로필 이름
pub const GENERIC_PROFILE: &str = "generic";

/// 화면 크기 일치 점수
const DISPLAY_MATCH_SCORE: u32 = 4;

/// 모델 패턴 일치 점수
const MODEL_MATCH_SCORE: u32 = 3;

/// 프로필 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileSource {
    #[default]
    Builtin,
    User,
}

impl ProfileSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::User => "user",
        }
    }
}

/// 프로필이 덮어쓰는 설정 값 (지정된 필드만 적용)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simple_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipe_x1: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipe_y1: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipe_x2: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipe_y2: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipe_duration_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_swipes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<SimilarityMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_region_top_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_region_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_motion_px: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_motion_similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_motion_consecutive: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_overlap_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_overlap_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlap_min_similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downscale_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circular_mask: Option<bool>,
}

impl ProfileOverrides {
    /// 현재 설정 전체를 덮어쓰기 값으로 변환 (프로필 저장용)
    ///
    /// 디바이스 시리얼은 프로필에 포함하지 않는다.
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            simple_mode: Some(config.simple_mode),
            swipe_x1: config.swipe_x1,
            swipe_y1: config.swipe_y1,
            swipe_x2: config.swipe_x2,
            swipe_y2: config.swipe_y2,
            swipe_duration_ms: Some(config.swipe_duration_ms),
            scroll_delay_ms: Some(config.scroll_delay_ms),
            max_swipes: Some(config.max_swipes),
            similarity_threshold: Some(config.similarity_threshold),
            metric: Some(config.metric),
            stop_region_top_ratio: Some(config.stop_region_top_ratio),
            stop_region_ratio: Some(config.stop_region_ratio),
            low_motion_px: Some(config.low_motion_px),
            low_motion_similarity: Some(config.low_motion_similarity),
            low_motion_consecutive: Some(config.low_motion_consecutive),
            min_overlap_ratio: Some(config.min_overlap_ratio),
            max_overlap_ratio: Some(config.max_overlap_ratio),
            overlap_min_similarity: Some(config.overlap_min_similarity),
            downscale_width: Some(config.downscale_width),
            circular_mask: Some(config.circular_mask),
        }
    }

    /// 지정된 필드만 설정에 덮어쓰기
    pub fn apply(&self, config: &mut CaptureConfig) {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field { config.$field = value; })*
            };
        }
        macro_rules! set_opt {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field { config.$field = Some(value); })*
            };
        }

        set!(
            simple_mode,
            swipe_duration_ms,
            scroll_delay_ms,
            max_swipes,
            similarity_threshold,
            metric,
            stop_region_top_ratio,
            stop_region_ratio,
            low_motion_px,
            low_motion_similarity,
            low_motion_consecutive,
            min_overlap_ratio,
            max_overlap_ratio,
            overlap_min_similarity,
            downscale_width,
            circular_mask,
        );
        set_opt!(swipe_x1, swipe_y1, swipe_x2, swipe_y2);
    }
}

/// 이름 붙은 캡처 프로필
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: ProfileOverrides,
    /// 디바이스 모델 glob 패턴 (예: `SM_R*`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_pattern: Option<String>,
    /// 대상 화면 크기 (width, height)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_size: Option<(u32, u32)>,
    #[serde(skip)]
    pub source: ProfileSource,
}

impl CaptureProfile {
    /// 디바이스 적합도 점수 (화면 크기 +4, 모델 패턴 +3)
    pub fn score(&self, device_model: Option<&str>, display_size: Option<(u32, u32)>) -> u32 {
        let mut score = 0;
        if let (Some(expected), Some(actual)) = (self.display_size, display_size) {
            if expected == actual {
                score += DISPLAY_MATCH_SCORE;
            }
        }
        if let (Some(pattern), Some(model)) = (self.model_pattern.as_deref(), device_model) {
            if matches_model_pattern(model, pattern) {
                score += MODEL_MATCH_SCORE;
            }
        }
        score
    }

    /// 기본 설정에 이 프로필을 적용한 결과
    pub fn resolve(&self, base: &CaptureConfig) -> CaptureConfig {
        let mut config = base.clone();
        self.config.apply(&mut config);
        config
    }

    pub fn is_generic(&self) -> bool {
        self.name.eq_ignore_ascii_case(GENERIC_PROFILE)
    }
}

/// 모델명이 glob 패턴과 일치하는지 (대소문자 무시, `*` / `?` 지원)
pub fn matches_model_pattern(model: &str, pattern: &str) -> bool {
    let text: Vec<char> = model.to_lowercase().chars().collect();
    let pat: Vec<char> = pattern.to_lowercase().chars().collect();

    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut star_text = 0usize;

    while t < text.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some(p);
            star_text = t;
            p += 1;
        } else if let Some(star_pos) = star {
            // 마지막 `*`가 한 글자 더 흡수하도록 되돌아감
            p = star_pos + 1;
            star_text += 1;
            t = star_text;
        } else {
            return false;
        }
    }

    pat[p..].iter().all(|c| *c == '*')
}

/// 내장 프로필
pub fn builtin_profiles() -> Vec<CaptureProfile> {
    let watch_defaults = ProfileOverrides {
        simple_mode: Some(true),
        scroll_delay_ms: Some(450),
        max_swipes: Some(24),
        similarity_threshold: Some(0.995),
        metric: Some(SimilarityMetric::Ssim),
        low_motion_px: Some(20),
        low_motion_similarity: Some(0.93),
        low_motion_consecutive: Some(2),
        ..Default::default()
    };

    vec![
        CaptureProfile {
            name: GENERIC_PROFILE.to_string(),
            description: "기본 균형 프로필".to_string(),
            config: watch_defaults.clone(),
            model_pattern: None,
            display_size: None,
            source: ProfileSource::Builtin,
        },
        CaptureProfile {
            name: "galaxy_watch_450".to_string(),
            description: "Galaxy Watch 450x450 튜닝 프로필".to_string(),
            config: watch_defaults.clone(),
            model_pattern: Some("SM_R*".to_string()),
            display_size: Some((450, 450)),
            source: ProfileSource::Builtin,
        },
        CaptureProfile {
            name: "pixel_watch_384".to_string(),
            description: "Pixel Watch 계열 384x384 프로필".to_string(),
            config: ProfileOverrides {
                scroll_delay_ms: Some(430),
                max_swipes: Some(22),
                similarity_threshold: Some(0.994),
                low_motion_px: Some(18),
                ..watch_defaults
            },
            model_pattern: None,
            display_size: Some((384, 384)),
            source: ProfileSource::Builtin,
        },
    ]
}

/// 디바이스에 가장 적합한 프로필 선택
///
/// 최고 점수가 0보다 크면 그 프로필(동점이면 generic이 아닌 쪽),
/// 아니면 generic, generic도 없으면 첫 프로필.
pub fn suggest_profile<'a>(
    device_model: Option<&str>,
    display_size: Option<(u32, u32)>,
    profiles: &'a [CaptureProfile],
) -> Option<&'a CaptureProfile> {
    let best = profiles
        .iter()
        .map(|profile| (profile.score(device_model, display_size), profile))
        .filter(|(score, _)| *score > 0)
        // max_by_key는 동점 시 마지막 요소를 돌려주므로 rev()로 입력 순서를 우선한다
        .rev()
        .max_by_key(|(score, profile)| (*score, !profile.is_generic()));

    if let Some((_, profile)) = best {
        return Some(profile);
    }

    profiles
        .iter()
        .find(|profile| profile.is_generic())
        .or_else(|| profiles.first())
}
