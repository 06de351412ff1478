//! 종료 판정.
//!
//! 반복마다 한 번 호출되어 계속 진행 여부를 결정하는 상태 기계.
//! `Running`에서 시작하며, 한 번 `Stopped`가 되면 이후 입력과 무관하게 유지된다.
//!
//! 우선순위 (먼저 일치한 규칙 적용):
//! 1. 취소 요청 → `Cancelled`
//! 2. 중단 후 저장 요청 → `UserRequested`
//! 3. 스와이프 수 ≥ 최대 → `SwipeBudgetExhausted`
//! 4. 전역 유사도 ≥ 임계값 AND 영역 유사도 ≥ 저모션 유사도 AND 이동량 ≤ 저모션 px
//!    → `ContentExhausted`
//! 5. 저모션 반복이 연속 N회 → `NoMotion`

use tracing::{debug, info};
use wearcapture_core::config::CaptureConfig;
use wearcapture_core::error::CoreError;
use wearcapture_core::models::capture::StopReason;
use wearcapture_core::models::frame::{Frame, Region};

use crate::similarity::{motion_magnitude, region_similarity, similarity};

/// 한 반복에서 측정한 정지 신호
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopSignals {
    /// 직전 두 프레임 전역 유사도
    pub full_similarity: f64,
    /// 정지 판정 영역 유사도
    pub region_similarity: f64,
    /// 프레임 전체 겹침으로 추정한 이동량 (px)
    pub motion_px: u32,
    /// 이동량 추정 정합 점수
    pub motion_confidence: f64,
}

impl StopSignals {
    /// 직전 프레임과 새 프레임 사이의 정지 신호 측정
    pub fn measure(
        previous: &Frame,
        current: &Frame,
        config: &CaptureConfig,
    ) -> Result<Self, CoreError> {
        let region = stop_region(previous, config);
        let full_similarity =
            similarity(previous, current, config.metric, config.downscale_width)?;
        let region_sim = region_similarity(
            previous,
            current,
            &region,
            config.metric,
            config.downscale_width,
        )?;
        // 가운데 띠가 비어 있어도 스크롤은 위아래 내용으로 드러난다
        let whole = Region::full(previous.width(), previous.height());
        let motion = motion_magnitude(previous, current, &whole, config.downscale_width)?;

        Ok(Self {
            full_similarity,
            region_similarity: region_sim,
            motion_px: motion.motion_px,
            motion_confidence: motion.confidence,
        })
    }

    /// 저모션 반복 여부 (이동량 작고 정합 점수 충분)
    pub fn is_low_motion(&self, thresholds: &StopThresholds) -> bool {
        self.motion_px <= thresholds.low_motion_px
            && self.motion_confidence >= thresholds.low_motion_similarity
    }

    /// 콘텐츠 소진 조건
    pub fn is_content_exhausted(&self, thresholds: &StopThresholds) -> bool {
        self.full_similarity >= thresholds.similarity_threshold
            && self.region_similarity >= thresholds.low_motion_similarity
            && self.motion_px <= thresholds.low_motion_px
    }
}

/// 정지 판정 영역 (프레임 전체 너비의 가로 띠)
pub fn stop_region(frame: &Frame, config: &CaptureConfig) -> Region {
    Region::horizontal_band(
        frame.width(),
        frame.height(),
        config.stop_region_top_ratio,
        config.stop_region_ratio,
    )
}

/// 종료 판정 임계값
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopThresholds {
    pub max_swipes: u32,
    pub similarity_threshold: f64,
    pub low_motion_px: u32,
    pub low_motion_similarity: f64,
    pub low_motion_consecutive: u32,
}

impl StopThresholds {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            max_swipes: config.max_swipes,
            similarity_threshold: config.similarity_threshold,
            low_motion_px: config.low_motion_px,
            low_motion_similarity: config.low_motion_similarity,
            low_motion_consecutive: config.low_motion_consecutive,
        }
    }
}

/// 판정 입력 (반복 경계에서 관찰한 값)
#[derive(Debug, Clone, Copy, Default)]
pub struct Observation {
    pub cancel_requested: bool,
    pub stop_requested: bool,
    pub swipes_issued: u32,
    /// 직전 반복의 정지 신호 (첫 반복에는 없음)
    pub signals: Option<StopSignals>,
}

/// 판정 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationState {
    Running,
    Stopped(StopReason),
}

impl TerminationState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Running => None,
            Self::Stopped(reason) => Some(*reason),
        }
    }
}

/// 종료 판정기
#[derive(Debug, Clone)]
pub struct TerminationEvaluator {
    thresholds: StopThresholds,
    low_motion_streak: u32,
    state: TerminationState,
}

impl TerminationEvaluator {
    pub fn new(thresholds: StopThresholds) -> Self {
        Self {
            thresholds,
            low_motion_streak: 0,
            state: TerminationState::Running,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(StopThresholds::from_config(config))
    }

    pub fn state(&self) -> TerminationState {
        self.state
    }

    /// 현재 연속 저모션 횟수
    pub fn low_motion_streak(&self) -> u32 {
        self.low_motion_streak
    }

    /// 반복 하나를 판정하고 새 상태 반환
    pub fn evaluate(&mut self, observation: &Observation) -> TerminationState {
        if let TerminationState::Stopped(_) = self.state {
            return self.state;
        }

        if let Some(signals) = &observation.signals {
            if signals.is_low_motion(&self.thresholds) {
                self.low_motion_streak += 1;
            } else {
                self.low_motion_streak = 0;
            }
        }

        let next = self.classify(observation);
        if let TerminationState::Stopped(reason) = next {
            info!(
                reason = reason.code(),
                swipes = observation.swipes_issued,
                streak = self.low_motion_streak,
                "캡처 종료 판정"
            );
        } else if let Some(signals) = &observation.signals {
            debug!(
                similarity = signals.full_similarity,
                region_similarity = signals.region_similarity,
                motion_px = signals.motion_px,
                streak = self.low_motion_streak,
                "계속 진행"
            );
        }
        self.state = next;
        next
    }

    fn classify(&self, observation: &Observation) -> TerminationState {
        let t = &self.thresholds;
        if observation.cancel_requested {
            return TerminationState::Stopped(StopReason::Cancelled);
        }
        if observation.stop_requested {
            return TerminationState::Stopped(StopReason::UserRequested);
        }
        if observation.swipes_issued >= t.max_swipes {
            return TerminationState::Stopped(StopReason::SwipeBudgetExhausted);
        }
        if let Some(signals) = &observation.signals {
            if signals.is_content_exhausted(t) {
                return TerminationState::Stopped(StopReason::ContentExhausted);
            }
            if self.low_motion_streak >= t.low_motion_consecutive {
                return TerminationState::Stopped(StopReason::NoMotion);
            }
        }
        TerminationState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn thresholds() -> StopThresholds {
        StopThresholds::from_config(&CaptureConfig {
            max_swipes: 5,
            ..Default::default()
        })
    }

    fn moving() -> StopSignals {
        StopSignals {
            full_similarity: 0.6,
            region_similarity: 0.5,
            motion_px: 80,
            motion_confidence: 0.99,
        }
    }

    fn still() -> StopSignals {
        StopSignals {
            full_similarity: 1.0,
            region_similarity: 1.0,
            motion_px: 0,
            motion_confidence: 1.0,
        }
    }

    fn stalled() -> StopSignals {
        // 시계 등 일부가 바뀌어 전역 유사도는 낮지만 스크롤은 멈춤
        StopSignals {
            full_similarity: 0.97,
            region_similarity: 0.98,
            motion_px: 3,
            motion_confidence: 0.97,
        }
    }

    fn observe(swipes: u32, signals: Option<StopSignals>) -> Observation {
        Observation {
            swipes_issued: swipes,
            signals,
            ..Default::default()
        }
    }

    #[test]
    fn first_iteration_runs() {
        let mut evaluator = TerminationEvaluator::new(thresholds());
        assert_eq!(evaluator.evaluate(&observe(0, None)), TerminationState::Running);
    }

    #[test]
    fn cancel_beats_everything() {
        let mut evaluator = TerminationEvaluator::new(thresholds());
        let observation = Observation {
            cancel_requested: true,
            stop_requested: true,
            swipes_issued: 99,
            signals: Some(still()),
        };
        assert_eq!(
            evaluator.evaluate(&observation),
            TerminationState::Stopped(StopReason::Cancelled)
        );
    }

    #[test]
    fn stop_and_save_beats_budget() {
        let mut evaluator = TerminationEvaluator::new(thresholds());
        let observation = Observation {
            stop_requested: true,
            swipes_issued: 5,
            ..Default::default()
        };
        assert_eq!(
            evaluator.evaluate(&observation).stop_reason(),
            Some(StopReason::UserRequested)
        );
    }

    #[test]
    fn budget_beats_content_signals() {
        let mut evaluator = TerminationEvaluator::new(thresholds());
        assert_eq!(
            evaluator.evaluate(&observe(5, Some(still()))).stop_reason(),
            Some(StopReason::SwipeBudgetExhausted)
        );
    }

    #[test]
    fn still_frames_exhaust_content() {
        let mut evaluator = TerminationEvaluator::new(thresholds());
        assert!(evaluator.evaluate(&observe(1, Some(moving()))).is_running());
        assert_eq!(
            evaluator.evaluate(&observe(2, Some(still()))).stop_reason(),
            Some(StopReason::ContentExhausted)
        );
    }

    #[test]
    fn high_similarity_with_motion_keeps_running() {
        // 여백이 많은 화면: 전역 유사도는 높지만 실제로는 스크롤됨
        let mut evaluator = TerminationEvaluator::new(thresholds());
        let sparse = StopSignals {
            full_similarity: 0.998,
            region_similarity: 0.999,
            motion_px: 60,
            motion_confidence: 0.99,
        };
        assert!(evaluator.evaluate(&observe(1, Some(sparse))).is_running());
    }

    #[test]
    fn low_motion_streak_stops_with_no_motion() {
        let mut evaluator = TerminationEvaluator::new(thresholds());
        assert!(evaluator.evaluate(&observe(1, Some(stalled()))).is_running());
        assert_eq!(evaluator.low_motion_streak(), 1);
        assert_eq!(
            evaluator.evaluate(&observe(2, Some(stalled()))).stop_reason(),
            Some(StopReason::NoMotion)
        );
    }

    #[test]
    fn motion_resets_streak() {
        let mut evaluator = TerminationEvaluator::new(thresholds());
        evaluator.evaluate(&observe(1, Some(stalled())));
        evaluator.evaluate(&observe(2, Some(moving())));
        assert_eq!(evaluator.low_motion_streak(), 0);
        assert!(evaluator.evaluate(&observe(3, Some(stalled()))).is_running());
    }

    #[test]
    fn stopped_state_is_absorbing() {
        let mut evaluator = TerminationEvaluator::new(thresholds());
        evaluator.evaluate(&observe(5, None));
        let later = Observation {
            cancel_requested: true,
            ..Default::default()
        };
        assert_eq!(
            evaluator.evaluate(&later).stop_reason(),
            Some(StopReason::SwipeBudgetExhausted)
        );
    }

    #[test]
    fn measure_identical_frames() {
        let frame = Frame::new(RgbImage::from_fn(120, 160, |x, y| {
            Rgb([(x * 2) as u8, (y * 3) as u8, ((x + y) % 256) as u8])
        }));
        let config = CaptureConfig::default();
        let signals = StopSignals::measure(&frame, &frame.clone(), &config).unwrap();
        assert_eq!(signals, still());
        assert!(signals.is_content_exhausted(&StopThresholds::from_config(&config)));
    }

    #[test]
    fn measure_sparse_scroll_is_not_low_motion() {
        // 정지 판정 띠(40~60%)는 비어 있고 위아래만 내용이 있는 목록
        let sparse = |shift: u32| {
            Frame::new(RgbImage::from_fn(240, 200, |x, y| {
                let yy = y + shift;
                if (60..200).contains(&yy) {
                    Rgb([0, 0, 0])
                } else {
                    Rgb([(x * 5 + yy * 3) as u8, (yy * 7) as u8, (x ^ yy) as u8])
                }
            }))
        };
        let config = CaptureConfig::default();
        let thresholds = StopThresholds::from_config(&config);

        let signals = StopSignals::measure(&sparse(0), &sparse(30), &config).unwrap();
        assert_eq!(signals.region_similarity, 1.0);
        assert_eq!(signals.motion_px, 30);
        assert!(!signals.is_low_motion(&thresholds));
        assert!(!signals.is_content_exhausted(&thresholds));
    }
}
