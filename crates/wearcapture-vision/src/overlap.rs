//! 겹침 탐색.
//!
//! 직전 프레임의 하단과 새 프레임의 상단이 가장 잘 맞는 위치를 찾는다.
//! 다운스케일 평면에서 거친 탐색 후, 원본 해상도에서 주변만 정밀 탐색한다.
//! 점수는 항상 픽셀 차이 방식이다.

use tracing::debug;
use wearcapture_core::config::CaptureConfig;
use wearcapture_core::error::CoreError;
use wearcapture_core::models::frame::{Frame, OverlapResult};

use crate::similarity::{ensure_same_dimensions, pixel_diff_score, GrayPlane};

/// 최고 점수와 이 차이 이내면 동점으로 본다
pub const TIE_EPSILON: f64 = 1e-4;

/// 최소 겹침 행 수 하한
const MIN_OVERLAP_ROWS: u32 = 8;

/// 거친 탐색 간격 분모 (`step = max(1, h / 220)`)
const COARSE_STEP_DIVISOR: u32 = 220;

/// 겹침 행 수 탐색 범위 (원본 해상도, 양끝 포함)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub min_overlap: u32,
    pub max_overlap: u32,
}

impl SearchWindow {
    /// 프레임 높이와 비율로 탐색 범위 계산
    ///
    /// `[max(8, min_ratio·h), min(h−1, max_ratio·h)]`
    pub fn for_height(height: u32, min_ratio: f64, max_ratio: f64) -> Self {
        let max_overlap = (((height as f64) * max_ratio).floor() as u32).min(height.saturating_sub(1));
        let min_overlap = (((height as f64) * min_ratio).floor() as u32)
            .max(MIN_OVERLAP_ROWS)
            .min(max_overlap);
        Self {
            min_overlap,
            max_overlap,
        }
    }
}

/// 겹침 탐색기 (상태 없음)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapResolver {
    pub min_overlap_ratio: f64,
    pub max_overlap_ratio: f64,
    /// 이 점수 미만이면 `matched = false`
    pub min_confidence: f64,
    pub downscale_width: u32,
}

impl OverlapResolver {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            min_overlap_ratio: config.min_overlap_ratio,
            max_overlap_ratio: config.max_overlap_ratio,
            min_confidence: config.overlap_min_similarity,
            downscale_width: config.downscale_width,
        }
    }

    /// 프레임 높이 기준 기본 탐색 범위
    pub fn window_for(&self, height: u32) -> SearchWindow {
        SearchWindow::for_height(height, self.min_overlap_ratio, self.max_overlap_ratio)
    }

    /// 설정된 비율의 탐색 범위로 겹침 탐색
    pub fn resolve(&self, previous: &Frame, candidate: &Frame) -> Result<OverlapResult, CoreError> {
        let window = self.window_for(previous.height());
        self.resolve_within(previous, candidate, window)
    }

    /// 지정된 탐색 범위로 겹침 탐색
    pub fn resolve_within(
        &self,
        previous: &Frame,
        candidate: &Frame,
        window: SearchWindow,
    ) -> Result<OverlapResult, CoreError> {
        ensure_same_dimensions(previous, candidate)?;
        let height = previous.height();
        if window.max_overlap == 0 || window.min_overlap > window.max_overlap {
            return Ok(OverlapResult {
                offset: 0,
                confidence: 0.0,
                matched: false,
            });
        }

        // 1단계: 다운스케일 평면에서 거친 탐색
        let prev_small = GrayPlane::downscaled(previous, self.downscale_width)?;
        let cand_small = GrayPlane::downscaled(candidate, self.downscale_width)?;
        let small_h = prev_small.height();
        let scale = height as f64 / small_h as f64;
        let step = (small_h / COARSE_STEP_DIVISOR).max(1);

        let coarse_min = ((window.min_overlap as f64 / scale).ceil() as u32).clamp(1, small_h);
        let coarse_max = ((window.max_overlap as f64 / scale).floor() as u32)
            .clamp(coarse_min, small_h.saturating_sub(1).max(coarse_min));
        let coarse = best_overlap(
            &prev_small,
            &cand_small,
            (coarse_min..=coarse_max).step_by(step as usize),
        );

        let exact = scale == 1.0 && step == 1;
        let (overlap_rows, confidence) = if exact {
            coarse
        } else {
            // 2단계: 원본 해상도에서 거친 결과 주변만 정밀 탐색
            let prev_full = GrayPlane::full_resolution(previous);
            let cand_full = GrayPlane::full_resolution(candidate);
            let center = ((coarse.0 as f64) * scale).round() as u32;
            let radius = ((scale * step as f64).ceil() as u32) + 1;
            let lo = center.saturating_sub(radius).max(window.min_overlap);
            let hi = (center + radius).min(window.max_overlap);
            if lo > hi {
                (center.clamp(window.min_overlap, window.max_overlap), coarse.1)
            } else {
                best_overlap(&prev_full, &cand_full, lo..=hi)
            }
        };

        let result = OverlapResult {
            offset: height.saturating_sub(overlap_rows),
            confidence,
            matched: confidence >= self.min_confidence,
        };
        debug!(
            offset = result.offset,
            overlap_rows,
            confidence,
            matched = result.matched,
            "겹침 탐색 완료"
        );
        Ok(result)
    }
}

/// 후보 겹침 행 수 중 최고 점수 선택
///
/// 최고 점수에서 [`TIE_EPSILON`] 이내인 후보 중 가장 작은 겹침
/// (= 가장 큰 이동량)을 고른다.
fn best_overlap(
    previous: &GrayPlane,
    candidate: &GrayPlane,
    overlaps: impl Iterator<Item = u32>,
) -> (u32, f64) {
    let h = previous.height();
    let scores: Vec<(u32, f64)> = overlaps
        .filter(|&ov| ov >= 1 && ov <= h)
        .map(|ov| {
            let bottom = previous.rows(h - ov, ov);
            let top = candidate.rows(0, ov);
            (ov, pixel_diff_score(bottom, top))
        })
        .collect();

    let max_score = scores
        .iter()
        .map(|&(_, s)| s)
        .fold(f64::MIN, f64::max);

    scores
        .into_iter()
        .filter(|&(_, s)| s >= max_score - TIE_EPSILON)
        .min_by_key(|&(ov, _)| ov)
        .map(|(ov, _)| (ov, max_score))
        .unwrap_or((h, 0.0))
}
