//! 유사도 엔진.
//!
//! 두 프레임을 그레이스케일로 다운스케일한 평면에서 비교한다.
//! 모든 점수는 0.0 ~ 1.0이며 `similarity(a, b) == similarity(b, a)`.
//! 누적은 f64, 원소별 연산은 교환 가능한 형태로만 구성한다.

use fast_image_resize::{images::Image as FirImage, PixelType, ResizeAlg, ResizeOptions, Resizer};
use tracing::trace;
use wearcapture_core::config::SimilarityMetric;
use wearcapture_core::error::CoreError;
use wearcapture_core::models::frame::{Frame, Region};

/// SSIM 안정화 상수 (K1 = 0.01, L = 255)
const SSIM_C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);

/// SSIM 안정화 상수 (K2 = 0.03, L = 255)
const SSIM_C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

/// 이동량 추정 시 남겨야 하는 최소 겹침 비율 (영역 높이 대비)
pub const MOTION_MIN_OVERLAP_RATIO: f64 = 0.25;

/// 이동량 추정 최소 겹침 행 수
const MOTION_MIN_OVERLAP_ROWS: u32 = 8;

/// 8비트 그레이스케일 평면 (행 우선)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayPlane {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GrayPlane {
    /// 원본 해상도 그레이스케일 (BT.601 가중치)
    pub fn full_resolution(frame: &Frame) -> Self {
        let (width, height) = frame.dimensions();
        let data = frame
            .as_raw()
            .chunks_exact(3)
            .map(|px| {
                let luma = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
                ((luma + 500) / 1000) as u8
            })
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// 너비 `target_width` 이하로 다운스케일한 그레이스케일 (bilinear)
    ///
    /// 프레임이 이미 충분히 작으면 원본 해상도를 그대로 쓴다.
    pub fn downscaled(frame: &Frame, target_width: u32) -> Result<Self, CoreError> {
        let full = Self::full_resolution(frame);
        if full.width <= target_width || target_width == 0 {
            return Ok(full);
        }

        let target_height =
            ((full.height as f64) * (target_width as f64) / (full.width as f64)).floor() as u32;
        let target_height = target_height.max(1);

        let src = FirImage::from_vec_u8(full.width, full.height, full.data, PixelType::U8)
            .map_err(|e| CoreError::Internal(format!("그레이스케일 평면 생성 실패: {e}")))?;
        let mut dst = FirImage::new(target_width, target_height, PixelType::U8);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
            fast_image_resize::FilterType::Bilinear,
        ));
        Resizer::new()
            .resize(&src, &mut dst, &options)
            .map_err(|e| CoreError::Internal(format!("다운스케일 실패: {e}")))?;

        Ok(Self {
            width: target_width,
            height: target_height,
            data: dst.into_vec(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `y`부터 `rows`행 연속 구간 (전체 너비)
    #[inline]
    pub fn rows(&self, y: u32, rows: u32) -> &[u8] {
        let stride = self.width as usize;
        let start = y as usize * stride;
        &self.data[start..start + rows as usize * stride]
    }

    /// 원본 좌표계 영역을 이 평면 좌표계로 변환 (경계 안으로 클램프)
    pub fn map_region(&self, region: &Region, source_height: u32) -> Region {
        let factor = (self.height as f64) / (source_height.max(1) as f64);
        let scaled = region.scaled(factor);
        let y = scaled.y.min(self.height - 1);
        let x = scaled.x.min(self.width - 1);
        Region {
            x,
            y,
            w: scaled.w.min(self.width - x),
            h: scaled.h.min(self.height - y),
        }
    }

    /// 영역 내 픽셀 복사 (행 우선)
    fn crop(&self, region: &Region) -> Vec<u8> {
        let mut out = Vec::with_capacity((region.w * region.h) as usize);
        for y in region.y..region.bottom() {
            let row = self.rows(y, 1);
            out.extend_from_slice(&row[region.x as usize..region.right() as usize]);
        }
        out
    }
}

/// 모션 추정 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEstimate {
    /// 추정 이동량 (원본 해상도 px)
    pub motion_px: u32,
    /// 해당 이동량에서의 정합 점수
    pub confidence: f64,
}

/// 픽셀 차이 점수: `1 − mean|a−b| / 255`
#[inline]
pub fn pixel_diff_score(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() {
        return 1.0;
    }
    let diff_sum: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    let mean = diff_sum as f64 / a.len() as f64;
    (1.0 - mean / 255.0).clamp(0.0, 1.0)
}

/// 전역 SSIM (단일 윈도우), 0.0 ~ 1.0으로 클램프
pub fn ssim_score(a: &[u8], b: &[u8]) -> f64 {
    if a.is_empty() {
        return 1.0;
    }
    let n = a.len() as f64;
    let mu_a = a.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mu_b = b.iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut cov = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let da = x as f64 - mu_a;
        let db = y as f64 - mu_b;
        var_a += da * da;
        var_b += db * db;
        cov += da * db;
    }
    var_a /= n;
    var_b /= n;
    cov /= n;

    let numerator = (2.0 * (mu_a * mu_b) + SSIM_C1) * (2.0 * cov + SSIM_C2);
    let denominator = (mu_a * mu_a + mu_b * mu_b + SSIM_C1) * (var_a + var_b + SSIM_C2);
    if denominator == 0.0 {
        return 1.0;
    }
    (numerator / denominator).clamp(0.0, 1.0)
}

/// 방식에 따른 점수
pub fn score(metric: SimilarityMetric, a: &[u8], b: &[u8]) -> f64 {
    match metric {
        SimilarityMetric::Ssim => ssim_score(a, b),
        SimilarityMetric::PixelDiff => pixel_diff_score(a, b),
    }
}

/// 두 프레임 크기가 같은지 확인
pub fn ensure_same_dimensions(a: &Frame, b: &Frame) -> Result<(), CoreError> {
    if a.dimensions() != b.dimensions() {
        return Err(CoreError::DimensionMismatch {
            expected: a.dimensions(),
            actual: b.dimensions(),
        });
    }
    Ok(())
}

/// 전체 프레임 유사도
pub fn similarity(
    a: &Frame,
    b: &Frame,
    metric: SimilarityMetric,
    downscale_width: u32,
) -> Result<f64, CoreError> {
    ensure_same_dimensions(a, b)?;
    if a.as_raw() == b.as_raw() {
        return Ok(1.0);
    }

    let pa = GrayPlane::downscaled(a, downscale_width)?;
    let pb = GrayPlane::downscaled(b, downscale_width)?;
    let value = score(metric, &pa.data, &pb.data);
    trace!(metric = metric.as_str(), value, "전체 유사도");
    Ok(value)
}

/// 영역 한정 유사도
pub fn region_similarity(
    a: &Frame,
    b: &Frame,
    region: &Region,
    metric: SimilarityMetric,
    downscale_width: u32,
) -> Result<f64, CoreError> {
    ensure_same_dimensions(a, b)?;
    ensure_region(region, a)?;
    if a.as_raw() == b.as_raw() {
        return Ok(1.0);
    }

    let pa = GrayPlane::downscaled(a, downscale_width)?;
    let pb = GrayPlane::downscaled(b, downscale_width)?;
    let mapped = pa.map_region(region, a.height());
    Ok(score(metric, &pa.crop(&mapped), &pb.crop(&mapped)))
}

/// 영역 내 수직 이동량 추정
///
/// `previous`의 영역을 `s`행 아래에서 시작하도록 잘라 `current` 영역의 위쪽과 겹쳐 비교하고
/// 가장 잘 맞는 `s`를 고른다 (동점이면 작은 값). 콘텐츠가 `s`행 위로 스크롤되었다는 뜻이다.
/// 겹치는 부분은 영역 높이의 [`MOTION_MIN_OVERLAP_RATIO`] 이상 남긴다.
pub fn motion_magnitude(
    previous: &Frame,
    current: &Frame,
    region: &Region,
    downscale_width: u32,
) -> Result<MotionEstimate, CoreError> {
    ensure_same_dimensions(previous, current)?;
    ensure_region(region, previous)?;
    if previous.as_raw() == current.as_raw() {
        return Ok(MotionEstimate {
            motion_px: 0,
            confidence: 1.0,
        });
    }

    let prev = GrayPlane::downscaled(previous, downscale_width)?;
    let curr = GrayPlane::downscaled(current, downscale_width)?;
    let area = prev.map_region(region, previous.height());

    let min_overlap = ((area.h as f64 * MOTION_MIN_OVERLAP_RATIO).ceil() as u32)
        .max(MOTION_MIN_OVERLAP_ROWS)
        .min(area.h);
    let max_shift = area.h - min_overlap;
    let mut best_shift = 0u32;
    let mut best_score = f64::MIN;
    for shift in 0..=max_shift {
        let rows = area.h - shift;
        let moved = prev.crop(&Region {
            y: area.y + shift,
            h: rows,
            ..area
        });
        let target = curr.crop(&Region { h: rows, ..area });
        let value = pixel_diff_score(&moved, &target);
        if value > best_score {
            best_score = value;
            best_shift = shift;
        }
    }

    let scale = previous.height() as f64 / prev.height() as f64;
    let motion_px = ((best_shift as f64) * scale).round() as u32;
    trace!(shift = best_shift, motion_px, confidence = best_score, "모션 추정");

    Ok(MotionEstimate {
        motion_px,
        confidence: best_score.clamp(0.0, 1.0),
    })
}

fn ensure_region(region: &Region, frame: &Frame) -> Result<(), CoreError> {
    if !region.fits_within(frame.width(), frame.height()) {
        return Err(CoreError::Internal(format!(
            "비교 영역이 프레임 밖에 있음: {:?} / {}x{}",
            region,
            frame.width(),
            frame.height()
        )));
    }
    Ok(())
}
