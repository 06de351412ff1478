//! 프레임(스크린샷) 모델.
//!
//! 디바이스에서 받은 원본 캡처, 비교 영역, 겹침 탐색 결과를 정의한다.

use std::sync::Arc;

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

/// 한 번의 화면 캡처 (RGB8, 불변)
///
/// 내부 버퍼는 `Arc`로 공유되므로 복제 비용이 작다.
/// 생성 이후에는 어떤 경로로도 픽셀을 수정할 수 없다.
#[derive(Debug, Clone)]
pub struct Frame {
    image: Arc<RgbImage>,
}

impl Frame {
    /// RGB 이미지로 프레임 생성
    pub fn new(image: RgbImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// 임의 포맷 이미지를 RGB8로 변환하여 프레임 생성
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::new(image.to_rgb8())
    }

    /// 너비 (픽셀)
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// 높이 (픽셀)
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// 읽기 전용 이미지 참조
    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }

    /// 원시 RGB 바이트 (행 우선)
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// 직사각형 영역 (비교/모션 추정 대상)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    /// 프레임 전체 영역
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width,
            h: height,
        }
    }

    /// 전체 너비의 가로 띠 영역.
    ///
    /// `top_ratio`, `height_ratio`는 프레임 높이 대비 비율. 최소 1행.
    pub fn horizontal_band(width: u32, height: u32, top_ratio: f64, height_ratio: f64) -> Self {
        let y = ((height as f64) * top_ratio).floor() as u32;
        let y = y.min(height.saturating_sub(1));
        let h = ((height as f64) * height_ratio).round() as u32;
        let h = h.clamp(1, height - y);
        Self { x: 0, y, w: width, h }
    }

    /// 영역 하단 경계 (배타적)
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    /// 영역 우측 경계 (배타적)
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    /// 주어진 크기 안에 완전히 들어가는지
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.w > 0 && self.h > 0 && self.right() <= width && self.bottom() <= height
    }

    /// 좌표를 `factor`배 축소 (다운스케일된 평면에서의 영역)
    pub fn scaled(&self, factor: f64) -> Self {
        let x = ((self.x as f64) * factor).floor() as u32;
        let y = ((self.y as f64) * factor).floor() as u32;
        let w = (((self.w as f64) * factor).round() as u32).max(1);
        let h = (((self.h as f64) * factor).round() as u32).max(1);
        Self { x, y, w, h }
    }
}

/// 겹침 탐색 결과
///
/// `offset`은 직전 프레임 대비 콘텐츠가 위로 이동한 행 수(= 새로 드러난 행 수)이다.
/// 두 프레임이 공유하는 띠는 `height - offset` 행.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlapResult {
    /// 수직 이동량 (픽셀 행)
    pub offset: u32,
    /// 최고 유사도 점수 (0.0 ~ 1.0)
    pub confidence: f64,
    /// 최소 신뢰도 하한 통과 여부
    pub matched: bool,
}

impl OverlapResult {
    /// 높이 `height` 프레임 기준 겹치는 행 수
    pub fn overlap_rows(&self, height: u32) -> u32 {
        height.saturating_sub(self.offset)
    }
}
