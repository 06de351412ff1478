//! 이어붙이기 캔버스.
//!
//! 첫 프레임으로 너비가 고정되는 추가 전용 RGB 버퍼.
//! 기존 행은 절대 다시 쓰지 않으며, 스냅샷은 항상 복사본이다.

use image::RgbImage;
use tracing::debug;
use wearcapture_core::error::CoreError;
use wearcapture_core::models::frame::{Frame, OverlapResult};

/// RGB8 채널 수
const CHANNELS: usize = 3;

/// 추가 전용 합성 캔버스
#[derive(Debug, Clone)]
pub struct StitchCanvas {
    width: u32,
    total_height: u32,
    frame_count: u32,
    /// 각 프레임이 적용된 뒤의 캔버스 하단 행 (진단/테스트용)
    boundaries: Vec<u32>,
    buffer: Vec<u8>,
}

impl StitchCanvas {
    /// 첫 프레임으로 캔버스 생성 (너비/높이 기준 설정)
    pub fn seed(frame: &Frame) -> Self {
        let (width, height) = frame.dimensions();
        debug!("캔버스 시작: {width}x{height}");
        Self {
            width,
            total_height: height,
            frame_count: 1,
            boundaries: vec![height],
            buffer: frame.as_raw().to_vec(),
        }
    }

    /// 프레임의 새 영역(하단 `overlap.offset`행)만 캔버스 아래에 붙인다
    ///
    /// 반환값은 추가된 행 수 (0 ~ frame.height).
    /// 실패 시 캔버스는 변하지 않는다.
    pub fn append(&mut self, frame: &Frame, overlap: &OverlapResult) -> Result<u32, CoreError> {
        if frame.width() != self.width {
            return Err(CoreError::WidthMismatch {
                expected: self.width,
                actual: frame.width(),
            });
        }
        if !overlap.matched {
            return Err(CoreError::Internal(format!(
                "일치하지 않은 겹침 결과는 추가할 수 없음 (신뢰도 {:.4})",
                overlap.confidence
            )));
        }

        if overlap.offset > frame.height() {
            return Err(CoreError::OffsetOutOfRange {
                offset: overlap.offset,
                height: frame.height(),
            });
        }

        let rows = overlap.offset;
        let stride = self.width as usize * CHANNELS;
        let start = (frame.height() - rows) as usize * stride;
        self.buffer.extend_from_slice(&frame.as_raw()[start..]);

        self.total_height += rows;
        self.frame_count += 1;
        self.boundaries.push(self.total_height);
        debug!(
            rows_added = rows,
            canvas_height = self.total_height,
            "캔버스 추가"
        );
        Ok(rows)
    }

    /// 현재 내용의 복사본
    pub fn snapshot(&self) -> Result<RgbImage, CoreError> {
        RgbImage::from_raw(self.width, self.total_height, self.buffer.clone())
            .ok_or_else(|| CoreError::Internal("캔버스 버퍼 크기 불일치".to_string()))
    }

    /// 캔버스를 소비하여 최종 이미지로 변환
    pub fn into_image(self) -> Result<RgbImage, CoreError> {
        RgbImage::from_raw(self.width, self.total_height, self.buffer)
            .ok_or_else(|| CoreError::Internal("캔버스 버퍼 크기 불일치".to_string()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn total_height(&self) -> u32 {
        self.total_height
    }

    /// 적용된 프레임 수 (시작 프레임 포함)
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn boundaries(&self) -> &[u32] {
        &self.boundaries
    }
}
