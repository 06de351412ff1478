//! 진행 이벤트 송신.

use tokio::sync::mpsc;
use tracing::warn;
use wearcapture_core::models::capture::{CapturePhase, CaptureProgress, RunMetrics};
use wearcapture_vision::canvas::StitchCanvas;
use wearcapture_vision::thumbnail::preview_png;

/// 진행 이벤트 송신기
///
/// 수신자가 없거나 닫혀도 캡처는 계속된다.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<CaptureProgress>>,
    /// 미리보기 최대 변 길이 (None이면 미리보기 생략)
    preview_max_side: Option<u32>,
}

impl ProgressSink {
    pub(crate) fn new(
        tx: Option<mpsc::UnboundedSender<CaptureProgress>>,
        preview_max_side: Option<u32>,
    ) -> Self {
        Self {
            tx,
            preview_max_side,
        }
    }

    pub(crate) fn emit(
        &self,
        phase: CapturePhase,
        message: impl Into<String>,
        metrics: &RunMetrics,
        canvas: Option<&StitchCanvas>,
    ) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.is_closed() {
            return;
        }

        let preview_png = match (self.preview_max_side, canvas) {
            (Some(max_side), Some(canvas)) => canvas
                .snapshot()
                .and_then(|image| preview_png(&image, max_side))
                .map_err(|e| warn!("미리보기 생성 실패: {e}"))
                .ok(),
            _ => None,
        };

        let _ = tx.send(CaptureProgress {
            phase,
            message: message.into(),
            metrics: metrics.clone(),
            preview_png,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use wearcapture_core::models::frame::Frame;

    #[test]
    fn emits_with_preview() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ProgressSink::new(Some(tx), Some(32));
        let canvas = StitchCanvas::seed(&Frame::new(RgbImage::from_pixel(64, 128, Rgb([5, 5, 5]))));

        sink.emit(
            CapturePhase::Initial,
            "첫 프레임",
            &RunMetrics::default(),
            Some(&canvas),
        );

        let event = rx.try_recv().unwrap();
        assert_eq!(event.phase, CapturePhase::Initial);
        let png = event.preview_png.unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 32));
    }

    #[test]
    fn closed_receiver_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = ProgressSink::new(Some(tx), None);
        sink.emit(CapturePhase::Complete, "끝", &RunMetrics::default(), None);
        ProgressSink::default().emit(CapturePhase::Complete, "끝", &RunMetrics::default(), None);
    }
}
