//! 실행 제어 핸들.
//!
//! 캡처 루프 밖(UI, 시그널 핸들러)에서 취소/중단 후 저장을 요청하고
//! 실시간 지표를 읽는다. 모든 요청은 멱등이며, 실행이 끝난 뒤에는 아무 효과가 없다.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::info;
use wearcapture_core::models::capture::RunMetrics;

/// 외부 제어 플래그
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlSignals {
    pub cancel: bool,
    pub stop_and_save: bool,
}

/// 캡처 실행 제어 핸들 (복제 가능)
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    signals: Arc<watch::Sender<ControlSignals>>,
    metrics: Arc<RwLock<RunMetrics>>,
}

impl CaptureHandle {
    pub(crate) fn new() -> (Self, watch::Receiver<ControlSignals>) {
        let (tx, rx) = watch::channel(ControlSignals::default());
        let handle = Self {
            signals: Arc::new(tx),
            metrics: Arc::new(RwLock::new(RunMetrics::default())),
        };
        (handle, rx)
    }

    /// 취소 요청 (추가 스와이프 없이 즉시 종료)
    pub fn request_cancel(&self) {
        self.signals.send_if_modified(|s| {
            if s.cancel {
                return false;
            }
            info!("취소 요청");
            s.cancel = true;
            true
        });
    }

    /// 중단 후 저장 요청 (현재 캔버스 유지)
    pub fn request_stop_and_save(&self) {
        self.signals.send_if_modified(|s| {
            if s.stop_and_save {
                return false;
            }
            info!("중단 후 저장 요청");
            s.stop_and_save = true;
            true
        });
    }

    /// 현재 제어 플래그
    pub fn signals(&self) -> ControlSignals {
        *self.signals.borrow()
    }

    /// 실시간 지표 스냅샷 (복제본)
    pub fn current_metrics(&self) -> RunMetrics {
        self.metrics.read().clone()
    }

    pub(crate) fn publish_metrics(&self, metrics: &RunMetrics) {
        *self.metrics.write() = metrics.clone();
    }
}
