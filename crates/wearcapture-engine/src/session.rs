//! 캡처 루프 오케스트레이터.
//!
//! 한 번의 실행은 하나의 순차 루프다:
//! 판정 → 스와이프 → 대기 → 캡처 → 정지 신호 측정 → 겹침 탐색 → 캔버스 추가.
//! 반복 사이에는 파이프라이닝이 없다. 제어 플래그는 반복 경계에서만 판정에 반영되고,
//! 스와이프/대기/캡처 대기는 취소 요청으로 즉시 깨어난다.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbImage;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wearcapture_core::config::CaptureConfig;
use wearcapture_core::error::CoreError;
use wearcapture_core::models::capture::{
    CapturePhase, CaptureProgress, CaptureResult, PartialCapture, RunFailure, RunMetrics,
    StopReason,
};
use wearcapture_core::models::device::DeviceInfo;
use wearcapture_core::models::frame::{Frame, OverlapResult};
use wearcapture_core::ports::device::DeviceTransport;
use wearcapture_vision::canvas::StitchCanvas;
use wearcapture_vision::overlap::OverlapResolver;
use wearcapture_vision::termination::{
    Observation, StopSignals, StopThresholds, TerminationEvaluator, TerminationState,
};

use crate::control::{CaptureHandle, ControlSignals};
use crate::progress::ProgressSink;

/// 대기 중 어떤 요청이 대기를 깨우는지
#[derive(Debug, Clone, Copy)]
enum WakeOn {
    /// 취소만
    Cancel,
    /// 취소 또는 중단 후 저장
    AnyStop,
}

/// 캡처 실행 (한 번만 실행 가능)
pub struct CaptureSession {
    transport: Arc<dyn DeviceTransport>,
    config: CaptureConfig,
    device: DeviceInfo,
    handle: CaptureHandle,
    control: watch::Receiver<ControlSignals>,
    progress_tx: Option<mpsc::UnboundedSender<CaptureProgress>>,
    preview_max_side: Option<u32>,
}

impl CaptureSession {
    pub fn new(
        transport: Arc<dyn DeviceTransport>,
        config: CaptureConfig,
        device: DeviceInfo,
    ) -> Self {
        let (handle, control) = CaptureHandle::new();
        Self {
            transport,
            config,
            device,
            handle,
            control,
            progress_tx: None,
            preview_max_side: None,
        }
    }

    /// 진행 이벤트 채널 연결
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<CaptureProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// 진행 이벤트에 PNG 미리보기 포함 (긴 변 `max_side` 이하)
    pub fn with_preview(mut self, max_side: u32) -> Self {
        self.preview_max_side = Some(max_side);
        self
    }

    /// 제어 핸들 (실행 전후 언제든 사용 가능)
    pub fn handle(&self) -> CaptureHandle {
        self.handle.clone()
    }

    /// 별도 태스크에서 실행
    pub fn spawn(self) -> (CaptureHandle, JoinHandle<Result<CaptureResult, RunFailure>>) {
        let handle = self.handle();
        (handle, tokio::spawn(self.run()))
    }

    /// 종료 조건까지 실행
    ///
    /// 첫 프레임 이후의 치명적 실패는 누적된 캔버스를 [`RunFailure::partial`]로 함께 돌려준다.
    pub async fn run(mut self) -> Result<CaptureResult, RunFailure> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let device_id = self.device.id.clone();
        let progress = ProgressSink::new(self.progress_tx.take(), self.preview_max_side);
        let resolver = OverlapResolver::from_config(&self.config);
        let thresholds = StopThresholds::from_config(&self.config);
        let mut evaluator = TerminationEvaluator::new(thresholds);

        info!(
            %run_id,
            serial = %device_id,
            transport = self.transport.name(),
            max_swipes = self.config.max_swipes,
            "캡처 시작"
        );

        // 화면 크기를 알면 첫 캡처 전에 스와이프 좌표를 검증
        let planned = match self.device.display_size {
            Some(display) => Some(self.config.resolve_swipe(display)?),
            None => None,
        };

        let first = match self.interruptible(WakeOn::Cancel, self.capture(&device_id)).await {
            None => {
                // 캔버스가 없으므로 빈 이미지로 취소 종료
                let metrics = RunMetrics {
                    elapsed_ms: elapsed_ms(started),
                    ..Default::default()
                };
                self.handle.publish_metrics(&metrics);
                info!(%run_id, reason = StopReason::Cancelled.code(), "첫 프레임 전 취소");
                return Ok(CaptureResult {
                    run_id,
                    device_id,
                    image: RgbImage::new(0, 0),
                    stop_reason: StopReason::Cancelled,
                    metrics,
                });
            }
            Some(result) => result?,
        };
        let swipe = match planned {
            Some(spec) => spec,
            None => self.config.resolve_swipe(first.dimensions())?,
        };
        debug!(?swipe, "스와이프 좌표 결정");

        let mut canvas = StitchCanvas::seed(&first);
        let mut last_accepted = first;
        let mut metrics = RunMetrics {
            frames_captured: 1,
            canvas_height: canvas.total_height(),
            elapsed_ms: elapsed_ms(started),
            ..Default::default()
        };
        self.handle.publish_metrics(&metrics);
        progress.emit(
            CapturePhase::Initial,
            format!(
                "첫 프레임 {}x{}",
                last_accepted.width(),
                last_accepted.height()
            ),
            &metrics,
            Some(&canvas),
        );

        let mut signals: Option<StopSignals> = None;
        let stop_reason = loop {
            let control = *self.control.borrow();
            let state = evaluator.evaluate(&Observation {
                cancel_requested: control.cancel,
                stop_requested: control.stop_and_save,
                swipes_issued: metrics.swipes_issued,
                signals: signals.take(),
            });
            if let TerminationState::Stopped(reason) = state {
                break reason;
            }

            // 스와이프
            match self
                .interruptible(WakeOn::Cancel, self.transport.scroll(&device_id, &swipe))
                .await
            {
                None => continue,
                Some(Err(e)) => return Err(failure(e, &canvas, &metrics, started)),
                Some(Ok(())) => {}
            }
            metrics.swipes_issued += 1;
            metrics.elapsed_ms = elapsed_ms(started);
            self.handle.publish_metrics(&metrics);

            // 화면 안정화 대기
            let delay = tokio::time::sleep(Duration::from_millis(self.config.scroll_delay_ms));
            if self.interruptible(WakeOn::AnyStop, delay).await.is_none() {
                continue;
            }

            // 캡처
            let current = match self.interruptible(WakeOn::Cancel, self.capture(&device_id)).await {
                None => continue,
                Some(Err(e)) => return Err(failure(e, &canvas, &metrics, started)),
                Some(Ok(frame)) => frame,
            };
            metrics.frames_captured += 1;

            if current.dimensions() != last_accepted.dimensions() {
                let error = CoreError::DimensionMismatch {
                    expected: last_accepted.dimensions(),
                    actual: current.dimensions(),
                };
                return Err(failure(error, &canvas, &metrics, started));
            }

            let measured = match StopSignals::measure(&last_accepted, &current, &self.config) {
                Ok(s) => s,
                Err(e) => return Err(failure(e, &canvas, &metrics, started)),
            };

            let low_motion = measured.is_low_motion(&thresholds);
            let rows_added = if low_motion && measured.motion_px == 0 {
                // 스크롤 정체: 새 행 없음, 기준 프레임 유지
                let hold = OverlapResult {
                    offset: 0,
                    confidence: measured.motion_confidence,
                    matched: true,
                };
                match canvas.append(&current, &hold) {
                    Ok(rows) => rows,
                    Err(e) => return Err(failure(e, &canvas, &metrics, started)),
                }
            } else {
                let mut window = resolver.window_for(last_accepted.height());
                if low_motion {
                    // 작은 이동도 잃지 않도록 겹침 상한을 프레임 끝까지 연다
                    window.max_overlap = last_accepted.height().saturating_sub(1);
                }
                let overlap = match resolver.resolve_within(&last_accepted, &current, window) {
                    Ok(overlap) => overlap,
                    Err(e) => return Err(failure(e, &canvas, &metrics, started)),
                };
                metrics.last_overlap_confidence = Some(overlap.confidence);
                if !overlap.matched {
                    warn!(
                        confidence = overlap.confidence,
                        floor = resolver.min_confidence,
                        "겹침 탐색 실패"
                    );
                    let error = CoreError::StitchFailure {
                        confidence: overlap.confidence,
                        floor: resolver.min_confidence,
                    };
                    return Err(failure(error, &canvas, &metrics, started));
                }
                let rows = match canvas.append(&current, &overlap) {
                    Ok(rows) => rows,
                    Err(e) => return Err(failure(e, &canvas, &metrics, started)),
                };
                last_accepted = current;
                rows
            };

            metrics.last_similarity = Some(measured.full_similarity);
            metrics.last_motion_px = Some(measured.motion_px);
            metrics.canvas_height = canvas.total_height();
            metrics.elapsed_ms = elapsed_ms(started);
            self.handle.publish_metrics(&metrics);

            debug!(
                swipe = metrics.swipes_issued,
                similarity = measured.full_similarity,
                region_similarity = measured.region_similarity,
                motion_px = measured.motion_px,
                rows_added,
                canvas_height = metrics.canvas_height,
                "반복 완료"
            );
            progress.emit(
                CapturePhase::Iteration,
                format!(
                    "스와이프 {}/{} · +{}행 · 높이 {}",
                    metrics.swipes_issued, self.config.max_swipes, rows_added, metrics.canvas_height
                ),
                &metrics,
                Some(&canvas),
            );
            signals = Some(measured);
        };

        metrics.elapsed_ms = elapsed_ms(started);
        self.handle.publish_metrics(&metrics);
        progress.emit(
            CapturePhase::Stopping,
            format!("종료: {stop_reason}"),
            &metrics,
            None,
        );

        let image = match canvas.snapshot() {
            Ok(image) => image,
            Err(e) => return Err(failure(e, &canvas, &metrics, started)),
        };
        info!(
            %run_id,
            reason = stop_reason.code(),
            frames = metrics.frames_captured,
            swipes = metrics.swipes_issued,
            width = image.width(),
            height = image.height(),
            elapsed_ms = metrics.elapsed_ms,
            "캡처 완료"
        );
        progress.emit(
            CapturePhase::Complete,
            format!("{}x{}", image.width(), image.height()),
            &metrics,
            Some(&canvas),
        );

        Ok(CaptureResult {
            run_id,
            device_id,
            image,
            stop_reason,
            metrics,
        })
    }

    async fn capture(&self, device_id: &str) -> Result<Frame, CoreError> {
        self.transport.capture_frame(device_id).await
    }

    /// 제어 요청이 오면 `None`을 돌려주고 진행 중인 퓨처를 드롭한다
    async fn interruptible<F: Future>(&self, wake: WakeOn, fut: F) -> Option<F::Output> {
        let mut control = self.control.clone();
        let woken = async move {
            let woke = control
                .wait_for(|s| match wake {
                    WakeOn::Cancel => s.cancel,
                    WakeOn::AnyStop => s.cancel || s.stop_and_save,
                })
                .await
                .is_ok();
            if !woke {
                // 송신자가 사라지면 깨울 주체도 없다
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            biased;
            _ = woken => {
                debug!(?wake, "제어 요청으로 대기 중단");
                None
            }
            out = fut => Some(out),
        }
    }
}

/// 실패 + 누적 캔버스
fn failure(
    error: CoreError,
    canvas: &StitchCanvas,
    metrics: &RunMetrics,
    started: Instant,
) -> RunFailure {
    let mut metrics = metrics.clone();
    metrics.elapsed_ms = elapsed_ms(started);
    metrics.canvas_height = canvas.total_height();
    warn!(code = error.code(), "캡처 실패: {error}");

    let partial = match canvas.snapshot() {
        Ok(image) => Some(PartialCapture { image, metrics }),
        Err(e) => {
            warn!("부분 결과 스냅샷 실패: {e}");
            None
        }
    };
    RunFailure { error, partial }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// 편의 함수: 세션을 만들어 별도 태스크에서 실행
pub fn start_capture(
    transport: Arc<dyn DeviceTransport>,
    config: CaptureConfig,
    device: DeviceInfo,
) -> (CaptureHandle, JoinHandle<Result<CaptureResult, RunFailure>>) {
    CaptureSession::new(transport, config, device).spawn()
}

