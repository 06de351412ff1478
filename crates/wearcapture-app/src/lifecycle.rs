//! 시그널 핸들링.
//!
//! 캡처 중 첫 번째 인터럽트는 중단 후 저장, 두 번째 인터럽트나 SIGTERM은 취소로 처리한다.

use tokio::task::JoinHandle;
use tracing::{info, warn};
use wearcapture_engine::CaptureHandle;

/// 인터럽트에 대한 대응
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    StopAndSave,
    Cancel,
}

impl Escalation {
    /// `presses`번째 인터럽트 (1부터)
    pub fn for_press(presses: u32) -> Self {
        if presses <= 1 {
            Self::StopAndSave
        } else {
            Self::Cancel
        }
    }

    pub fn apply(self, handle: &CaptureHandle) {
        match self {
            Self::StopAndSave => {
                eprintln!("\n⏹  현재까지 캡처한 내용을 저장하고 종료합니다 (한 번 더 누르면 취소)");
                handle.request_stop_and_save();
            }
            Self::Cancel => {
                eprintln!("\n✖  캡처를 취소합니다");
                handle.request_cancel();
            }
        }
    }
}

/// 캡처 실행 동안 시그널을 제어 요청으로 바꾸는 리스너
///
/// 드롭되면 리스너 태스크도 중단된다.
pub struct InterruptListener {
    task: JoinHandle<()>,
}

impl InterruptListener {
    pub fn spawn(handle: CaptureHandle) -> Self {
        Self {
            task: tokio::spawn(listen(handle)),
        }
    }
}

impl Drop for InterruptListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(unix)]
async fn listen(handle: CaptureHandle) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            warn!("시그널 핸들러 등록 실패: {e}");
            return;
        }
    };

    let mut presses = 0u32;
    loop {
        let escalation = tokio::select! {
            _ = sigint.recv() => {
                presses += 1;
                info!(presses, "SIGINT 수신");
                Escalation::for_press(presses)
            }
            _ = sigterm.recv() => {
                info!("SIGTERM 수신");
                Escalation::Cancel
            }
        };
        escalation.apply(&handle);
        if escalation == Escalation::Cancel {
            return;
        }
    }
}

#[cfg(not(unix))]
async fn listen(handle: CaptureHandle) {
    let mut presses = 0u32;
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl+C 핸들러 등록 실패: {e}");
            return;
        }
        presses += 1;
        info!(presses, "Ctrl+C 수신");
        let escalation = Escalation::for_press(presses);
        escalation.apply(&handle);
        if escalation == Escalation::Cancel {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_press_escalates_to_cancel() {
        assert_eq!(Escalation::for_press(1), Escalation::StopAndSave);
        assert_eq!(Escalation::for_press(2), Escalation::Cancel);
        assert_eq!(Escalation::for_press(7), Escalation::Cancel);
    }
}
