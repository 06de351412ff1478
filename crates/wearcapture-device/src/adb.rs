//! ADB 전송 어댑터.
//!
//! `adb` 바이너리를 자식 프로세스로 실행한다.
//! 명령마다 타임아웃을 걸고, 퓨처가 드롭되면 프로세스도 종료된다
//! (캡처 취소 시 대기 중인 screencap이 남지 않도록).

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};
use wearcapture_core::config::AdbConfig;
use wearcapture_core::error::CoreError;
use wearcapture_core::models::device::{DeviceInfo, SwipeSpec};
use wearcapture_core::models::frame::Frame;
use wearcapture_core::ports::device::DeviceTransport;

use crate::parse::{parse_devices, parse_wm_size, png_candidates};

/// 명령 실행 실패 유형 (호출 맥락에 따라 CoreError로 변환)
#[derive(Debug)]
enum RunError {
    /// 바이너리 없음
    NotFound(String),
    /// 0이 아닌 종료 코드, 타임아웃, 기타 I/O
    Failed(String),
}

/// adb 기반 디바이스 전송
#[derive(Debug, Clone)]
pub struct AdbTransport {
    adb_path: String,
    timeout: Duration,
}

impl AdbTransport {
    pub fn new(adb_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            adb_path: adb_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &AdbConfig) -> Self {
        Self::new(
            config.path.clone(),
            Duration::from_secs(config.command_timeout_secs.max(1)),
        )
    }

    /// adb 실행 가능 여부 (`adb version`)
    ///
    /// 바이너리는 있으나 version이 실패하는 경우도 사용 가능으로 본다.
    pub async fn is_available(&self) -> bool {
        !matches!(self.run(None, &["version"]).await, Err(RunError::NotFound(_)))
    }

    /// 화면 크기 조회 (`wm size`), 파싱 불가 시 None
    pub async fn display_size(&self, serial: &str) -> Result<Option<(u32, u32)>, CoreError> {
        let stdout = self
            .run(Some(serial), &["shell", "wm", "size"])
            .await
            .map_err(|e| Self::map_error(e, CoreError::CaptureFailure))?;
        Ok(parse_wm_size(&String::from_utf8_lossy(&stdout)))
    }

    async fn run(&self, serial: Option<&str>, args: &[&str]) -> Result<Vec<u8>, RunError> {
        let mut command = Command::new(&self.adb_path);
        if let Some(serial) = serial {
            command.args(["-s", serial]);
        }
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(adb = %self.adb_path, ?serial, ?args, "adb 실행");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(RunError::Failed(format!(
                    "adb {} 타임아웃 ({}초)",
                    args.join(" "),
                    self.timeout.as_secs()
                )))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RunError::NotFound(format!(
                    "'{}' 없음. adb를 설치하고 PATH에 추가하세요",
                    self.adb_path
                )))
            }
            Ok(Err(e)) => return Err(RunError::Failed(format!("adb 실행 실패: {e}"))),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RunError::Failed(format!(
                "adb {} 실패 ({}): {}",
                args.join(" "),
                output.status,
                stderr
            )));
        }
        Ok(output.stdout)
    }

    fn map_error(error: RunError, failure: fn(String) -> CoreError) -> CoreError {
        match error {
            RunError::NotFound(message) => CoreError::AdbNotFound(message),
            RunError::Failed(message) => failure(message),
        }
    }
}

#[async_trait]
impl DeviceTransport for AdbTransport {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, CoreError> {
        let stdout = self
            .run(None, &["devices", "-l"])
            .await
            .map_err(|e| Self::map_error(e, CoreError::CaptureFailure))?;
        let mut devices = parse_devices(&String::from_utf8_lossy(&stdout));

        for device in devices.iter_mut().filter(|d| d.is_online()) {
            match self.display_size(&device.id).await {
                Ok(size) => device.display_size = size,
                Err(e) => warn!(serial = %device.id, "화면 크기 조회 실패: {e}"),
            }
        }

        debug!("디바이스 {}개 발견", devices.len());
        Ok(devices)
    }

    async fn capture_frame(&self, device_id: &str) -> Result<Frame, CoreError> {
        let raw = self
            .run(Some(device_id), &["exec-out", "screencap", "-p"])
            .await
            .map_err(|e| Self::map_error(e, CoreError::CaptureFailure))?;
        if raw.is_empty() {
            return Err(CoreError::CaptureFailure(
                "adb에서 빈 스크린샷 데이터를 받음".to_string(),
            ));
        }

        let mut last_error = None;
        for payload in png_candidates(&raw) {
            match image::load_from_memory(&payload) {
                Ok(image) => {
                    let frame = Frame::from_dynamic(image);
                    debug!(
                        serial = device_id,
                        width = frame.width(),
                        height = frame.height(),
                        "스크린샷 수신"
                    );
                    return Ok(frame);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(CoreError::CaptureFailure(format!(
            "스크린샷 디코딩 실패 ({} bytes): {}",
            raw.len(),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn scroll(&self, device_id: &str, gesture: &SwipeSpec) -> Result<(), CoreError> {
        let coords = [
            gesture.x1.to_string(),
            gesture.y1.to_string(),
            gesture.x2.to_string(),
            gesture.y2.to_string(),
            gesture.duration_ms.to_string(),
        ];
        let mut args = vec!["shell", "input", "swipe"];
        args.extend(coords.iter().map(String::as_str));

        self.run(Some(device_id), &args)
            .await
            .map_err(|e| Self::map_error(e, CoreError::GestureFailure))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "adb"
    }
}
