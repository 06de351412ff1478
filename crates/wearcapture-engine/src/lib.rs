//! # wearcapture-engine
//!
//! 하나의 캡처 실행을 구동하는 순차 루프.
//! 디바이스 포트([`DeviceTransport`](wearcapture_core::ports::device::DeviceTransport))와
//! 비전 크레이트를 엮고, 외부에는 제어 핸들과 진행 이벤트 채널만 노출한다.

pub mod control;
pub mod device_select;
mod progress;
pub mod session;

pub use control::{CaptureHandle, ControlSignals};
pub use device_select::{resolve_device, select_device};
pub use session::{start_capture, CaptureSession};
