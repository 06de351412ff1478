//! # wearcapture-device
//!
//! [`DeviceTransport`](wearcapture_core::ports::device::DeviceTransport) 포트의
//! ADB 구현. `adb` 바이너리를 `tokio::process`로 실행한다.

pub mod adb;
pub mod parse;

pub use adb::AdbTransport;
