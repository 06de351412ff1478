//! 대상 디바이스 선택.

use tracing::debug;
use wearcapture_core::error::CoreError;
use wearcapture_core::models::device::DeviceInfo;
use wearcapture_core::ports::device::DeviceTransport;

/// 디바이스 목록에서 대상 선택
///
/// 시리얼이 지정되면 그 디바이스가 온라인이어야 하고,
/// 지정되지 않으면 온라인 디바이스가 정확히 하나여야 한다.
pub fn select_device(
    devices: &[DeviceInfo],
    preferred: Option<&str>,
) -> Result<DeviceInfo, CoreError> {
    let online: Vec<&DeviceInfo> = devices.iter().filter(|d| d.is_online()).collect();

    if let Some(serial) = preferred {
        return online
            .iter()
            .find(|d| d.id == serial)
            .map(|d| (*d).clone())
            .ok_or_else(|| CoreError::DeviceNotOnline {
                serial: serial.to_string(),
                online: if online.is_empty() {
                    "없음".to_string()
                } else {
                    online
                        .iter()
                        .map(|d| d.id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                },
            });
    }

    match online.as_slice() {
        [] => Err(CoreError::NoDeviceFound(
            "USB 디버깅을 켜고 디바이스를 연결하세요".to_string(),
        )),
        [only] => {
            debug!(serial = %only.id, "디바이스 자동 선택");
            Ok((*only).clone())
        }
        many => Err(CoreError::MultipleDevices(
            many.iter().map(|d| d.id.clone()).collect(),
        )),
    }
}

/// 전송 계층에서 목록을 받아 대상 선택
pub async fn resolve_device(
    transport: &dyn DeviceTransport,
    preferred: Option<&str>,
) -> Result<DeviceInfo, CoreError> {
    let devices = transport.list_devices().await?;
    select_device(&devices, preferred)
}
