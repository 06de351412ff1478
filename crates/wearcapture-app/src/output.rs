//! 결과 파일 경로와 요약 출력.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use wearcapture_core::models::capture::{CaptureResult, RunMetrics};
use wearcapture_core::models::device::DeviceInfo;

/// 기본 출력 파일명 접두사
const FILE_PREFIX: &str = "wearcapture";

/// 기본 출력 경로 (`<dir>/wearcapture_YYYYmmdd_HHMMSS.png`)
pub fn default_output_path<Tz: TimeZone>(dir: Option<&Path>, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let file_name = format!("{FILE_PREFIX}_{}.png", now.format("%Y%m%d_%H%M%S"));
    match dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// 확장자가 없으면 `.png` 추가
pub fn normalize_output(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("png")
    }
}

/// 실패 시 부분 결과 경로 (`<stem>_partial.png`)
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| FILE_PREFIX.to_string());
    output.with_file_name(format!("{stem}_partial.png"))
}

/// 캡처 완료 요약
pub fn format_summary(device: &DeviceInfo, result: &CaptureResult, path: &Path) -> String {
    let mut lines = vec![
        format!("디바이스   : {}", describe_device(device)),
        format!("종료 사유  : {}", result.stop_reason),
    ];
    lines.extend(metric_lines(&result.metrics));
    lines.push(format!(
        "이미지     : {}x{}",
        result.image.width(),
        result.image.height()
    ));
    lines.push(format!("저장 위치  : {}", path.display()));
    lines.join("\n")
}

/// 실행 지표 요약 줄
pub fn metric_lines(metrics: &RunMetrics) -> Vec<String> {
    let mut lines = vec![
        format!("프레임     : {}", metrics.frames_captured),
        format!("스와이프   : {}", metrics.swipes_issued),
        format!("소요 시간  : {:.1}s", metrics.elapsed_ms as f64 / 1000.0),
    ];
    if let Some(confidence) = metrics.last_overlap_confidence {
        lines.push(format!("마지막 정합: {confidence:.4}"));
    }
    lines
}

pub fn describe_device(device: &DeviceInfo) -> String {
    let mut text = device.id.clone();
    if let Some(model) = &device.model {
        text.push_str(&format!(" ({model})"));
    }
    if let Some((w, h)) = device.display_size {
        text.push_str(&format!(" {w}x{h}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use image::RgbImage;
    use wearcapture_core::models::capture::StopReason;

    fn device() -> DeviceInfo {
        DeviceInfo {
            id: "R3CT70".into(),
            state: "device".into(),
            model: Some("SM_R910".into()),
            display_size: Some((450, 450)),
        }
    }

    #[test]
    fn default_path_uses_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            default_output_path(Some(Path::new("/tmp/out")), &now),
            PathBuf::from("/tmp/out/wearcapture_20260304_050607.png")
        );
        assert_eq!(
            default_output_path(None, &now),
            PathBuf::from("wearcapture_20260304_050607.png")
        );
    }

    #[test]
    fn partial_path_sits_next_to_output() {
        assert_eq!(
            partial_path(Path::new("/shots/settings.png")),
            PathBuf::from("/shots/settings_partial.png")
        );
        assert_eq!(
            normalize_output(PathBuf::from("shots/list")),
            PathBuf::from("shots/list.png")
        );
        assert_eq!(
            normalize_output(PathBuf::from("a.PNG")),
            PathBuf::from("a.PNG")
        );
    }

    #[test]
    fn summary_lists_key_facts() {
        let result = CaptureResult {
            run_id: uuid_like(),
            device_id: "R3CT70".into(),
            image: RgbImage::new(450, 1210),
            stop_reason: StopReason::ContentExhausted,
            metrics: RunMetrics {
                frames_captured: 6,
                swipes_issued: 5,
                elapsed_ms: 4200,
                ..Default::default()
            },
        };
        let summary = format_summary(&device(), &result, Path::new("out.png"));
        assert!(summary.contains("R3CT70 (SM_R910) 450x450"));
        assert!(summary.contains("content_exhausted"));
        assert!(summary.contains("450x1210"));
        assert!(summary.contains("프레임     : 6"));
        assert!(summary.contains("4.2s"));
        assert!(summary.contains("out.png"));
    }

    fn uuid_like() -> wearcapture_core::Uuid {
        wearcapture_core::Uuid::nil()
    }
}
