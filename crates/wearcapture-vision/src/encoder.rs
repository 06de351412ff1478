//! PNG 인코딩/디코딩.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::debug;
use wearcapture_core::error::CoreError;

use crate::export::prepare_export;

/// 이미지를 PNG 바이트로 인코딩
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CoreError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    let bytes = buffer.into_inner();
    debug!(
        "PNG 인코딩: {}x{} → {} bytes",
        image.width(),
        image.height(),
        bytes.len()
    );
    Ok(bytes)
}

/// PNG(또는 image가 인식하는 포맷) 바이트를 RGB로 디코딩
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, CoreError> {
    let image = image::load_from_memory(bytes)?;
    Ok(image.to_rgb8())
}

/// 합성 결과를 PNG 바이트로 내보내기 (마스크 선택)
pub fn export_png(image: &RgbImage, circular_mask: bool) -> Result<Vec<u8>, CoreError> {
    encode_png(&prepare_export(image, circular_mask))
}

/// 합성 결과를 PNG 파일로 저장
///
/// 부모 디렉토리가 없으면 만든다.
pub fn save_png(path: &Path, image: &RgbImage, circular_mask: bool) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let bytes = export_png(image, circular_mask)?;
    std::fs::write(path, &bytes)?;
    debug!("PNG 저장: {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
