//! 내보내기 후처리.
//!
//! 원형 마스크는 최종 저장 직전에만 적용한다. 캔버스에는 손대지 않는다.

use image::{DynamicImage, Rgba, RgbaImage, RgbImage};

/// 가장 큰 내접원만 남기고 바깥을 투명하게 만든 정사각형 이미지
///
/// 중앙 기준으로 `min(w, h)` 정사각형을 잘라낸 뒤,
/// 픽셀 중심이 원 안에 있으면 불투명, 아니면 알파 0.
pub fn apply_circular_mask(image: &RgbImage) -> RgbaImage {
    let (w, h) = image.dimensions();
    let side = w.min(h);
    let left = (w - side) / 2;
    let top = (h - side) / 2;

    let radius = side as f64 / 2.0;
    let r2 = radius * radius;

    RgbaImage::from_fn(side, side, |x, y| {
        let px = image.get_pixel(left + x, top + y);
        let dx = x as f64 + 0.5 - radius;
        let dy = y as f64 + 0.5 - radius;
        let alpha = if dx * dx + dy * dy <= r2 { 255 } else { 0 };
        Rgba([px[0], px[1], px[2], alpha])
    })
}

/// 내보낼 최종 이미지 (마스크 여부 반영)
pub fn prepare_export(image: &RgbImage, circular_mask: bool) -> DynamicImage {
    if circular_mask {
        DynamicImage::ImageRgba8(apply_circular_mask(image))
    } else {
        DynamicImage::ImageRgb8(image.clone())
    }
}
