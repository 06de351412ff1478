//! 미리보기 썸네일.
//!
//! fast_image_resize 기반 고속 리사이즈. 진행 이벤트에 실리는 PNG를 만든다.

use fast_image_resize::{images::Image as FirImage, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage};
use tracing::debug;
use wearcapture_core::error::CoreError;

use crate::encoder::encode_png;

/// 긴 변이 `max_side` 이하가 되는 크기 (비율 유지, 최소 1px)
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side || longest == 0 {
        return (width, height);
    }
    let ratio = max_side as f64 / longest as f64;
    let w = ((width as f64) * ratio).round().max(1.0) as u32;
    let h = ((height as f64) * ratio).round().max(1.0) as u32;
    (w, h)
}

/// RGB 이미지 고속 리사이즈
pub fn fast_resize(image: &RgbImage, width: u32, height: u32) -> Result<RgbImage, CoreError> {
    let (src_w, src_h) = image.dimensions();
    if src_w == width && src_h == height {
        return Ok(image.clone());
    }
    if src_w == 0 || src_h == 0 {
        return Err(CoreError::Internal("소스 이미지 크기 0".to_string()));
    }
    if width == 0 || height == 0 {
        return Err(CoreError::Internal("목표 이미지 크기 0".to_string()));
    }

    let src = FirImage::from_vec_u8(src_w, src_h, image.as_raw().clone(), PixelType::U8x3)
        .map_err(|e| CoreError::Internal(format!("소스 이미지 생성 실패: {e}")))?;
    let mut dst = FirImage::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));
    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| CoreError::Internal(format!("리사이즈 실패: {e}")))?;

    RgbImage::from_raw(width, height, dst.into_vec())
        .ok_or_else(|| CoreError::Internal("결과 이미지 생성 실패".to_string()))
}

/// 긴 변이 `max_side` 이하인 PNG 미리보기
pub fn preview_png(image: &RgbImage, max_side: u32) -> Result<Vec<u8>, CoreError> {
    let (w, h) = fit_within(image.width(), image.height(), max_side.max(1));
    let thumb = fast_resize(image, w, h)?;
    debug!(
        "미리보기 생성: {}x{} → {}x{}",
        image.width(),
        image.height(),
        w,
        h
    );
    encode_png(&DynamicImage::ImageRgb8(thumb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn fit_keeps_aspect_ratio() {
        assert_eq!(fit_within(450, 1800, 240), (60, 240));
        assert_eq!(fit_within(100, 50, 240), (100, 50));
        assert_eq!(fit_within(1000, 1, 100), (100, 1));
    }

    #[test]
    fn resize_basic() {
        let image = RgbImage::from_pixel(400, 200, Rgb([100, 100, 100]));
        let thumb = fast_resize(&image, 200, 100).unwrap();
        assert_eq!(thumb.dimensions(), (200, 100));
        assert_eq!(thumb.get_pixel(10, 10), &Rgb([100, 100, 100]));
    }

    #[test]
    fn same_size_noop() {
        let image = RgbImage::from_pixel(48, 27, Rgb([1, 2, 3]));
        assert_eq!(fast_resize(&image, 48, 27).unwrap(), image);
    }

    #[test]
    fn zero_target_is_error() {
        let image = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        assert!(fast_resize(&image, 0, 10).is_err());
    }

    #[test]
    fn preview_is_bounded_png() {
        let image = RgbImage::from_fn(450, 1350, |x, y| Rgb([x as u8, y as u8, 0]));
        let png = preview_png(&image, 240).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 240));
    }
}
