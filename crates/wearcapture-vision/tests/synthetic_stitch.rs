//! 합성 마스터 이미지 기반 이어붙이기 통합 테스트.
//!
//! 마스터 이미지를 알려진 간격으로 잘라 겹침 탐색 → 캔버스 추가를 반복하고,
//! 결과가 마스터의 해당 구간과 픽셀 단위로 같은지 확인한다.

use image::{GenericImageView, Rgb, RgbImage};
use wearcapture_core::config::CaptureConfig;
use wearcapture_core::models::frame::Frame;
use wearcapture_vision::canvas::StitchCanvas;
use wearcapture_vision::overlap::OverlapResolver;
use wearcapture_vision::termination::{StopSignals, StopThresholds};

const WIDTH: u32 = 240;
const FRAME_HEIGHT: u32 = 260;

fn master(height: u32) -> RgbImage {
    RgbImage::from_fn(WIDTH, height, |x, y| {
        let r = (x * 3 + y * 5 + (y / 37) * 23) % 256;
        let g = (x * 7 + y * 2 + ((x / 29) ^ (y / 31)) * 11) % 256;
        let b = (x * 11 + y * 13 + ((x + y) / 17) * 19) % 256;
        Rgb([r as u8, g as u8, b as u8])
    })
}

fn crop(master: &RgbImage, start_y: u32) -> Frame {
    Frame::new(master.view(0, start_y, WIDTH, FRAME_HEIGHT).to_image())
}

#[test]
fn stitched_canvas_matches_master() {
    let step = 72;
    let count = 6;
    let master = master(FRAME_HEIGHT + step * (count - 1));
    let resolver = OverlapResolver::from_config(&CaptureConfig::default());

    let frames: Vec<Frame> = (0..count).map(|i| crop(&master, i * step)).collect();
    let mut canvas = StitchCanvas::seed(&frames[0]);
    let mut heights = vec![canvas.total_height()];

    for pair in frames.windows(2) {
        let overlap = resolver.resolve(&pair[0], &pair[1]).unwrap();
        assert!(overlap.matched);
        assert_eq!(overlap.offset, step);
        canvas.append(&pair[1], &overlap).unwrap();
        heights.push(canvas.total_height());
    }

    assert!(heights.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(canvas.total_height(), master.height());
    assert_eq!(canvas.snapshot().unwrap(), master);
}

#[test]
fn varying_steps_are_recovered() {
    let steps = [40u32, 95, 61, 130];
    let total: u32 = steps.iter().sum();
    let master = master(FRAME_HEIGHT + total);
    let resolver = OverlapResolver::from_config(&CaptureConfig::default());

    let mut start = 0;
    let mut prev = crop(&master, 0);
    let mut canvas = StitchCanvas::seed(&prev);
    for step in steps {
        start += step;
        let next = crop(&master, start);
        let overlap = resolver.resolve(&prev, &next).unwrap();
        assert_eq!(overlap.offset, step, "step {step}");
        canvas.append(&next, &overlap).unwrap();
        prev = next;
    }
    assert_eq!(canvas.snapshot().unwrap(), master);
}

#[test]
fn scrolled_frames_are_not_low_motion() {
    let config = CaptureConfig::default();
    let thresholds = StopThresholds::from_config(&config);
    let master = master(FRAME_HEIGHT + 200);

    let prev = crop(&master, 0);
    let next = crop(&master, 72);
    let signals = StopSignals::measure(&prev, &next, &config).unwrap();
    assert_eq!(signals.motion_px, 72);
    assert!(!signals.is_low_motion(&thresholds));
    assert!(!signals.is_content_exhausted(&thresholds));

    let stuck = StopSignals::measure(&next, &next.clone(), &config).unwrap();
    assert!(stuck.is_low_motion(&thresholds));
    assert!(stuck.is_content_exhausted(&thresholds));
}
