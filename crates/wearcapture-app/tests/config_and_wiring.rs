//! 설정, 프로필, 내보내기 와이어링 통합 테스트.
//!
//! AppConfig → ConfigManager → 프로필 해석 → 캡처 설정 검증 → PNG 저장 흐름.

use image::{Rgb, RgbImage};
use wearcapture_core::config::{AppConfig, CaptureConfig};
use wearcapture_core::config_manager::ConfigManager;
use wearcapture_core::profile::{builtin_profiles, suggest_profile, GENERIC_PROFILE};
use wearcapture_core::profile_store::ProfileStore;
use wearcapture_device::AdbTransport;
use wearcapture_vision::encoder::{decode_rgb, save_png};

#[test]
fn config_defaults_are_valid() {
    let config = AppConfig::default_config();
    assert!(config.capture.validate().is_ok());
    assert!(config.adb.command_timeout_secs > 0);
    assert!(config.preview.max_side > 0);
    assert!(!config.adb.path.is_empty());

    let _transport = AdbTransport::from_config(&config.adb);
}

#[test]
fn builtin_profiles_resolve_to_valid_configs() {
    let base = CaptureConfig::default();
    for profile in builtin_profiles() {
        let resolved = profile.resolve(&base);
        assert!(
            resolved.validate().is_ok(),
            "{} 프로필 설정이 유효하지 않음",
            profile.name
        );
    }
}

#[test]
fn config_manager_persists_capture_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let manager = ConfigManager::with_path(path.clone()).unwrap();
    assert!(path.exists());
    manager
        .update_with(|c| {
            c.capture.max_swipes = 12;
            c.profiles_path = Some(dir.path().join("profiles.json"));
        })
        .unwrap();

    let reloaded = ConfigManager::with_path(path).unwrap().get();
    assert_eq!(reloaded.capture.max_swipes, 12);

    let store = ProfileStore::new(reloaded.profiles_path.unwrap());
    let all = store.load_all().unwrap();
    let suggested = suggest_profile(None, None, &all).unwrap();
    assert_eq!(suggested.name, GENERIC_PROFILE);
}

#[test]
fn masked_and_plain_exports_differ_only_in_shape() {
    let dir = tempfile::tempdir().unwrap();
    let composite = RgbImage::from_fn(120, 400, |x, y| Rgb([x as u8, (y % 256) as u8, 90]));

    let plain = dir.path().join("out").join("plain.png");
    save_png(&plain, &composite, false).unwrap();
    let decoded = decode_rgb(&std::fs::read(&plain).unwrap()).unwrap();
    assert_eq!(decoded, composite);

    let masked = dir.path().join("masked.png");
    save_png(&masked, &composite, true).unwrap();
    let decoded = image::open(&masked).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (120, 120));
    assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    assert_eq!(decoded.get_pixel(60, 60)[3], 255);
}
