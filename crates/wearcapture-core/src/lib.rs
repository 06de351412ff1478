//! # wearcapture-core
//!
//! WearCapture 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 프레임, 디바이스, 실행 결과
//! - [`ports`]: 디바이스 전송 포트 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 캡처/애플리케이션 설정과 검증
//! - [`config_manager`]: 설정 파일 관리 (로드/저장)
//! - [`profile`]: 캡처 프로필과 디바이스 기반 추천
//! - [`profile_store`]: 사용자 프로필 JSON 저장소

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;
pub mod profile;
pub mod profile_store;

pub use uuid::Uuid;

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;

    #[test]
    fn app_config_serde_roundtrip() {
        let mut config = AppConfig::default_config();
        config.capture.serial = Some("emulator-5554".to_string());
        config.output_dir = Some("/tmp/shots".into());

        let json = serde_json::to_string(&config).unwrap();
        let restored: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn empty_json_is_default() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default_config());
        assert!(config.capture.validate().is_ok());
    }
}
