//! 애플리케이션 설정 파일.
//!
//! [`AppConfig`]를 JSON으로 보관한다. 첫 실행이면 기본값으로 파일을 만들고,
//! 저장은 임시 파일에 쓴 뒤 교체해서 중간에 끊겨도 기존 파일이 깨지지 않는다.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::CoreError;

const FILE_NAME: &str = "config.json";

/// 설정 파일 핸들 (복제해도 같은 설정을 공유)
#[derive(Debug, Clone)]
pub struct ConfigManager {
    current: Arc<RwLock<AppConfig>>,
    path: PathBuf,
}

impl ConfigManager {
    /// 플랫폼 설정 디렉토리의 `config.json`
    pub fn new() -> Result<Self, CoreError> {
        Self::with_path(Self::default_path()?)
    }

    /// 명시 경로가 있으면 그 파일, 없으면 기본 위치
    pub fn open(explicit: Option<PathBuf>) -> Result<Self, CoreError> {
        match explicit {
            Some(path) => Self::with_path(path),
            None => Self::new(),
        }
    }

    pub fn with_path(path: PathBuf) -> Result<Self, CoreError> {
        let config = if path.is_file() {
            read_config(&path)?
        } else {
            let defaults = AppConfig::default_config();
            write_config(&path, &defaults)?;
            info!(path = %path.display(), "기본 설정 파일 생성");
            defaults
        };
        warn_if_invalid(&config, &path);

        Ok(Self {
            current: Arc::new(RwLock::new(config)),
            path,
        })
    }

    /// 현재 설정 (복제본)
    pub fn get(&self) -> AppConfig {
        self.current.read().clone()
    }

    /// 캡처 설정을 검증한 뒤 파일과 메모리를 함께 교체
    pub fn update(&self, config: AppConfig) -> Result<(), CoreError> {
        config.capture.validate()?;
        write_config(&self.path, &config)?;
        *self.current.write() = config;
        debug!(path = %self.path.display(), "설정 갱신");
        Ok(())
    }

    pub fn update_with<F>(&self, edit: F) -> Result<AppConfig, CoreError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut next = self.get();
        edit(&mut next);
        self.update(next.clone())?;
        Ok(next)
    }

    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// 외부에서 수정된 파일 다시 읽기
    pub fn reload(&self) -> Result<AppConfig, CoreError> {
        let config = read_config(&self.path)?;
        warn_if_invalid(&config, &self.path);
        *self.current.write() = config.clone();
        Ok(config)
    }

    /// 플랫폼별 설정 디렉토리 (`~/.config/wearcapture` 등)
    pub fn config_dir() -> Result<PathBuf, CoreError> {
        ProjectDirs::from("com", "wearcapture", "wearcapture")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| CoreError::Config("홈 디렉토리를 찾을 수 없습니다".to_string()))
    }

    pub fn default_path() -> Result<PathBuf, CoreError> {
        Ok(Self::config_dir()?.join(FILE_NAME))
    }
}

/// 잘못된 캡처 설정은 로드 자체를 막지 않는다 (캡처 시작 시 다시 검증)
fn warn_if_invalid(config: &AppConfig, path: &Path) {
    if let Err(e) = config.capture.validate() {
        warn!(path = %path.display(), code = e.code(), "설정 파일의 캡처 설정이 유효하지 않음: {e}");
    }
}

fn read_config(path: &Path) -> Result<AppConfig, CoreError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CoreError::Config(format!("{} 읽기 실패: {e}", path.display())))?;
    let config = serde_json::from_str(&text)
        .map_err(|e| CoreError::Config(format!("{} 형식 오류: {e}", path.display())))?;
    debug!(path = %path.display(), "설정 로드");
    Ok(config)
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .map_err(|e| CoreError::Config(format!("{} 생성 실패: {e}", dir.display())))?;
    }

    let json = serde_json::to_string_pretty(config)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, json)
        .and_then(|()| fs::rename(&staging, path))
        .map_err(|e| CoreError::Config(format!("{} 저장 실패: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_open_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let manager = ConfigManager::open(Some(path.clone())).unwrap();
        assert!(path.is_file());
        assert!(!path.with_extension("json.tmp").exists());

        let config = manager.get();
        assert_eq!(config.adb.path, "adb");
        assert_eq!(config.capture.max_swipes, 30);
        assert_eq!(config.preview.max_side, 240);
    }

    #[test]
    fn edits_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        ConfigManager::with_path(path.clone())
            .unwrap()
            .update_with(|c| {
                c.adb.command_timeout_secs = 5;
                c.capture.scroll_delay_ms = 800;
            })
            .unwrap();

        let reopened = ConfigManager::with_path(path).unwrap().get();
        assert_eq!(reopened.adb.command_timeout_secs, 5);
        assert_eq!(reopened.capture.scroll_delay_ms, 800);
    }

    #[test]
    fn invalid_capture_update_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json")).unwrap();

        let err = manager
            .update_with(|c| c.capture.max_swipes = 0)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_config");
        assert_eq!(manager.get().capture.max_swipes, 30);
    }

    #[test]
    fn reload_reads_partial_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let manager = ConfigManager::with_path(path.clone()).unwrap();

        fs::write(&path, r#"{"capture": {"max_swipes": 4}}"#).unwrap();
        let reloaded = manager.reload().unwrap();

        assert_eq!(reloaded.capture.max_swipes, 4);
        assert_eq!(manager.get().capture.max_swipes, 4);
        assert_eq!(manager.get().adb.path, "adb");
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = ConfigManager::with_path(path).unwrap_err();
        assert_eq!(err.code(), "config");
    }
}
