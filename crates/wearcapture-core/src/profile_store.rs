//! 사용자 프로필 저장소.
//!
//! `{"version": 1, "profiles": [...]}` 형식의 JSON 파일 하나에
//! 사용자 프로필을 보관한다. 내장 프로필과 합칠 때는
//! 이름(대소문자 무시)이 같으면 사용자 프로필이 우선한다.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config_manager::ConfigManager;
use crate::error::CoreError;
use crate::profile::{builtin_profiles, CaptureProfile, ProfileSource};

/// 프로필 파일 포맷 버전
pub const PROFILE_FILE_VERSION: u32 = 1;

/// 프로필 파일 이름
const PROFILES_FILE_NAME: &str = "profiles.json";

#[derive(Debug, Serialize, Deserialize)]
struct ProfileFile {
    version: u32,
    profiles: Vec<CaptureProfile>,
}

/// JSON 파일 기반 프로필 저장소
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// 지정된 경로의 저장소
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 플랫폼 설정 디렉토리의 기본 저장소
    pub fn open_default() -> Result<Self, CoreError> {
        Ok(Self::new(ConfigManager::config_dir()?.join(PROFILES_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 사용자 프로필 로드 (파일이 없으면 빈 목록)
    ///
    /// 이름이 비었거나 형식이 잘못된 항목은 건너뛴다.
    pub fn load_user(&self) -> Result<Vec<CaptureProfile>, CoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            CoreError::Config(format!(
                "프로필 파일 읽기 실패: {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let data: Value = serde_json::from_str(&content)?;

        let items = match data.get("profiles") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let mut profiles = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<CaptureProfile>(item) {
                Ok(mut profile) => {
                    profile.name = profile.name.trim().to_string();
                    if profile.name.is_empty() {
                        continue;
                    }
                    profile.source = ProfileSource::User;
                    profiles.push(profile);
                }
                Err(e) => warn!("프로필 항목 파싱 실패, 건너뜀: {e}"),
            }
        }

        debug!("사용자 프로필 {}개 로드: {}", profiles.len(), self.path.display());
        Ok(profiles)
    }

    /// 사용자 프로필 전체 저장
    pub fn save_user(&self, profiles: &[CaptureProfile]) -> Result<(), CoreError> {
        let profiles = profiles
            .iter()
            .filter(|p| !p.name.trim().is_empty())
            .cloned()
            .collect();
        write_profile_file(&self.path, profiles)
    }

    /// 내장 + 사용자 프로필 병합 (이름순)
    pub fn load_all(&self) -> Result<Vec<CaptureProfile>, CoreError> {
        let mut merged: BTreeMap<String, CaptureProfile> = builtin_profiles()
            .into_iter()
            .map(|p| (p.name.to_lowercase(), p))
            .collect();
        for profile in self.load_user()? {
            merged.insert(profile.name.to_lowercase(), profile);
        }
        Ok(merged.into_values().collect())
    }

    /// 이름으로 프로필 조회 (대소문자 무시)
    pub fn get(&self, name: &str) -> Result<Option<CaptureProfile>, CoreError> {
        let target = name.trim().to_lowercase();
        Ok(self
            .load_all()?
            .into_iter()
            .find(|p| p.name.to_lowercase() == target))
    }

    /// 이름으로 프로필 조회, 없으면 `NotFound`
    pub fn require(&self, name: &str) -> Result<CaptureProfile, CoreError> {
        self.get(name)?.ok_or_else(|| CoreError::NotFound {
            resource_type: "Profile".to_string(),
            id: name.to_string(),
        })
    }

    /// 사용자 프로필 추가 또는 교체 (이름 대소문자 무시)
    pub fn upsert(&self, mut profile: CaptureProfile) -> Result<(), CoreError> {
        profile.name = profile.name.trim().to_string();
        profile.description = profile.description.trim().to_string();
        if profile.name.is_empty() {
            return Err(CoreError::validation("name", "프로필 이름이 비어 있습니다"));
        }
        profile.source = ProfileSource::User;

        let mut existing = self.load_user()?;
        let key = profile.name.to_lowercase();
        match existing.iter_mut().find(|p| p.name.to_lowercase() == key) {
            Some(slot) => *slot = profile,
            None => existing.push(profile),
        }

        self.save_user(&existing)?;
        info!("프로필 저장: {}", key);
        Ok(())
    }

    /// 프로필 하나를 교환용 파일로 내보내기
    pub fn export(&self, profile: &CaptureProfile, output: &Path) -> Result<(), CoreError> {
        write_profile_file(output, vec![profile.clone()])?;
        info!("프로필 내보내기: {} → {}", profile.name, output.display());
        Ok(())
    }

    /// 교환용 파일에서 프로필 가져오기
    ///
    /// 래핑된 형식(`{"profiles":[...]}`의 첫 항목)과
    /// 단독 형식(`{"name":..,"config":..}`)을 모두 받는다.
    pub fn import(&self, input: &Path, rename: Option<&str>) -> Result<CaptureProfile, CoreError> {
        let content = fs::read_to_string(input).map_err(|e| {
            CoreError::Config(format!("가져올 파일 읽기 실패: {}: {}", input.display(), e))
        })?;
        let data: Value = serde_json::from_str(&content)?;

        let candidate = match &data {
            Value::Object(map) => match map.get("profiles") {
                Some(Value::Array(items)) => items.first().filter(|v| v.is_object()).cloned(),
                _ if map.contains_key("name") && map.contains_key("config") => Some(data.clone()),
                _ => None,
            },
            _ => None,
        };
        let candidate = candidate.ok_or_else(|| {
            CoreError::validation("import", "유효한 프로필 데이터가 없습니다")
        })?;

        let mut profile: CaptureProfile = serde_json::from_value(candidate)?;
        if let Some(name) = rename {
            profile.name = name.trim().to_string();
        }
        if profile.name.trim().is_empty() {
            return Err(CoreError::validation("name", "가져온 프로필에 이름이 없습니다"));
        }

        self.upsert(profile.clone())?;
        profile.name = profile.name.trim().to_string();
        profile.source = ProfileSource::User;
        Ok(profile)
    }
}

fn write_profile_file(path: &Path, profiles: Vec<CaptureProfile>) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                CoreError::Config(format!("디렉토리 생성 실패: {}: {}", parent.display(), e))
            })?;
        }
    }

    let payload = ProfileFile {
        version: PROFILE_FILE_VERSION,
        profiles,
    };
    let content = serde_json::to_string_pretty(&payload)?;
    fs::write(path, content).map_err(|e| {
        CoreError::Config(format!("프로필 파일 저장 실패: {}: {}", path.display(), e))
    })?;
    Ok(())
}
