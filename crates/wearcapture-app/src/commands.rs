//! 서브커맨드 실행.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wearcapture_core::config::{AppConfig, CaptureConfig};
use wearcapture_core::error::CoreError;
use wearcapture_core::models::capture::{CapturePhase, CaptureProgress, StopReason};
use wearcapture_core::models::device::DeviceInfo;
use wearcapture_core::ports::device::DeviceTransport;
use wearcapture_core::profile::{
    suggest_profile, CaptureProfile, ProfileOverrides, ProfileSource, GENERIC_PROFILE,
};
use wearcapture_core::profile_store::ProfileStore;
use wearcapture_device::AdbTransport;
use wearcapture_engine::{resolve_device, CaptureSession};
use wearcapture_vision::encoder::save_png;

use crate::cli::{CaptureArgs, ProfileCommand};
use crate::lifecycle::InterruptListener;
use crate::output::{
    default_output_path, describe_device, format_summary, metric_lines, normalize_output,
    partial_path,
};

/// 서브커맨드 공통 컨텍스트
pub struct AppContext {
    pub config: AppConfig,
    pub adb_path: String,
    pub transport: AdbTransport,
    pub profiles: ProfileStore,
}

impl AppContext {
    pub fn new(config: AppConfig, adb_override: Option<String>) -> Result<Self> {
        let mut adb = config.adb.clone();
        if let Some(path) = adb_override {
            adb.path = path;
        }
        let profiles = match &config.profiles_path {
            Some(path) => ProfileStore::new(path.clone()),
            None => ProfileStore::open_default()?,
        };
        Ok(Self {
            transport: AdbTransport::from_config(&adb),
            adb_path: adb.path,
            profiles,
            config,
        })
    }

    async fn ensure_adb(&self) -> Result<()> {
        if !self.transport.is_available().await {
            return Err(CoreError::AdbNotFound(format!(
                "'{}' 실행 불가. Android platform-tools를 설치하세요",
                self.adb_path
            ))
            .into());
        }
        Ok(())
    }
}

/// `devices`
pub async fn list_devices(ctx: &AppContext) -> Result<()> {
    ctx.ensure_adb().await?;
    let devices = ctx.transport.list_devices().await?;
    if devices.is_empty() {
        println!("연결된 디바이스가 없습니다. USB/무선 디버깅을 확인하세요.");
        return Ok(());
    }

    println!("{:<24} {:<14} {:<20} 화면", "시리얼", "상태", "모델");
    for device in &devices {
        let display = device
            .display_size
            .map(|(w, h)| format!("{w}x{h}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<24} {:<14} {:<20} {}",
            device.id,
            device.state,
            device.model.as_deref().unwrap_or("-"),
            display
        );
    }
    Ok(())
}

/// 디바이스 + 프로필 + CLI 덮어쓰기로 최종 캡처 설정 결정
pub fn resolve_capture_config(
    base: &CaptureConfig,
    profile: &CaptureProfile,
    overrides: &ProfileOverrides,
    device: &DeviceInfo,
) -> CaptureConfig {
    let mut config = profile.resolve(base);
    overrides.apply(&mut config);
    config.serial = Some(device.id.clone());
    config
}

/// 이름이 주어지면 그 프로필, 아니면 디바이스에 맞는 추천 프로필
pub fn choose_profile(
    store: &ProfileStore,
    requested: Option<&str>,
    device: &DeviceInfo,
) -> Result<CaptureProfile> {
    if let Some(name) = requested {
        return Ok(store.require(name)?);
    }
    let profiles = store.load_all()?;
    suggest_profile(device.model.as_deref(), device.display_size, &profiles)
        .cloned()
        .ok_or_else(|| anyhow!("사용 가능한 프로필이 없습니다"))
}

/// 현재 설정을 사용자 프로필로 저장
pub fn save_as_profile(
    store: &ProfileStore,
    name: &str,
    base: &CaptureProfile,
    config: &CaptureConfig,
    device: &DeviceInfo,
) -> Result<()> {
    let profile = CaptureProfile {
        name: name.to_string(),
        description: format!("{} 기반 사용자 프로필", base.name),
        config: ProfileOverrides::from_config(config),
        model_pattern: device.model.clone(),
        display_size: device.display_size,
        source: ProfileSource::User,
    };
    store.upsert(profile)?;
    info!(profile = name, path = %store.path().display(), "프로필 저장");
    Ok(())
}

/// `capture`
pub async fn capture(ctx: &AppContext, args: CaptureArgs) -> Result<()> {
    ctx.ensure_adb().await?;

    let preferred = args
        .serial
        .clone()
        .or_else(|| ctx.config.capture.serial.clone());
    let device = resolve_device(&ctx.transport, preferred.as_deref()).await?;
    let profile = choose_profile(&ctx.profiles, args.profile.as_deref(), &device)?;
    let config = resolve_capture_config(
        &ctx.config.capture,
        &profile,
        &args.overrides.to_profile_overrides(),
        &device,
    );
    config.validate()?;
    info!(
        serial = %device.id,
        profile = %profile.name,
        max_swipes = config.max_swipes,
        metric = config.metric.as_str(),
        "캡처 준비"
    );

    if let Some(name) = &args.save_profile {
        save_as_profile(&ctx.profiles, name, &profile, &config, &device)?;
    }

    let output = normalize_output(args.output.clone().unwrap_or_else(|| {
        default_output_path(ctx.config.output_dir.as_deref(), &chrono::Local::now())
    }));

    println!(
        "📱 {} · 프로필 {} · 최대 {}회 스와이프 (Ctrl+C: 저장 후 종료)",
        describe_device(&device),
        profile.name,
        config.max_swipes
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let mut session = CaptureSession::new(
        Arc::new(ctx.transport.clone()) as Arc<dyn DeviceTransport>,
        config.clone(),
        device.clone(),
    )
    .with_progress(tx);
    if args.preview || ctx.config.preview.enabled {
        session = session.with_preview(ctx.config.preview.max_side);
    }

    let reporter = tokio::spawn(report_progress(rx));
    let (handle, task) = session.spawn();
    let interrupts = InterruptListener::spawn(handle);
    let outcome = task.await.context("캡처 태스크 비정상 종료")?;
    drop(interrupts);
    if let Err(e) = reporter.await {
        debug!("진행 리포터 종료: {e}");
    }

    match outcome {
        Ok(result) if result.stop_reason == StopReason::Cancelled => {
            bail!("[cancelled] 캡처가 취소되어 저장하지 않았습니다")
        }
        Ok(result) => {
            save_png(&output, &result.image, config.circular_mask)?;
            println!("\n✅ 캡처 완료");
            println!("{}", format_summary(&device, &result, &output));
            Ok(())
        }
        Err(failure) => {
            if let Some(partial) = &failure.partial {
                let path = partial_path(&output);
                match save_png(&path, &partial.image, false) {
                    Ok(()) => {
                        eprintln!(
                            "\n⚠️  부분 결과 저장: {} ({}x{})",
                            path.display(),
                            partial.image.width(),
                            partial.image.height()
                        );
                        for line in metric_lines(&partial.metrics) {
                            eprintln!("{line}");
                        }
                    }
                    Err(e) => warn!("부분 결과 저장 실패: {e}"),
                }
            }
            Err(anyhow!("[{}] {}", failure.code(), failure.error))
        }
    }
}

async fn report_progress(mut rx: mpsc::UnboundedReceiver<CaptureProgress>) {
    while let Some(event) = rx.recv().await {
        match event.phase {
            CapturePhase::Initial | CapturePhase::Iteration => info!("{}", event.message),
            CapturePhase::Stopping | CapturePhase::Complete => debug!("{}", event.message),
        }
        if let Some(png) = &event.preview_png {
            debug!(bytes = png.len(), "미리보기 갱신");
        }
    }
}

/// `profiles ...`
pub async fn profiles(ctx: &AppContext, action: ProfileCommand) -> Result<()> {
    match action {
        ProfileCommand::List => {
            let profiles = ctx.profiles.load_all()?;
            println!("{:<22} {:<8} {:<10} {:<10} 설명", "이름", "출처", "화면", "모델");
            for profile in &profiles {
                println!(
                    "{:<22} {:<8} {:<10} {:<10} {}",
                    profile.name,
                    profile.source.as_str(),
                    profile
                        .display_size
                        .map(|(w, h)| format!("{w}x{h}"))
                        .unwrap_or_else(|| "-".into()),
                    profile.model_pattern.as_deref().unwrap_or("-"),
                    profile.description
                );
            }
            println!("\n사용자 프로필: {}", ctx.profiles.path().display());
        }
        ProfileCommand::Suggest { serial } => {
            ctx.ensure_adb().await?;
            let device = resolve_device(&ctx.transport, serial.as_deref()).await?;
            let profiles = ctx.profiles.load_all()?;
            match suggest_profile(device.model.as_deref(), device.display_size, &profiles) {
                Some(profile) => {
                    let score = profile.score(device.model.as_deref(), device.display_size);
                    println!("{} → {} (점수 {score})", describe_device(&device), profile.name);
                    if score == 0 {
                        println!("일치하는 프로필이 없어 {GENERIC_PROFILE} 을(를) 사용합니다");
                    }
                }
                None => println!("사용 가능한 프로필이 없습니다"),
            }
        }
        ProfileCommand::Export { name, output } => {
            let profile = ctx.profiles.require(&name)?;
            ctx.profiles.export(&profile, &output)?;
            println!("'{}' → {}", profile.name, output.display());
        }
        ProfileCommand::Import { input, name } => {
            let profile = ctx.profiles.import(&input, name.as_deref())?;
            println!(
                "'{}' 가져오기 완료 → {}",
                profile.name,
                ctx.profiles.path().display()
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&profile.config).unwrap_or_default()
            );
        }
    }
    Ok(())
}
