//! # wearcapture-app
//!
//! WearCapture CLI 진입점.
//! 설정 로드, 로깅 초기화, 서브커맨드 디스패치.

mod cli;
mod commands;
mod lifecycle;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wearcapture_core::config_manager::ConfigManager;

use crate::cli::{Cli, Command};
use crate::commands::AppContext;

/// 로그 필터 문자열 (`RUST_LOG`이 없을 때 사용)
///
/// wearcapture 크레이트들만 지정 레벨, 나머지는 warn.
fn log_filter(level: &str, verbose: bool) -> String {
    let level = if verbose { "debug" } else { level };
    format!("warn,wearcapture={level},wearcapture_core={level},wearcapture_vision={level},wearcapture_device={level},wearcapture_engine={level}")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = log_filter(&cli.log_level, cli.verbose);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let manager = ConfigManager::open(cli.config.clone())?;
    debug!(path = %manager.config_path().display(), "설정 로드");

    let ctx = AppContext::new(manager.get(), cli.adb.clone())?;
    match cli.command {
        Command::Devices => commands::list_devices(&ctx).await,
        Command::Capture(args) => commands::capture(&ctx, args).await,
        Command::Profiles { action } => commands::profiles(&ctx, action).await,
    }
}
