//! 명령줄 인자 정의.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wearcapture_core::config::SimilarityMetric;
use wearcapture_core::profile::ProfileOverrides;

/// Wear OS 긴 스크린샷 캡처
///
/// ADB로 화면을 스와이프하며 캡처하고, 겹치는 부분을 찾아 한 장으로 이어붙인다.
#[derive(Parser, Debug)]
#[command(name = "wearcapture")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    pub log_level: String,

    /// 상세 로그 (--log-level debug와 같음)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// adb 실행 파일 경로 (설정 파일 값보다 우선)
    #[arg(long, global = true)]
    pub adb: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 연결된 디바이스 목록
    Devices,

    /// 긴 스크린샷 캡처
    Capture(CaptureArgs),

    /// 캡처 프로필 관리
    Profiles {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// 대상 디바이스 시리얼 (온라인 디바이스가 하나면 생략 가능)
    #[arg(long, short = 's')]
    pub serial: Option<String>,

    /// 출력 PNG 경로 (기본: 출력 디렉토리의 wearcapture_YYYYmmdd_HHMMSS.png)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// 사용할 프로필 이름 (생략 시 디바이스에 맞는 프로필 자동 선택)
    #[arg(long, short = 'p')]
    pub profile: Option<String>,

    /// 최종 설정을 이 이름의 사용자 프로필로 저장
    #[arg(long)]
    pub save_profile: Option<String>,

    /// 진행 이벤트에 미리보기 포함
    #[arg(long)]
    pub preview: bool,

    #[command(flatten)]
    pub overrides: CaptureOverrides,
}

/// 프로필 위에 덮어쓸 캡처 설정
#[derive(Args, Debug, Default, Clone)]
pub struct CaptureOverrides {
    /// 최대 스와이프 횟수
    #[arg(long)]
    pub max_swipes: Option<u32>,

    /// 스와이프 후 대기 (ms)
    #[arg(long)]
    pub scroll_delay_ms: Option<u64>,

    /// 스와이프 지속 시간 (ms)
    #[arg(long)]
    pub swipe_duration_ms: Option<u32>,

    /// 콘텐츠 끝 판정 유사도 (0, 1]
    #[arg(long)]
    pub similarity_threshold: Option<f64>,

    /// 전역 유사도 방식 (ssim, pixel_diff)
    #[arg(long, value_parser = parse_metric)]
    pub metric: Option<SimilarityMetric>,

    /// 저모션 판정 이동량 (px)
    #[arg(long)]
    pub low_motion_px: Option<u32>,

    /// 저모션 판정 정합 점수
    #[arg(long)]
    pub low_motion_similarity: Option<f64>,

    /// 연속 저모션 횟수
    #[arg(long)]
    pub low_motion_consecutive: Option<u32>,

    /// 겹침 정합 최소 점수
    #[arg(long)]
    pub overlap_min_similarity: Option<f64>,

    /// 스와이프 시작 X (지정하면 고급 모드)
    #[arg(long)]
    pub swipe_x1: Option<u32>,

    /// 스와이프 시작 Y
    #[arg(long)]
    pub swipe_y1: Option<u32>,

    /// 스와이프 끝 X
    #[arg(long)]
    pub swipe_x2: Option<u32>,

    /// 스와이프 끝 Y
    #[arg(long)]
    pub swipe_y2: Option<u32>,

    /// 원형 마스크 적용 (원형 워치 화면)
    #[arg(long)]
    pub circular: bool,
}

impl CaptureOverrides {
    /// 프로필 덮어쓰기 값으로 변환
    pub fn to_profile_overrides(&self) -> ProfileOverrides {
        let advanced = [self.swipe_x1, self.swipe_y1, self.swipe_x2, self.swipe_y2]
            .iter()
            .any(Option::is_some);

        ProfileOverrides {
            simple_mode: advanced.then_some(false),
            swipe_x1: self.swipe_x1,
            swipe_y1: self.swipe_y1,
            swipe_x2: self.swipe_x2,
            swipe_y2: self.swipe_y2,
            swipe_duration_ms: self.swipe_duration_ms,
            scroll_delay_ms: self.scroll_delay_ms,
            max_swipes: self.max_swipes,
            similarity_threshold: self.similarity_threshold,
            metric: self.metric,
            low_motion_px: self.low_motion_px,
            low_motion_similarity: self.low_motion_similarity,
            low_motion_consecutive: self.low_motion_consecutive,
            overlap_min_similarity: self.overlap_min_similarity,
            circular_mask: self.circular.then_some(true),
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// 내장 + 사용자 프로필 목록
    List,

    /// 연결된 디바이스에 맞는 프로필 추천
    Suggest {
        /// 대상 디바이스 시리얼
        #[arg(long, short = 's')]
        serial: Option<String>,
    },

    /// 프로필을 JSON 파일로 내보내기
    Export {
        /// 프로필 이름
        name: String,
        /// 출력 파일
        output: PathBuf,
    },

    /// JSON 파일에서 프로필 가져오기
    Import {
        /// 입력 파일
        input: PathBuf,
        /// 저장할 이름 (생략 시 파일의 이름 사용)
        #[arg(long)]
        name: Option<String>,
    },
}

fn parse_metric(value: &str) -> Result<SimilarityMetric, String> {
    SimilarityMetric::parse(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_capture_overrides() {
        let cli = Cli::try_parse_from([
            "wearcapture",
            "capture",
            "--serial",
            "R3CT",
            "--max-swipes",
            "12",
            "--metric",
            "pixel_diff",
            "--swipe-y1",
            "400",
            "--circular",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);

        let Command::Capture(args) = cli.command else {
            panic!("capture 명령이어야 함");
        };
        assert_eq!(args.serial.as_deref(), Some("R3CT"));

        let overrides = args.overrides.to_profile_overrides();
        assert_eq!(overrides.max_swipes, Some(12));
        assert_eq!(overrides.metric, Some(SimilarityMetric::PixelDiff));
        assert_eq!(overrides.simple_mode, Some(false));
        assert_eq!(overrides.swipe_y1, Some(400));
        assert_eq!(overrides.circular_mask, Some(true));
        assert_eq!(overrides.low_motion_px, None);
    }

    #[test]
    fn empty_overrides_change_nothing() {
        let overrides = CaptureOverrides::default().to_profile_overrides();
        assert_eq!(overrides, ProfileOverrides::default());
    }

    #[test]
    fn rejects_unknown_metric() {
        let err = Cli::try_parse_from(["wearcapture", "capture", "--metric", "psnr"]).unwrap_err();
        assert!(err.to_string().contains("psnr"));
    }

    #[test]
    fn parses_profile_commands() {
        let cli = Cli::try_parse_from([
            "wearcapture",
            "profiles",
            "import",
            "shared.json",
            "--name",
            "mine",
        ])
        .unwrap();
        match cli.command {
            Command::Profiles {
                action: ProfileCommand::Import { input, name },
            } => {
                assert_eq!(input, PathBuf::from("shared.json"));
                assert_eq!(name.as_deref(), Some("mine"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
