//! adb 출력 파싱.
//!
//! 프로세스 실행과 분리된 순수 함수로 두어 출력 샘플만으로 테스트한다.

use wearcapture_core::models::device::DeviceInfo;

/// PNG 파일 시그니처
pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// `adb devices -l` 출력 파싱 (헤더/데몬 안내 줄 제외)
pub fn parse_devices(output: &str) -> Vec<DeviceInfo> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('*') || line.starts_with("List of devices") {
                return None;
            }
            let mut parts = line.split_whitespace();
            let id = parts.next()?.to_string();
            let state = parts.next().unwrap_or("unknown").to_string();
            let details: Vec<&str> = parts.collect();
            Some(DeviceInfo {
                id,
                state,
                model: extract_model(&details.join(" ")),
                display_size: None,
            })
        })
        .collect()
}

/// 상세 필드에서 `model:XXX` 추출
pub fn extract_model(details: &str) -> Option<String> {
    details
        .split_whitespace()
        .find_map(|token| token.strip_prefix("model:"))
        .filter(|model| !model.is_empty())
        .map(str::to_string)
}

/// `wm size` 출력에서 화면 크기 추출
///
/// `Override size`가 있으면 그것을, 없으면 `Physical size`를 쓴다.
pub fn parse_wm_size(output: &str) -> Option<(u32, u32)> {
    let mut physical = None;
    let mut override_size = None;
    for line in output.lines() {
        let Some(size) = find_dimensions(line) else {
            continue;
        };
        if line.to_ascii_lowercase().contains("override") {
            override_size = Some(size);
        } else if physical.is_none() {
            physical = Some(size);
        }
    }
    override_size.or(physical)
}

/// 문자열에서 첫 `<W>x<H>` 패턴 추출
fn find_dimensions(text: &str) -> Option<(u32, u32)> {
    text.split(|c: char| c.is_whitespace() || c == ':')
        .find_map(|token| {
            let (w, h) = token.split_once('x')?;
            let w = w.parse::<u32>().ok()?;
            let h = h.parse::<u32>().ok()?;
            (w > 0 && h > 0).then_some((w, h))
        })
}

/// 스크린캡 출력 디코딩 후보
///
/// 원본 → PNG 시그니처 이전 잡음 제거 → CRLF 복원 → 둘 다 적용 순서.
pub fn png_candidates(raw: &[u8]) -> Vec<Vec<u8>> {
    let mut candidates = vec![raw.to_vec()];
    let sig_pos = find_subsequence(raw, PNG_SIGNATURE).filter(|&pos| pos > 0);

    if let Some(pos) = sig_pos {
        candidates.push(raw[pos..].to_vec());
    }
    candidates.push(replace_crlf(raw));
    if let Some(pos) = sig_pos {
        candidates.push(replace_crlf(&raw[pos..]));
    }
    candidates
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// `\r\n` → `\n` (일부 환경의 tty 변환 복원)
fn replace_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\r' && data.get(i + 1) == Some(&b'\n') {
            out.push(b'\n');
            i += 2;
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}
