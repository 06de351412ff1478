//! WearCapture 도메인 모델.
//!
//! 프레임, 디바이스, 캡처 실행 결과를 정의한다.

pub mod capture;
pub mod device;
pub mod frame;
