//! # wearcapture-vision
//!
//! 캡처-이어붙이기 루프의 이미지 처리 크레이트.
//! 프레임 비교, 겹침 탐색, 합성 캔버스, 종료 판정, 내보내기를 담당한다.
//! 캔버스와 판정기를 제외하면 모두 상태 없는 순수 함수다.

pub mod canvas;
pub mod encoder;
pub mod export;
pub mod overlap;
pub mod similarity;
pub mod termination;
pub mod thumbnail;
