//! # 비즈니스 로직 모듈
//!
//! 폼 분석의 계산 단계들과, 이를 순서대로 묶는 저장 파이프라인입니다.
//! - `improvement`: 직전 세션 대비 개선도 (저장 시점)
//! - `recommendations`: 규칙 기반 자세 추천 (순수 함수)
//! - `advisor`: 생성형 텍스트 기반 다음 세션 처방 + 대체 처방
//! - `progress`: 기록/요약/추세 조회 (조회 시점)
//! - `pipeline`: 검증 → 개선도 → 추천 → 처방 → 저장

pub mod advisor;
pub mod improvement;
pub mod pipeline;
pub mod progress;
pub mod recommendations;
