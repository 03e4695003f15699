//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체들을 정의합니다.
//! - `form_session`: 폼 분석 세션과 그 파생 필드, 조회 응답 구조체
//!
//! `pub use form_session::*;`로 재공개하여 `crate::models::FormSession`처럼 짧게 씁니다.

pub mod form_session;

pub use form_session::*;
