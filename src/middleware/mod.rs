//! 요청 전처리 (인증 토큰 검증)

pub mod auth;
