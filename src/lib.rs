//! # formtrack
//!
//! 운동 세션의 자세 점수를 분석하여 저장하고, 개선 추세를 조회하는 백엔드입니다.
//!
//! - `models`: 세션과 파생 필드 구조체
//! - `db`: SQLite 세션 저장소
//! - `services`: 개선도, 추천, AI 처방, 기록/추세 집계, 저장 파이프라인
//! - `llm`: 생성형 텍스트 서비스 추상화
//! - `routes` / `middleware`: HTTP 핸들러와 토큰 검증

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod test_support;
