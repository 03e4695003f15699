//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스(services/)와 라우트 핸들러(routes/)에서 이 모듈의 함수를 호출합니다.
//!
//! 하위 모듈:
//! - `form_sessions`: 폼 분석 세션 저장/조회/집계 쿼리

pub mod form_sessions;

pub use form_sessions::*;

use crate::error::AppError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// SQLite 연결 풀을 만들고 `./migrations`의 마이그레이션을 실행합니다.
///
/// 파일 DB가 없으면 새로 만듭니다. `sqlite::memory:`는 연결마다 별도 DB이므로
/// 테스트에서는 `max_connections`를 1로 둡니다.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// DB 저장용 시각 문자열 (예: "2026-02-16T12:00:00.000Z")
///
/// 항상 밀리초 3자리 고정 폭이라 문자열 비교가 시간 비교와 같습니다.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("Invalid stored timestamp '{value}': {e}")))
}
