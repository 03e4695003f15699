//! # 폼 분석 API 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | POST | /api/v1/form-analysis/save | `save_form_analysis` | 세션 분석 후 저장 |
//! | GET | /api/v1/form-analysis/history/{exercise} | `get_form_analysis_history` | 최근 기록 + 추세 |
//! | GET | /api/v1/form-analysis/summary | `get_form_analysis_summary` | 운동별 요약 |
//! | GET | /api/v1/form-analysis/trends/{exercise} | `get_improvement_trends` | 기간별 점수 추이 |
//! | GET | /api/v1/form-analysis/sessions/{id} | `get_form_session` | 세션 하나 |
//! | DELETE | /api/v1/form-analysis/sessions/{id} | `delete_form_session` | 세션 삭제 |
//!
//! 모든 핸들러는 `AuthUser`를 요구하며, 조회는 토큰의 사용자 범위로 제한됩니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::AppState,
    services::{pipeline, progress},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_HISTORY_LIMIT: u32 = 10;
const DEFAULT_TREND_DAYS: u32 = 30;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    pub days: Option<u32>,
}

fn parse_exercise(raw: &str) -> Result<Exercise, AppError> {
    raw.parse().map_err(|e: UnknownExercise| AppError::BadRequest(e.to_string()))
}

/// 0은 허용하지 않고, 값이 없으면 기본값
fn positive_or(value: Option<u32>, default: u32, name: &str) -> Result<u32, AppError> {
    match value {
        Some(0) => Err(AppError::BadRequest(format!("{name} must be greater than 0"))),
        Some(n) => Ok(n),
        None => Ok(default),
    }
}

/// 자세 추정 프로세스가 보낸 세션을 분석하여 저장합니다.
///
/// `POST /api/v1/form-analysis/save`
/// + `{ "exercise": "squat", "totalReps": 12, "formScores": {...}, ... }`
///
/// 성공 시 201과 함께 파생 필드가 모두 채워진 세션을 반환합니다.
pub async fn save_form_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SaveFormAnalysisRequest>,
) -> Result<(StatusCode, Json<FormSession>), AppError> {
    let session = pipeline::save_form_analysis(&state.pool, &state.advisor, &user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `GET /api/v1/form-analysis/history/{exercise}?limit=10` → `{ "history": [...], "trend": "..." }`
pub async fn get_form_analysis_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exercise): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let exercise = parse_exercise(&exercise)?;
    let limit = positive_or(query.limit, DEFAULT_HISTORY_LIMIT, "limit")?;

    let history = progress::get_history(&state.pool, &user.user_id, exercise, limit).await?;
    Ok(Json(history))
}

/// `GET /api/v1/form-analysis/summary` → `{ "summary": [...] }`
pub async fn get_form_analysis_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let summary = progress::get_summary(&state.pool, &user.user_id).await?;
    Ok(Json(json!({ "summary": summary })))
}

/// `GET /api/v1/form-analysis/trends/{exercise}?days=30`
pub async fn get_improvement_trends(
    State(state): State<AppState>,
    user: AuthUser,
    Path(exercise): Path<String>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<TrendsAnalysis>, AppError> {
    let exercise = parse_exercise(&exercise)?;
    let days = positive_or(query.days, DEFAULT_TREND_DAYS, "days")?;

    let analysis =
        progress::get_trends(&state.pool, &user.user_id, exercise, days, Utc::now()).await?;
    Ok(Json(analysis))
}

/// `GET /api/v1/form-analysis/sessions/{id}` — 본인 세션이 아니면 404
pub async fn get_form_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FormSession>, AppError> {
    let session = db::get_session(&state.pool, &user.user_id, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(session))
}

/// `DELETE /api/v1/form-analysis/sessions/{id}` → 204
pub async fn delete_form_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db::delete_session(&state.pool, &user.user_id, &id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(session_id = %id, "Form analysis deleted");
    Ok(StatusCode::NO_CONTENT)
}
