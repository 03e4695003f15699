//! # 세션 저장 파이프라인
//!
//! ```text
//! 요청 검증 → 개선도 계산 → 자세 추천 → AI 처방 → INSERT 1회
//! ```
//!
//! 단계는 항상 이 순서로 한 번씩만 실행됩니다. AI 처방만 네트워크를 타는
//! 유일한 대기 지점이며, 그 실패는 내부에서 대체 처방으로 복구됩니다.
//! 저장은 마지막 INSERT 하나뿐이라, 중간에 실패하거나 요청이 취소되면 아무것도 남지 않습니다.

use crate::db;
use crate::error::AppError;
use crate::models::*;
use crate::services::advisor::Advisor;
use crate::services::improvement::compute_improvement;
use crate::services::recommendations::generate_recommendations;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

/// 요청 본문을 검증하여 측정값만 있는 세션으로 만듭니다.
///
/// 시각은 저장 형식과 같도록 밀리초 단위로 자릅니다.
pub fn measure(
    request: SaveFormAnalysisRequest,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<MeasuredSession, AppError> {
    let (Some(exercise), Some(total_reps)) = (request.exercise, request.total_reps) else {
        return Err(AppError::BadRequest(
            "Exercise and total reps are required".to_string(),
        ));
    };
    let exercise = exercise
        .parse::<Exercise>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(MeasuredSession {
        id: uuid::Uuid::now_v7().to_string(),
        user_id: user_id.to_string(),
        exercise,
        date: now.trunc_subsecs(3),
        session_duration: request.session_duration.unwrap_or(0),
        total_reps,
        form_scores: request.form_scores.unwrap_or_default(),
        injury_alerts: request.injury_alerts.unwrap_or_default(),
        rep_data: request.rep_data.unwrap_or_default(),
    })
}

/// 측정 세션에 파생 필드를 채우고 저장합니다.
#[instrument(skip_all, fields(user_id = %session.user_id, exercise = %session.exercise))]
pub async fn enrich_and_save(
    pool: &SqlitePool,
    advisor: &Advisor,
    session: MeasuredSession,
) -> Result<FormSession, AppError> {
    debug!("Calculating improvements");
    let improvements = compute_improvement(&session, pool).await?;

    debug!(trend = ?improvements.trend, "Generating form recommendations");
    let recommendations = generate_recommendations(&session.form_scores, session.exercise);

    debug!(count = recommendations.len(), "Requesting next-session advice");
    let ai_suggestions = advisor
        .suggest_next_session(
            session.exercise,
            &session,
            &session.injury_alerts,
            improvements.from_last_session,
        )
        .await;

    let enriched = session.into_enriched(improvements, recommendations, ai_suggestions);
    db::insert_session(pool, &enriched).await?;

    info!(session_id = %enriched.id, "Form analysis saved");
    Ok(enriched)
}

/// `POST /form-analysis/save`의 전체 흐름
pub async fn save_form_analysis(
    pool: &SqlitePool,
    advisor: &Advisor,
    user_id: &str,
    request: SaveFormAnalysisRequest,
) -> Result<FormSession, AppError> {
    let session = measure(request, user_id, Utc::now())?;
    enrich_and_save(pool, advisor, session).await
}
