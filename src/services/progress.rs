//! # 기록·추세 집계 (History & Trend Aggregator)
//!
//! 저장된 세션만 읽어서 답하는 조회 전용 계산들입니다. 모두 한 사용자 범위.
//!
//! - `get_history`: 최근 세션 목록 + 구간 평균 추세 (최근 3개 vs 그 이전 3개)
//! - `get_summary`: 운동별 누적 통계
//! - `get_trends`: 최근 N일 점수 추이 + 평균 개선폭
//!
//! `get_history`의 추세는 조회할 때마다 다시 계산되며, 각 세션에 저장된
//! `improvements.trend`(직전 세션 하나와의 비교)와 일치한다는 보장이 없습니다.

use crate::db;
use crate::error::AppError;
use crate::models::*;
use crate::services::improvement::classify_change;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

/// 추세 비교 구간 크기 (최근 3개, 그 이전 3개)
pub const TREND_WINDOW: usize = 3;

/// 최신순 기록에서 구간 평균 추세를 계산합니다.
///
/// 세션이 4개 미만이면 "이전" 구간이 비어 있으므로 `new`.
pub fn windowed_trend(history: &[FormSession]) -> Trend {
    let recent = &history[..history.len().min(TREND_WINDOW)];
    let older = &history[recent.len()..history.len().min(TREND_WINDOW * 2)];

    if recent.is_empty() || older.is_empty() {
        return Trend::New;
    }

    classify_change(mean_overall(recent) - mean_overall(older))
}

fn mean_overall(sessions: &[FormSession]) -> f64 {
    sessions.iter().map(|s| s.form_scores.overall).sum::<f64>() / sessions.len() as f64
}

/// 연속된 점수 차이의 평균. 점이 2개 미만이면 0.
pub fn average_improvement(points: &[TrendPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let total: f64 = points
        .windows(2)
        .map(|pair| pair[1].overall_score - pair[0].overall_score)
        .sum();
    total / (points.len() - 1) as f64
}

pub async fn get_history(
    pool: &SqlitePool,
    user_id: &str,
    exercise: Exercise,
    limit: u32,
) -> Result<HistoryResponse, AppError> {
    let history = db::list_recent_sessions(pool, user_id, exercise, limit).await?;
    let trend = windowed_trend(&history);
    Ok(HistoryResponse { history, trend })
}

pub async fn get_summary(pool: &SqlitePool, user_id: &str) -> Result<Vec<ExerciseSummary>, AppError> {
    db::summarize_by_exercise(pool, user_id).await
}

/// `now - days` 이후(포함)의 점수 추이를 오래된 순으로 반환합니다.
///
/// 기간이 표현 범위를 넘으면 Unix epoch부터 전부를 구간으로 봅니다.
pub async fn get_trends(
    pool: &SqlitePool,
    user_id: &str,
    exercise: Exercise,
    days: u32,
    now: DateTime<Utc>,
) -> Result<TrendsAnalysis, AppError> {
    let since = now
        .checked_sub_signed(Duration::days(i64::from(days)))
        .map_or(DateTime::<Utc>::UNIX_EPOCH, |since| since.max(DateTime::<Utc>::UNIX_EPOCH));
    let sessions = db::list_sessions_since(pool, user_id, exercise, since).await?;

    let trends: Vec<TrendPoint> = sessions
        .iter()
        .map(|session| TrendPoint {
            date: session.date,
            overall_score: session.form_scores.overall,
            knee_alignment: session.form_scores.knee_alignment,
            back_position: session.form_scores.back_position,
            hip_alignment: session.form_scores.hip_alignment,
            had_injury_alerts: !session.injury_alerts.is_empty(),
        })
        .collect();

    Ok(TrendsAnalysis {
        exercise,
        period: format!("{days} days"),
        data_points: trends.len(),
        average_improvement: average_improvement(&trends),
        trends,
    })
}
