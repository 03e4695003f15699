//! # 폼 분석 세션 데이터베이스 쿼리 모듈
//!
//! `form_sessions` 테이블에 대한 저장/조회/삭제 쿼리 함수들입니다.
//!
//! ## 저장 형식
//! - 식별자, 시각, 여섯 가지 점수는 일반 컬럼 (집계·정렬에 사용)
//! - 부상 경고, 반복 상세, 파생 필드는 JSON 텍스트 컬럼
//! - 시각은 `%Y-%m-%dT%H:%M:%S%.3fZ` 고정 폭 문자열이므로 문자열 정렬 = 시간 정렬
//! - 같은 밀리초의 세션은 UUIDv7 `id` 순으로 정렬
//!
//! 모든 조회는 `user_id`로 범위가 제한됩니다. 다른 사용자의 세션은 보이지 않습니다.

use crate::db::{format_timestamp, parse_timestamp};
use crate::error::AppError;
use crate::models::*;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// 공통 SELECT 컬럼 목록
const SESSION_COLUMNS: &str = r#"
    id, user_id, exercise, session_date, session_duration, total_reps,
    overall_score, knee_alignment, back_position, hip_alignment, range_of_motion, tempo,
    injury_alerts, rep_data, improvements, recommendations, ai_suggestions,
    created_at, updated_at
"#;

/// DB 한 행을 그대로 읽어오는 중간 구조체
///
/// JSON 텍스트와 문자열 시각을 담고 있으며, `TryFrom`으로 `FormSession`으로 변환합니다.
#[derive(Debug, sqlx::FromRow)]
struct FormSessionRow {
    id: String,
    user_id: String,
    exercise: String,
    session_date: String,
    session_duration: i64,
    total_reps: i64,
    overall_score: f64,
    knee_alignment: f64,
    back_position: f64,
    hip_alignment: f64,
    range_of_motion: f64,
    tempo: f64,
    injury_alerts: String,
    rep_data: String,
    improvements: String,
    recommendations: String,
    ai_suggestions: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<FormSessionRow> for FormSession {
    type Error = AppError;

    fn try_from(row: FormSessionRow) -> Result<Self, Self::Error> {
        let exercise = row
            .exercise
            .parse::<Exercise>()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(FormSession {
            id: row.id,
            user_id: row.user_id,
            exercise,
            date: parse_timestamp(&row.session_date)?,
            session_duration: to_u32(row.session_duration, "session_duration")?,
            total_reps: to_u32(row.total_reps, "total_reps")?,
            form_scores: FormScores {
                overall: row.overall_score,
                knee_alignment: row.knee_alignment,
                back_position: row.back_position,
                hip_alignment: row.hip_alignment,
                range_of_motion: row.range_of_motion,
                tempo: row.tempo,
            },
            injury_alerts: serde_json::from_str(&row.injury_alerts)?,
            rep_data: serde_json::from_str(&row.rep_data)?,
            improvements: serde_json::from_str(&row.improvements)?,
            recommendations: serde_json::from_str(&row.recommendations)?,
            ai_suggestions: serde_json::from_str(&row.ai_suggestions)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

fn to_u32(value: i64, column: &str) -> Result<u32, AppError> {
    u32::try_from(value).map_err(|_| AppError::Internal(format!("{column} out of range: {value}")))
}

fn into_sessions(rows: Vec<FormSessionRow>) -> Result<Vec<FormSession>, AppError> {
    rows.into_iter().map(FormSession::try_from).collect()
}

/// 파생 필드까지 완성된 세션을 저장합니다.
///
/// 저장 파이프라인의 유일한 쓰기 작업입니다. INSERT 한 번으로 끝나므로
/// 실패하면 아무것도 남지 않습니다.
pub async fn insert_session(pool: &SqlitePool, session: &FormSession) -> Result<(), AppError> {
    let scores = &session.form_scores;

    sqlx::query(
        r#"
        INSERT INTO form_sessions (
            id, user_id, exercise, session_date, session_duration, total_reps,
            overall_score, knee_alignment, back_position, hip_alignment, range_of_motion, tempo,
            injury_alert_count, injury_alerts, rep_data,
            improvements, recommendations, ai_suggestions,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(session.exercise.as_str())
    .bind(format_timestamp(session.date))
    .bind(i64::from(session.session_duration))
    .bind(i64::from(session.total_reps))
    .bind(scores.overall)
    .bind(scores.knee_alignment)
    .bind(scores.back_position)
    .bind(scores.hip_alignment)
    .bind(scores.range_of_motion)
    .bind(scores.tempo)
    .bind(session.injury_alerts.len() as i64)
    .bind(serde_json::to_string(&session.injury_alerts)?)
    .bind(serde_json::to_string(&session.rep_data)?)
    .bind(serde_json::to_string(&session.improvements)?)
    .bind(serde_json::to_string(&session.recommendations)?)
    .bind(serde_json::to_string(&session.ai_suggestions)?)
    .bind(format_timestamp(session.created_at))
    .bind(format_timestamp(session.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// 사용자의 세션 하나를 조회합니다. 다른 사용자의 세션이면 `None`.
pub async fn get_session(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<FormSession>, AppError> {
    let row = sqlx::query_as::<_, FormSessionRow>(&format!(
        "SELECT {SESSION_COLUMNS} FROM form_sessions WHERE id = ? AND user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(FormSession::try_from).transpose()
}

/// `before`보다 엄격하게 이전인, 같은 (사용자, 운동)의 가장 최근 *다른* 세션
///
/// `exclude_id`는 지금 계산 중인 세션 자신을 제외하기 위한 값입니다.
pub async fn find_previous_session(
    pool: &SqlitePool,
    user_id: &str,
    exercise: Exercise,
    before: DateTime<Utc>,
    exclude_id: &str,
) -> Result<Option<FormSession>, AppError> {
    let row = sqlx::query_as::<_, FormSessionRow>(&format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM form_sessions
        WHERE user_id = ? AND exercise = ? AND id <> ? AND session_date < ?
        ORDER BY session_date DESC, id DESC
        LIMIT 1
        "#
    ))
    .bind(user_id)
    .bind(exercise.as_str())
    .bind(exclude_id)
    .bind(format_timestamp(before))
    .fetch_optional(pool)
    .await?;

    row.map(FormSession::try_from).transpose()
}

/// 특정 운동의 최근 세션 `limit`개를 최신순으로 조회합니다.
pub async fn list_recent_sessions(
    pool: &SqlitePool,
    user_id: &str,
    exercise: Exercise,
    limit: u32,
) -> Result<Vec<FormSession>, AppError> {
    let rows = sqlx::query_as::<_, FormSessionRow>(&format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM form_sessions
        WHERE user_id = ? AND exercise = ?
        ORDER BY session_date DESC, id DESC
        LIMIT ?
        "#
    ))
    .bind(user_id)
    .bind(exercise.as_str())
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    into_sessions(rows)
}

/// `since` 이후(포함)의 세션을 오래된 순으로 조회합니다.
pub async fn list_sessions_since(
    pool: &SqlitePool,
    user_id: &str,
    exercise: Exercise,
    since: DateTime<Utc>,
) -> Result<Vec<FormSession>, AppError> {
    let rows = sqlx::query_as::<_, FormSessionRow>(&format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM form_sessions
        WHERE user_id = ? AND exercise = ? AND session_date >= ?
        ORDER BY session_date ASC, id ASC
        "#
    ))
    .bind(user_id)
    .bind(exercise.as_str())
    .bind(format_timestamp(since))
    .fetch_all(pool)
    .await?;

    into_sessions(rows)
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    exercise: String,
    total_sessions: i64,
    avg_form_score: f64,
    total_reps: i64,
    total_injury_alerts: i64,
    latest_session: String,
    best_form_score: f64,
}

impl TryFrom<SummaryRow> for ExerciseSummary {
    type Error = AppError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(ExerciseSummary {
            exercise: row
                .exercise
                .parse::<Exercise>()
                .map_err(|e| AppError::Internal(e.to_string()))?,
            total_sessions: row.total_sessions,
            avg_form_score: row.avg_form_score,
            total_reps: row.total_reps,
            total_injury_alerts: row.total_injury_alerts,
            latest_session: parse_timestamp(&row.latest_session)?,
            best_form_score: row.best_form_score,
        })
    }
}

/// 사용자의 세션을 운동별로 묶은 집계
///
/// 가장 최근 세션 시각 기준 내림차순 (동률이면 운동 이름순).
pub async fn summarize_by_exercise(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<ExerciseSummary>, AppError> {
    let rows = sqlx::query_as::<_, SummaryRow>(
        r#"
        SELECT exercise,
               COUNT(*) AS total_sessions,
               AVG(overall_score) AS avg_form_score,
               SUM(total_reps) AS total_reps,
               SUM(injury_alert_count) AS total_injury_alerts,
               MAX(session_date) AS latest_session,
               MAX(overall_score) AS best_form_score
        FROM form_sessions
        WHERE user_id = ?
        GROUP BY exercise
        ORDER BY latest_session DESC, exercise ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ExerciseSummary::try_from).collect()
}

/// 사용자의 세션을 삭제합니다. 삭제된 행이 있으면 `true`.
pub async fn delete_session(pool: &SqlitePool, user_id: &str, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM form_sessions WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_pool, session_at};
    use chrono::Duration;

    #[tokio::test]
    async fn insert_then_get_preserves_every_field() {
        let pool = memory_pool().await;
        let mut session = session_at("u1", Exercise::Squat, Utc::now(), 82.0);
        session.injury_alerts.push(InjuryAlert {
            timestamp: None,
            severity: Severity::High,
            issue: "Knee valgus".to_string(),
            recommendation: "Push knees out".to_string(),
        });
        session.rep_data.push(RepData {
            rep_number: 1,
            quality: RepQuality::Good,
            score: 84.5,
            duration: 2300,
            angles: AngleStats { min: 72.0, max: 168.0, average: 110.0 },
            issues: vec!["shallow".to_string()],
        });

        insert_session(&pool, &session).await.unwrap();
        let loaded = get_session(&pool, "u1", &session.id).await.unwrap().unwrap();

        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn get_session_is_scoped_to_owner() {
        let pool = memory_pool().await;
        let session = session_at("u1", Exercise::Plank, Utc::now(), 70.0);
        insert_session(&pool, &session).await.unwrap();

        assert!(get_session(&pool, "u2", &session.id).await.unwrap().is_none());
        assert!(!delete_session(&pool, "u2", &session.id).await.unwrap());
        assert!(delete_session(&pool, "u1", &session.id).await.unwrap());
        assert!(get_session(&pool, "u1", &session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn previous_session_is_strictly_earlier_and_same_exercise() {
        let pool = memory_pool().await;
        let now = Utc::now();
        let older = session_at("u1", Exercise::Squat, now - Duration::days(2), 60.0);
        let newer = session_at("u1", Exercise::Squat, now - Duration::days(1), 65.0);
        let other_exercise = session_at("u1", Exercise::Lunges, now - Duration::hours(1), 99.0);
        let other_user = session_at("u2", Exercise::Squat, now - Duration::hours(1), 99.0);
        for s in [&older, &newer, &other_exercise, &other_user] {
            insert_session(&pool, s).await.unwrap();
        }

        let found = find_previous_session(&pool, "u1", Exercise::Squat, now, "current")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, newer.id);

        // 같은 시각은 "이전"이 아님
        let found = find_previous_session(&pool, "u1", Exercise::Squat, older.date, "current")
            .await
            .unwrap();
        assert!(found.is_none());

        // 자기 자신은 제외
        let found = find_previous_session(&pool, "u1", Exercise::Squat, now, &newer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, older.id);
    }

    #[tokio::test]
    async fn recent_sessions_are_newest_first_and_limited() {
        let pool = memory_pool().await;
        let now = Utc::now();
        for day in 0..5 {
            let s = session_at("u1", Exercise::Deadlift, now - Duration::days(day), 50.0 + day as f64);
            insert_session(&pool, &s).await.unwrap();
        }

        let sessions = list_recent_sessions(&pool, "u1", Exercise::Deadlift, 3).await.unwrap();
        let scores: Vec<f64> = sessions.iter().map(|s| s.form_scores.overall).collect();
        assert_eq!(scores, vec![50.0, 51.0, 52.0]);
    }

    #[tokio::test]
    async fn same_millisecond_sessions_order_by_id() {
        let pool = memory_pool().await;
        let at = Utc::now() - Duration::hours(1);
        for (id, score) in [("0002", 62.0), ("0003", 63.0), ("0001", 61.0)] {
            let mut s = session_at("u1", Exercise::Lunges, at, score);
            s.id = id.to_string();
            insert_session(&pool, &s).await.unwrap();
        }

        let newest_first = list_recent_sessions(&pool, "u1", Exercise::Lunges, 10).await.unwrap();
        let ids: Vec<&str> = newest_first.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["0003", "0002", "0001"]);

        let oldest_first = list_sessions_since(&pool, "u1", Exercise::Lunges, at).await.unwrap();
        let ids: Vec<&str> = oldest_first.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["0001", "0002", "0003"]);

        let previous = find_previous_session(&pool, "u1", Exercise::Lunges, Utc::now(), "0003")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(previous.id, "0002");
    }

    #[tokio::test]
    async fn summary_groups_by_exercise_and_sorts_by_latest() {
        let pool = memory_pool().await;
        let now = Utc::now();
        let mut squat = session_at("u1", Exercise::Squat, now - Duration::days(3), 70.0);
        squat.total_reps = 10;
        squat.injury_alerts.push(InjuryAlert {
            timestamp: None,
            severity: Severity::Low,
            issue: "Heels lifting".to_string(),
            recommendation: String::new(),
        });
        let mut squat2 = session_at("u1", Exercise::Squat, now - Duration::days(2), 90.0);
        squat2.total_reps = 12;
        let pushup = session_at("u1", Exercise::Pushup, now - Duration::days(1), 80.0);
        for s in [&squat, &squat2, &pushup] {
            insert_session(&pool, s).await.unwrap();
        }

        let summary = summarize_by_exercise(&pool, "u1").await.unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].exercise, Exercise::Pushup);
        assert_eq!(summary[1].exercise, Exercise::Squat);
        assert_eq!(summary[1].total_sessions, 2);
        assert_eq!(summary[1].avg_form_score, 80.0);
        assert_eq!(summary[1].total_reps, 22);
        assert_eq!(summary[1].total_injury_alerts, 1);
        assert_eq!(summary[1].best_form_score, 90.0);
        assert_eq!(summary[1].latest_session, squat2.date);
    }
}
