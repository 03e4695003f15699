//! 단위 테스트 공용 헬퍼

use crate::db;
use crate::models::*;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::SqlitePool;

/// 마이그레이션이 적용된 인메모리 SQLite 풀
pub async fn memory_pool() -> SqlitePool {
    db::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory database should open")
}

pub fn scores(overall: f64) -> FormScores {
    FormScores {
        overall,
        knee_alignment: 90.0,
        back_position: 90.0,
        hip_alignment: 90.0,
        range_of_motion: 90.0,
        tempo: 90.0,
    }
}

pub fn measured_at(user_id: &str, exercise: Exercise, date: DateTime<Utc>, overall: f64) -> MeasuredSession {
    MeasuredSession {
        id: uuid::Uuid::now_v7().to_string(),
        user_id: user_id.to_string(),
        exercise,
        date: date.trunc_subsecs(3),
        session_duration: 300,
        total_reps: 10,
        form_scores: scores(overall),
        injury_alerts: Vec::new(),
        rep_data: Vec::new(),
    }
}

/// 저장 가능한 세션 (파생 필드는 고정값)
pub fn session_at(user_id: &str, exercise: Exercise, date: DateTime<Utc>, overall: f64) -> FormSession {
    measured_at(user_id, exercise, date, overall).into_enriched(
        Improvements::first_session(),
        vec![Recommendation {
            text: "Excellent form! Focus on progressive overload".to_string(),
            priority: Priority::Low,
            category: Category::Form,
        }],
        AiSuggestions {
            optimal_rep_range: RepRange { min: 8, max: 12 },
            suggested_sets: 3,
            rest_time: 60,
            reasoning: "fixture".to_string(),
        },
    )
}
