//! # 개선도 계산 (Improvement Calculator)
//!
//! 새 세션을 같은 (사용자, 운동)의 **직전 세션 하나**와 비교합니다.
//!
//! - 직전 세션이 없으면: `fromLastSession = 0`, `trend = new`
//! - 있으면: `fromLastSession = 현재 overall - 직전 overall`
//!   - 차이 > 5 → improving, 차이 < -5 → declining, 그 외 stable (경계값 ±5는 stable)
//!
//! 조회 실패는 그대로 호출자에게 전파됩니다. 개선도를 모르는 세션은 저장하지 않습니다.
//! 기록 조회 API의 구간 평균 추세(`services::progress`)와는 별개의 계산입니다.

use crate::db;
use crate::error::AppError;
use crate::models::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// improving / declining을 가르는 점수 차이 (경계 미포함)
pub const TREND_THRESHOLD: f64 = 5.0;

/// 직전 세션 조회 기능
#[async_trait]
pub trait PriorSessionLookup: Send + Sync {
    /// `before`보다 엄격하게 이전인, 같은 (사용자, 운동)의 가장 최근 다른 세션
    async fn previous_session(
        &self,
        user_id: &str,
        exercise: Exercise,
        before: DateTime<Utc>,
        exclude_id: &str,
    ) -> Result<Option<FormSession>, AppError>;
}

#[async_trait]
impl PriorSessionLookup for SqlitePool {
    async fn previous_session(
        &self,
        user_id: &str,
        exercise: Exercise,
        before: DateTime<Utc>,
        exclude_id: &str,
    ) -> Result<Option<FormSession>, AppError> {
        db::find_previous_session(self, user_id, exercise, before, exclude_id).await
    }
}

/// 점수 차이를 추세로 분류합니다.
pub fn classify_change(difference: f64) -> Trend {
    if difference > TREND_THRESHOLD {
        Trend::Improving
    } else if difference < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// 현재 세션의 직전 세션 대비 개선도를 계산합니다.
pub async fn compute_improvement<L>(
    current: &MeasuredSession,
    history: &L,
) -> Result<Improvements, AppError>
where
    L: PriorSessionLookup + ?Sized,
{
    let prior = history
        .previous_session(&current.user_id, current.exercise, current.date, &current.id)
        .await?;

    let Some(prior) = prior else {
        return Ok(Improvements::first_session());
    };

    let difference = current.form_scores.overall - prior.form_scores.overall;
    Ok(Improvements {
        from_last_session: difference,
        trend: classify_change(difference),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{measured_at, session_at};
    use chrono::Duration;

    /// 고정된 직전 세션을 돌려주는 대역
    struct FixedPrior(Option<FormSession>);

    #[async_trait]
    impl PriorSessionLookup for FixedPrior {
        async fn previous_session(
            &self,
            _user_id: &str,
            _exercise: Exercise,
            _before: DateTime<Utc>,
            _exclude_id: &str,
        ) -> Result<Option<FormSession>, AppError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl PriorSessionLookup for BrokenStore {
        async fn previous_session(
            &self,
            _user_id: &str,
            _exercise: Exercise,
            _before: DateTime<Utc>,
            _exclude_id: &str,
        ) -> Result<Option<FormSession>, AppError> {
            Err(AppError::Database(sqlx::Error::PoolClosed))
        }
    }

    async fn improvement_between(prior_overall: f64, current_overall: f64) -> Improvements {
        let now = Utc::now();
        let prior = session_at("u1", Exercise::Squat, now - Duration::days(1), prior_overall);
        let current = measured_at("u1", Exercise::Squat, now, current_overall);
        compute_improvement(&current, &FixedPrior(Some(prior))).await.unwrap()
    }

    #[tokio::test]
    async fn first_session_is_new_with_zero_change() {
        let current = measured_at("u1", Exercise::Pushup, Utc::now(), 77.0);
        let improvements = compute_improvement(&current, &FixedPrior(None)).await.unwrap();
        assert_eq!(improvements, Improvements::first_session());
    }

    #[tokio::test]
    async fn change_is_signed_score_difference() {
        let improvements = improvement_between(70.0, 82.5).await;
        assert_eq!(improvements.from_last_session, 12.5);
        assert_eq!(improvements.trend, Trend::Improving);

        let improvements = improvement_between(80.0, 60.0).await;
        assert_eq!(improvements.from_last_session, -20.0);
        assert_eq!(improvements.trend, Trend::Declining);
    }

    #[tokio::test]
    async fn boundaries_are_stable() {
        assert_eq!(improvement_between(70.0, 75.0).await.trend, Trend::Stable);
        assert_eq!(improvement_between(75.0, 70.0).await.trend, Trend::Stable);
        assert_eq!(improvement_between(70.0, 70.0).await.trend, Trend::Stable);
        assert_eq!(improvement_between(70.0, 75.5).await.trend, Trend::Improving);
        assert_eq!(improvement_between(75.5, 70.0).await.trend, Trend::Declining);
    }

    #[tokio::test]
    async fn lookup_failure_propagates() {
        let current = measured_at("u1", Exercise::Squat, Utc::now(), 80.0);
        let result = compute_improvement(&current, &BrokenStore).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn sqlite_lookup_ignores_other_exercises() {
        let pool = crate::test_support::memory_pool().await;
        let now = Utc::now();
        let lunges = session_at("u1", Exercise::Lunges, now - Duration::days(1), 40.0);
        db::insert_session(&pool, &lunges).await.unwrap();

        let current = measured_at("u1", Exercise::Squat, now, 90.0);
        let improvements = compute_improvement(&current, &pool).await.unwrap();
        assert_eq!(improvements.trend, Trend::New);

        let squat = session_at("u1", Exercise::Squat, now - Duration::days(2), 80.0);
        db::insert_session(&pool, &squat).await.unwrap();
        let improvements = compute_improvement(&current, &pool).await.unwrap();
        assert_eq!(improvements.from_last_session, 10.0);
        assert_eq!(improvements.trend, Trend::Improving);
    }
}
