//! # 폼 분석 세션 모델 정의
//!
//! 자세 추정 프로세스가 운동 한 세트를 끝내면 반복(rep)별 측정값 묶음을 보내옵니다.
//! 이 모듈은 그 측정값과, 저장 전에 한 번만 계산되는 파생 필드
//! (개선도, 추천, 다음 세션 처방)를 담는 구조체들을 정의합니다.
//!
//! ## 세션 흐름
//! 1. `SaveFormAnalysisRequest` 수신 → 검증 후 `MeasuredSession` 생성
//! 2. 개선도 → 추천 → AI 처방 순서로 파생 필드 계산
//! 3. `MeasuredSession::into_enriched()`로 완성된 `FormSession`을 만들어 한 번만 저장
//!
//! JSON 필드 이름은 프론트엔드와 맞추기 위해 camelCase를 사용합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 지원하는 운동 종류 (닫힌 열거형)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    Squat,
    Pushup,
    BicepCurl,
    Plank,
    Lunges,
    Deadlift,
}

impl Exercise {
    pub const ALL: [Exercise; 6] = [
        Exercise::Squat,
        Exercise::Pushup,
        Exercise::BicepCurl,
        Exercise::Plank,
        Exercise::Lunges,
        Exercise::Deadlift,
    ];

    /// DB 컬럼과 URL 경로에 쓰이는 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Exercise::Squat => "squat",
            Exercise::Pushup => "pushup",
            Exercise::BicepCurl => "bicep_curl",
            Exercise::Plank => "plank",
            Exercise::Lunges => "lunges",
            Exercise::Deadlift => "deadlift",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 알 수 없는 운동 이름을 파싱하려 할 때의 에러
#[derive(Debug, Error)]
#[error("Unknown exercise: {0}")]
pub struct UnknownExercise(pub String);

impl FromStr for Exercise {
    type Err = UnknownExercise;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Exercise::ALL
            .into_iter()
            .find(|exercise| exercise.as_str() == s)
            .ok_or_else(|| UnknownExercise(s.to_string()))
    }
}

/// 자세 점수 — 각 항목은 0~100 범위 (측정 측에서 이미 clamp됨)
///
/// `overall`은 상위 측정 프로세스가 준 값을 그대로 사용하며 여기서 재계산하지 않습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormScores {
    pub overall: f64,
    pub knee_alignment: f64,
    pub back_position: f64,
    pub hip_alignment: f64,
    pub range_of_motion: f64,
    pub tempo: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// 세션 중 감지된 부상 위험 경고
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjuryAlert {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub severity: Severity,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    Incomplete,
}

/// 한 반복 동안의 관절 각도 통계 (도 단위)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleStats {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

/// 반복(rep)별 상세 기록 — 점수 계산에는 쓰지 않고 그대로 보존합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepData {
    pub rep_number: u32,
    pub quality: RepQuality,
    #[serde(default)]
    pub score: f64,
    /// 밀리초
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub angles: AngleStats,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// 점수 변화의 정성적 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    New,
}

/// 같은 운동의 직전 세션 대비 변화 (저장 시점에 한 번 계산)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvements {
    /// 부호 있는 점수 차이. 점수가 이미 0~100이므로 "퍼센트"로 부릅니다.
    pub from_last_session: f64,
    pub trend: Trend,
}

impl Improvements {
    /// 비교할 이전 세션이 없을 때의 값
    pub fn first_session() -> Self {
        Self {
            from_last_session: 0.0,
            trend: Trend::New,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Form,
    Tempo,
    Range,
    Alignment,
    Safety,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub priority: Priority,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRange {
    pub min: u32,
    pub max: u32,
}

/// 다음 세션 처방 (반복 범위, 세트 수, 휴식 시간)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSuggestions {
    pub optimal_rep_range: RepRange,
    pub suggested_sets: u32,
    /// 세트 간 휴식 (초)
    pub rest_time: u32,
    pub reasoning: String,
}

/// `POST /api/v1/form-analysis/save`의 요청 본문
///
/// 필수 필드(`exercise`, `totalReps`)도 `Option`으로 받아서,
/// 누락 시 JSON 파싱 에러 대신 명확한 400 메시지를 돌려줍니다.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFormAnalysisRequest {
    pub exercise: Option<String>,
    pub total_reps: Option<u32>,
    pub session_duration: Option<u32>,
    pub form_scores: Option<FormScores>,
    pub injury_alerts: Option<Vec<InjuryAlert>>,
    pub rep_data: Option<Vec<RepData>>,
}

/// 검증을 통과했지만 아직 파생 필드가 없는 세션
///
/// 이 타입은 저장할 수 없습니다. 저장소는 `FormSession`만 받으므로,
/// 파생 필드가 절반만 채워진 세션이 저장되는 일이 타입 수준에서 막힙니다.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredSession {
    pub id: String,
    pub user_id: String,
    pub exercise: Exercise,
    pub date: DateTime<Utc>,
    pub session_duration: u32,
    pub total_reps: u32,
    pub form_scores: FormScores,
    pub injury_alerts: Vec<InjuryAlert>,
    pub rep_data: Vec<RepData>,
}

impl MeasuredSession {
    /// 세 단계의 파생 결과를 붙여 저장 가능한 세션을 만듭니다.
    pub fn into_enriched(
        self,
        improvements: Improvements,
        recommendations: Vec<Recommendation>,
        ai_suggestions: AiSuggestions,
    ) -> FormSession {
        FormSession {
            id: self.id,
            user_id: self.user_id,
            exercise: self.exercise,
            date: self.date,
            session_duration: self.session_duration,
            total_reps: self.total_reps,
            form_scores: self.form_scores,
            injury_alerts: self.injury_alerts,
            rep_data: self.rep_data,
            improvements,
            recommendations,
            ai_suggestions,
            created_at: self.date,
            updated_at: self.date,
        }
    }
}

/// 폼 분석 세션 엔티티 — DB의 `form_sessions` 테이블 한 행에 대응합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSession {
    pub id: String,
    pub user_id: String,
    pub exercise: Exercise,
    /// 세션 생성 시각. 기록 정렬 기준이기도 합니다.
    pub date: DateTime<Utc>,
    pub session_duration: u32,
    pub total_reps: u32,
    pub form_scores: FormScores,
    pub injury_alerts: Vec<InjuryAlert>,
    pub rep_data: Vec<RepData>,
    pub improvements: Improvements,
    pub recommendations: Vec<Recommendation>,
    pub ai_suggestions: AiSuggestions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /form-analysis/history/{exercise}` 응답
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<FormSession>,
    pub trend: Trend,
}

/// 운동 종류별 누적 통계
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
    pub exercise: Exercise,
    pub total_sessions: i64,
    pub avg_form_score: f64,
    pub total_reps: i64,
    pub total_injury_alerts: i64,
    pub latest_session: DateTime<Utc>,
    pub best_form_score: f64,
}

/// 추세 그래프의 한 점
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub overall_score: f64,
    pub knee_alignment: f64,
    pub back_position: f64,
    pub hip_alignment: f64,
    pub had_injury_alerts: bool,
}

/// `GET /form-analysis/trends/{exercise}` 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsAnalysis {
    pub exercise: Exercise,
    pub period: String,
    pub data_points: usize,
    pub trends: Vec<TrendPoint>,
    pub average_improvement: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exercise_round_trips_through_str() {
        for exercise in Exercise::ALL {
            assert_eq!(exercise.as_str().parse::<Exercise>().unwrap(), exercise);
        }
        assert!("burpee".parse::<Exercise>().is_err());
    }

    #[test]
    fn request_accepts_camel_case_and_defaults_missing_scores() {
        let req: SaveFormAnalysisRequest = serde_json::from_str(
            r#"{"exercise":"bicep_curl","totalReps":12,"formScores":{"overall":81,"tempo":64}}"#,
        )
        .unwrap();

        let scores = req.form_scores.unwrap();
        assert_eq!(req.exercise.as_deref(), Some("bicep_curl"));
        assert_eq!(req.total_reps, Some(12));
        assert_eq!(scores.overall, 81.0);
        assert_eq!(scores.tempo, 64.0);
        assert_eq!(scores.knee_alignment, 0.0);
        assert!(req.injury_alerts.is_none());
    }

    #[test]
    fn derived_fields_serialize_with_wire_names() {
        let suggestions = AiSuggestions {
            optimal_rep_range: RepRange { min: 8, max: 12 },
            suggested_sets: 3,
            rest_time: 60,
            reasoning: "ok".to_string(),
        };
        let value = serde_json::to_value(&suggestions).unwrap();
        assert_eq!(value["optimalRepRange"]["max"], 12);
        assert_eq!(value["restTime"], 60);

        let value = serde_json::to_value(Improvements::first_session()).unwrap();
        assert_eq!(value["fromLastSession"], 0.0);
        assert_eq!(value["trend"], "new");
    }
}
