//! # 다음 세션 처방 (Adaptive Prescription Advisor)
//!
//! 현재 세션 점수, 부상 경고, 직전 대비 개선도를 프롬프트로 만들어
//! 생성형 텍스트 서비스에 다음 세션의 반복 범위/세트 수/휴식 시간을 묻습니다.
//!
//! ## 응답 처리
//! 모델은 JSON 앞뒤에 설명을 붙이기도 하므로, 텍스트에서 처음으로
//! 온전히 파싱되는 `{ ... }` 객체를 찾아 사용합니다.
//!
//! ## 실패 처리
//! 어떤 실패도 호출자에게 올리지 않고 고정 처방(8~12회, 3세트, 60초)으로 대체합니다.
//! 대체 이유는 두 가지 문구로 구분됩니다.
//! - 서비스 에러, 타임아웃, JSON 파싱 실패 → `FALLBACK_AI_UNAVAILABLE`
//! - JSON 객체가 아예 없거나, 값이 쓸 수 없는 범위 → `FALLBACK_STANDARD`

use crate::llm::TextCompletion;
use crate::models::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const FALLBACK_AI_UNAVAILABLE: &str = "Standard recommendation - AI unavailable.";
pub const FALLBACK_STANDARD: &str = "Standard recommendation based on form data.";

const FALLBACK_REP_RANGE: RepRange = RepRange { min: 8, max: 12 };
const FALLBACK_SETS: u32 = 3;
const FALLBACK_REST_SECS: u32 = 60;

/// 고정 처방
pub fn fallback(reasoning: &str) -> AiSuggestions {
    AiSuggestions {
        optimal_rep_range: FALLBACK_REP_RANGE,
        suggested_sets: FALLBACK_SETS,
        rest_time: FALLBACK_REST_SECS,
        reasoning: reasoning.to_string(),
    }
}

/// 모델 응답을 처방으로 바꾸지 못한 이유
#[derive(Debug, PartialEq)]
pub enum ParseFailure {
    /// `{`가 하나도 없음
    NoJson,
    /// JSON처럼 보이지만 처방 형태로 파싱되지 않음
    Malformed(String),
    /// 파싱은 됐지만 값이 말이 안 됨 (min > max, 0세트 등)
    Unusable,
}

/// 응답 텍스트에서 첫 번째로 파싱되는 처방 JSON 객체를 찾습니다.
pub fn parse_suggestions(text: &str) -> Result<AiSuggestions, ParseFailure> {
    let mut first_error = None;

    for (start, _) in text.match_indices('{') {
        // 스트림 디시리얼라이저는 첫 값만 읽고 뒤따르는 설명문은 보지 않음
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<AiSuggestions>();
        match values.next() {
            Some(Ok(suggestions)) => return validate(suggestions),
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
            None => {}
        }
    }

    Err(match first_error {
        Some(e) => ParseFailure::Malformed(e),
        None => ParseFailure::NoJson,
    })
}

fn validate(suggestions: AiSuggestions) -> Result<AiSuggestions, ParseFailure> {
    let range = suggestions.optimal_rep_range;
    if range.min == 0 || range.min > range.max || suggestions.suggested_sets == 0 {
        return Err(ParseFailure::Unusable);
    }
    Ok(suggestions)
}

/// 처방 요청 프롬프트
pub fn build_prompt(
    exercise: Exercise,
    session: &MeasuredSession,
    injury_alerts: &[InjuryAlert],
    improvement_pct: f64,
) -> String {
    let scores = &session.form_scores;
    let issues = if injury_alerts.is_empty() {
        "None".to_string()
    } else {
        injury_alerts
            .iter()
            .map(|alert| alert.issue.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        r#"You are a certified personal trainer analyzing workout form data.

Exercise: {exercise}
User's form scores (out of 100):
- Overall: {overall}
- Knee Alignment: {knee}
- Back Position: {back}
- Hip Alignment: {hip}
- Range of Motion: {rom}
- Tempo: {tempo}

Total Reps: {reps}
Recent Injury Alerts: {issues}
Improvement from Last Session: {improvement_pct}%

Based on this data, provide:
1. Optimal rep range (min-max) for next session
2. Suggested number of sets
3. Recommended rest time between sets (in seconds)
4. Brief reasoning (max 2 sentences)

Respond in JSON format:
{{
  "optimalRepRange": {{"min": number, "max": number}},
  "suggestedSets": number,
  "restTime": number,
  "reasoning": "string"
}}"#,
        overall = scores.overall,
        knee = scores.knee_alignment,
        back = scores.back_position,
        hip = scores.hip_alignment,
        rom = scores.range_of_motion,
        tempo = scores.tempo,
        reps = session.total_reps,
    )
}

/// 생성형 텍스트 서비스를 감싼 처방기
///
/// 호출은 한 번만 시도하고 `timeout`을 넘기면 실패로 취급합니다.
#[derive(Clone)]
pub struct Advisor {
    completion: Arc<dyn TextCompletion>,
    timeout: Duration,
}

impl Advisor {
    pub fn new(completion: Arc<dyn TextCompletion>, timeout: Duration) -> Self {
        Self { completion, timeout }
    }

    /// 다음 세션 처방을 만듭니다. 실패하지 않습니다.
    pub async fn suggest_next_session(
        &self,
        exercise: Exercise,
        session: &MeasuredSession,
        injury_alerts: &[InjuryAlert],
        improvement_pct: f64,
    ) -> AiSuggestions {
        let prompt = build_prompt(exercise, session, injury_alerts, improvement_pct);

        let response = match tokio::time::timeout(self.timeout, self.completion.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "Next-session advice unavailable, using fallback");
                return fallback(FALLBACK_AI_UNAVAILABLE);
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Next-session advice timed out, using fallback");
                return fallback(FALLBACK_AI_UNAVAILABLE);
            }
        };

        match parse_suggestions(&response) {
            Ok(suggestions) => {
                debug!(sets = suggestions.suggested_sets, "Parsed next-session advice");
                suggestions
            }
            Err(ParseFailure::Malformed(e)) => {
                warn!(error = %e, "Could not parse next-session advice, using fallback");
                fallback(FALLBACK_AI_UNAVAILABLE)
            }
            Err(failure) => {
                warn!(?failure, "No usable next-session advice in response, using fallback");
                fallback(FALLBACK_STANDARD)
            }
        }
    }
}
