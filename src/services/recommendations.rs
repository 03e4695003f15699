//! # 자세 추천 (Recommendation Engine)
//!
//! 세부 점수만 보고 추천 목록을 만드는 순수 함수입니다. I/O 없음.
//!
//! 규칙은 `RULES` 테이블에 순서대로 정의되어 있고, 각 규칙은 서로 독립적으로 평가됩니다.
//! 여러 규칙이 동시에 걸리면 테이블 순서대로 모두 추가됩니다.
//! 아무 규칙도 걸리지 않으면 "점진적 과부하" 추천 하나를 돌려주므로 목록은 비지 않습니다.

use crate::models::*;

/// 예: "knee < 70이면 high/alignment 추천"
struct Rule {
    fires: fn(&FormScores) -> bool,
    priority: Priority,
    category: Category,
    text: fn(Exercise) -> &'static str,
}

fn knee_misaligned(scores: &FormScores) -> bool {
    scores.knee_alignment < 70.0
}

fn back_compromised(scores: &FormScores) -> bool {
    scores.back_position < 70.0
}

fn hips_unstable(scores: &FormScores) -> bool {
    scores.hip_alignment < 75.0
}

fn range_limited(scores: &FormScores) -> bool {
    scores.range_of_motion < 75.0
}

fn tempo_uncontrolled(scores: &FormScores) -> bool {
    scores.tempo < 70.0
}

fn knee_text(_: Exercise) -> &'static str {
    "Focus on knee tracking - keep knees aligned with toes"
}

fn back_text(exercise: Exercise) -> &'static str {
    match exercise {
        Exercise::Squat => "Maintain upright torso - engage core and keep chest up",
        _ => "Keep spine neutral - avoid sagging or arching",
    }
}

fn hip_text(_: Exercise) -> &'static str {
    "Improve hip stability and symmetry"
}

fn range_text(_: Exercise) -> &'static str {
    "Work on flexibility to achieve full range of motion"
}

fn tempo_text(_: Exercise) -> &'static str {
    "Control your tempo - slower reps build better strength"
}

static RULES: [Rule; 5] = [
    Rule {
        fires: knee_misaligned,
        priority: Priority::High,
        category: Category::Alignment,
        text: knee_text,
    },
    Rule {
        fires: back_compromised,
        priority: Priority::High,
        category: Category::Form,
        text: back_text,
    },
    Rule {
        fires: hips_unstable,
        priority: Priority::Medium,
        category: Category::Alignment,
        text: hip_text,
    },
    Rule {
        fires: range_limited,
        priority: Priority::Medium,
        category: Category::Range,
        text: range_text,
    },
    Rule {
        fires: tempo_uncontrolled,
        priority: Priority::Medium,
        category: Category::Tempo,
        text: tempo_text,
    },
];

pub const PROGRESSIVE_OVERLOAD_TEXT: &str = "Excellent form! Focus on progressive overload";

/// 세부 점수로부터 우선순위가 매겨진 추천 목록을 만듭니다.
pub fn generate_recommendations(scores: &FormScores, exercise: Exercise) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = RULES
        .iter()
        .filter(|rule| (rule.fires)(scores))
        .map(|rule| Recommendation {
            text: (rule.text)(exercise).to_string(),
            priority: rule.priority,
            category: rule.category,
        })
        .collect();

    if recommendations.is_empty() {
        recommendations.push(Recommendation {
            text: PROGRESSIVE_OVERLOAD_TEXT.to_string(),
            priority: Priority::Low,
            category: Category::Form,
        });
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(knee: f64, back: f64, hip: f64, rom: f64, tempo: f64) -> FormScores {
        FormScores {
            overall: 80.0,
            knee_alignment: knee,
            back_position: back,
            hip_alignment: hip,
            range_of_motion: rom,
            tempo,
        }
    }

    #[test]
    fn knee_and_back_fire_independently_in_order() {
        let recs = generate_recommendations(&scores(60.0, 60.0, 90.0, 90.0, 90.0), Exercise::Pushup);

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].category, Category::Alignment);
        assert!(recs[0].text.contains("knee tracking"));
        assert_eq!(recs[1].category, Category::Form);
        assert_eq!(recs[1].text, "Keep spine neutral - avoid sagging or arching");
        assert!(recs.iter().all(|r| r.priority == Priority::High));
    }

    #[test]
    fn back_text_is_squat_specific() {
        let recs = generate_recommendations(&scores(90.0, 50.0, 90.0, 90.0, 90.0), Exercise::Squat);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].text, "Maintain upright torso - engage core and keep chest up");
    }

    #[test]
    fn all_rules_fire_in_table_order() {
        let recs = generate_recommendations(&scores(0.0, 0.0, 0.0, 0.0, 0.0), Exercise::Deadlift);
        let categories: Vec<Category> = recs.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::Alignment,
                Category::Form,
                Category::Alignment,
                Category::Range,
                Category::Tempo
            ]
        );
        let priorities: Vec<Priority> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(
            priorities,
            vec![Priority::High, Priority::High, Priority::Medium, Priority::Medium, Priority::Medium]
        );
    }

    #[test]
    fn thresholds_are_exclusive() {
        // 정확히 임계값이면 규칙이 걸리지 않음
        let recs = generate_recommendations(&scores(70.0, 70.0, 75.0, 75.0, 70.0), Exercise::Plank);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::Low);
    }

    #[test]
    fn high_scores_get_single_progressive_overload_tip() {
        for exercise in Exercise::ALL {
            let recs = generate_recommendations(&scores(90.0, 95.0, 92.0, 99.0, 90.0), exercise);
            assert_eq!(
                recs,
                vec![Recommendation {
                    text: PROGRESSIVE_OVERLOAD_TEXT.to_string(),
                    priority: Priority::Low,
                    category: Category::Form,
                }]
            );
        }
    }
}
