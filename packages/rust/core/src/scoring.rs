//! Lead scoring.
//!
//! Two rule sets selected by form kind. Both clamp to `[0, 100]` and share
//! the tier cut points in [`QualityTier::from_score`].

use std::collections::HashSet;

use leadbridge_shared::{FormKind, LeadSubmission, QualityTier, ScoreResult};
use serde_json::Value;

/// Points for the weakest answer to one assessment question.
pub const MIN_POINTS_PER_QUESTION: u32 = 1;

/// Points for the best possible answer to one assessment question.
pub const MAX_POINTS_PER_QUESTION: u32 = 4;

/// Number of questions in the standard assessment.
pub const STANDARD_QUESTION_COUNT: usize = 6;

/// Integration code for the CRM the leads are written to.
pub const CRM_INTEGRATION: &str = "gohighlevel";

const ONBOARDING_BASE: i64 = 50;

/// Score a normalized submission.
pub fn score(submission: &LeadSubmission) -> ScoreResult {
    let raw = match submission.form_kind() {
        FormKind::Assessment => assessment_score(submission),
        FormKind::Onboarding => onboarding_score(submission),
    };
    let result = ScoreResult::from_raw(raw);
    debug_assert_eq!(result.quality_tier, QualityTier::from_score(result.numeric_score));
    result
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

fn assessment_score(submission: &LeadSubmission) -> i64 {
    let answers = submission.raw_answers().unwrap_or_default();
    if answers.is_empty() {
        return 0;
    }

    // Each answer stays on the 1-4 scale whatever the client sent.
    let earned: u64 = answers
        .iter()
        .map(|a| u64::from(a.score.clamp(MIN_POINTS_PER_QUESTION, MAX_POINTS_PER_QUESTION)))
        .sum();
    let questions = answers.len().max(STANDARD_QUESTION_COUNT) as u64;
    let attainable = questions * u64::from(MAX_POINTS_PER_QUESTION);

    (earned as f64 / attainable as f64 * 100.0).round() as i64
}

// ---------------------------------------------------------------------------
// Onboarding
// ---------------------------------------------------------------------------

fn onboarding_score(submission: &LeadSubmission) -> i64 {
    let business_type = submission
        .attribute("business_type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let plan = submission
        .attribute("selected_plan")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let goals = distinct_codes(submission.attribute("content_goals"));
    let integrations = distinct_codes(submission.attribute("integrations"));

    ONBOARDING_BASE
        + business_type_bonus(business_type)
        + plan_bonus(plan)
        + content_goal_bonus(goals.len())
        + integration_bonus(&integrations)
}

fn business_type_bonus(code: &str) -> i64 {
    match code.trim() {
        "agency" | "saas" => 10,
        "ecommerce" => 8,
        "professional-services" => 7,
        "local-business" | "coach-consultant" | "other" => 5,
        _ => 0,
    }
}

fn plan_bonus(code: &str) -> i64 {
    match code.trim() {
        "complete-system" => 20,
        "growth" => 15,
        "starter" => 10,
        _ => 0,
    }
}

fn content_goal_bonus(count: usize) -> i64 {
    match count {
        0 => 0,
        1 => 5,
        2..=3 => 10,
        _ => 15,
    }
}

fn integration_bonus(codes: &HashSet<String>) -> i64 {
    let volume = match codes.len() {
        0 => 0,
        1..=2 => 5,
        _ => 10,
    };
    let crm = if codes.contains(CRM_INTEGRATION) { 10 } else { 0 };
    volume + crm
}

/// Distinct, non-empty string codes from an array attribute.
fn distinct_codes(value: Option<&Value>) -> HashSet<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => {
            HashSet::from([s.trim().to_string()])
        }
        _ => HashSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadbridge_shared::{AssessmentAnswer, Attributes, Contact};
    use serde_json::json;

    fn contact() -> Contact {
        Contact {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            phone: None,
        }
    }

    fn onboarding(attrs: Value) -> LeadSubmission {
        let Value::Object(map) = attrs else {
            panic!("attributes must be an object");
        };
        LeadSubmission::onboarding(contact(), map)
    }

    fn assessment(points: &[u32]) -> LeadSubmission {
        let answers = points
            .iter()
            .enumerate()
            .map(|(i, &score)| AssessmentAnswer {
                question_id: format!("q{}", i + 1),
                question: None,
                answer: format!("answer {score}"),
                score,
            })
            .collect();
        LeadSubmission::assessment(contact(), Attributes::new(), answers)
    }

    #[test]
    fn hot_onboarding_example() {
        let sub = onboarding(json!({
            "business_type": "agency",
            "selected_plan": "complete-system",
            "content_goals": ["blog-posts", "social-media", "email-newsletters", "seo"],
            "integrations": ["gohighlevel", "stripe", "calendly"],
        }));
        let result = score(&sub);
        assert!(result.numeric_score >= 75);
        assert_eq!(result.quality_tier, QualityTier::Hot);
    }

    #[test]
    fn bare_onboarding_is_warm_at_base() {
        let result = score(&onboarding(json!({})));
        assert_eq!(result.numeric_score, 50);
        assert_eq!(result.quality_tier, QualityTier::Warm);
    }

    #[test]
    fn onboarding_bonuses_add_up() {
        let sub = onboarding(json!({
            "business_type": "local-business",
            "selected_plan": "starter",
            "content_goals": ["blog-posts"],
            "integrations": ["stripe"],
        }));
        // 50 + 5 + 10 + 5 + 5
        assert_eq!(score(&sub).numeric_score, 75);
    }

    #[test]
    fn unknown_codes_earn_nothing() {
        let sub = onboarding(json!({
            "business_type": "franchise",
            "selected_plan": "enterprise-custom",
        }));
        assert_eq!(score(&sub).numeric_score, 50);
    }

    #[test]
    fn duplicate_goals_count_once() {
        let sub = onboarding(json!({"content_goals": ["seo", "seo", "seo", "seo"]}));
        assert_eq!(score(&sub).numeric_score, 55);
    }

    #[test]
    fn adding_an_integration_never_lowers_the_score() {
        let pool = [
            "gohighlevel",
            "stripe",
            "calendly",
            "zapier",
            "mailchimp",
            "stripe",
            "",
        ];
        for start in 0..pool.len() {
            let mut selected: Vec<&str> = Vec::new();
            let mut previous = score(&onboarding(json!({"integrations": selected}))).numeric_score;
            for code in pool.iter().cycle().skip(start).take(pool.len()) {
                selected.push(*code);
                let current =
                    score(&onboarding(json!({"integrations": selected}))).numeric_score;
                assert!(current >= previous, "{selected:?}: {current} < {previous}");
                previous = current;
            }
        }
    }

    #[test]
    fn crm_integration_earns_extra() {
        let without = score(&onboarding(json!({"integrations": ["stripe"]})));
        let with = score(&onboarding(json!({"integrations": ["gohighlevel"]})));
        assert_eq!(with.numeric_score - without.numeric_score, 10);
    }

    #[test]
    fn minimum_assessment_example() {
        let result = score(&assessment(&[1, 1, 1, 1, 1, 1]));
        assert_eq!(result.numeric_score, 25);
        assert_eq!(result.quality_tier, QualityTier::Cold);
    }

    #[test]
    fn perfect_assessment_is_hot() {
        let result = score(&assessment(&[4, 4, 4, 4, 4, 4]));
        assert_eq!(result.numeric_score, 100);
        assert_eq!(result.quality_tier, QualityTier::Hot);
    }

    #[test]
    fn assessment_rounds_to_nearest() {
        // 13 / 24 = 54.17%
        assert_eq!(score(&assessment(&[3, 2, 2, 2, 2, 2])).numeric_score, 54);
        // 18 / 24 = 75%
        let result = score(&assessment(&[3, 3, 3, 3, 3, 3]));
        assert_eq!(result.numeric_score, 75);
        assert_eq!(result.quality_tier, QualityTier::Hot);
    }

    #[test]
    fn skipped_questions_still_count_toward_maximum() {
        // 4 of 6 answered at full marks: 16 / 24
        assert_eq!(score(&assessment(&[4, 4, 4, 4])).numeric_score, 67);
    }

    #[test]
    fn no_answers_scores_zero() {
        let result = score(&assessment(&[]));
        assert_eq!(result.numeric_score, 0);
        assert_eq!(result.quality_tier, QualityTier::Cold);
    }

    #[test]
    fn inflated_answers_are_clamped() {
        let result = score(&assessment(&[40, 40, 40, 40, 40, 40]));
        assert_eq!(result.numeric_score, 100);
    }

    #[test]
    fn one_inflated_answer_cannot_make_a_lead_hot() {
        // Clamped to 4 + 1 + 1 + 1 + 1 + 1 = 9 of 24
        let result = score(&assessment(&[24, 0, 0, 0, 0, 0]));
        assert_eq!(result.numeric_score, 38);
        assert_eq!(result.quality_tier, QualityTier::Cold);
    }

    #[test]
    fn out_of_scale_answers_are_held_to_the_scale() {
        assert_eq!(
            score(&assessment(&[0, 0, 0, 0, 0, 0])),
            score(&assessment(&[1, 1, 1, 1, 1, 1]))
        );
        assert_eq!(score(&assessment(&[9, 9, 9, 9, 9, 9])).numeric_score, 100);
    }

    #[test]
    fn scores_always_in_range() {
        let crafted = [
            onboarding(json!({
                "business_type": "saas",
                "selected_plan": "complete-system",
                "content_goals": ["a", "b", "c", "d", "e", "f", "g"],
                "integrations": ["gohighlevel", "a", "b", "c", "d"],
            })),
            onboarding(json!({"business_type": 42, "content_goals": "seo"})),
            assessment(&[u32::MAX, u32::MAX]),
            assessment(&[0, 0, 0]),
        ];
        for sub in &crafted {
            assert!(score(sub).numeric_score <= 100);
        }
    }
}
