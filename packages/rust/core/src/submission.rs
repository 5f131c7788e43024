//! Inbound form shapes and their normalization into [`LeadSubmission`].
//!
//! The UI posts a JSON object tagged with `formKind`. The tag is mandatory;
//! nothing downstream guesses the form from which fields happen to be set.

use chrono::{DateTime, Utc};
use leadbridge_shared::{
    AssessmentAnswer, Attributes, Contact, LeadBridgeError, LeadSubmission, Result,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

// ---------------------------------------------------------------------------
// Inbound shapes
// ---------------------------------------------------------------------------

/// A raw submission as posted by the UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "formKind", rename_all = "camelCase")]
pub enum InboundSubmission {
    Onboarding(OnboardingForm),
    Assessment(AssessmentForm),
}

/// Multi-step onboarding wizard payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingForm {
    pub contact_info: ContactInfo,
    #[serde(default)]
    pub business_info: BusinessInfo,
    #[serde(default)]
    pub content_goals: Vec<String>,
    #[serde(default)]
    pub integrations: Vec<String>,
    pub selected_plan: Option<String>,
    pub timeline: Option<String>,
    pub brand_voice: Option<String>,
    pub launch_date: Option<String>,
    pub additional_notes: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Wizard step 1.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Wizard step 2.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessInfo {
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub website: Option<String>,
    pub team_size: Option<String>,
    pub monthly_budget: Option<String>,
    pub target_audience: Option<String>,
}

/// Readiness assessment payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentForm {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub biggest_challenge: Option<String>,
    #[serde(default)]
    pub marketing_channels: Vec<String>,
    pub monthly_marketing_budget: Option<String>,
    #[serde(default)]
    pub answers: Vec<AssessmentAnswer>,
    /// Percentage computed client-side. Informational only.
    pub score_percentage: Option<f64>,
    pub submitted_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Decode an inbound JSON body.
pub fn parse_submission(body: &str) -> Result<InboundSubmission> {
    serde_json::from_str(body)
        .map_err(|e| LeadBridgeError::parse(format!("invalid submission: {e}")))
}

/// Flatten either form shape into a [`LeadSubmission`].
pub fn normalize_submission(inbound: InboundSubmission) -> Result<LeadSubmission> {
    let submission = match inbound {
        InboundSubmission::Onboarding(form) => normalize_onboarding(form)?,
        InboundSubmission::Assessment(form) => normalize_assessment(form)?,
    };

    debug!(
        id = %submission.id(),
        form_kind = %submission.form_kind(),
        attributes = submission.attributes().len(),
        "submission normalized"
    );
    Ok(submission)
}

fn normalize_onboarding(form: OnboardingForm) -> Result<LeadSubmission> {
    let contact = build_contact(
        form.contact_info.first_name,
        form.contact_info.last_name,
        form.contact_info.email,
        form.contact_info.phone,
    )?;

    let business = form.business_info;
    let mut attrs = Attributes::new();
    put_str(&mut attrs, "business_name", business.business_name);
    put_str(&mut attrs, "business_type", business.business_type);
    put_str(&mut attrs, "website_url", business.website);
    put_str(&mut attrs, "team_size", business.team_size);
    put_str(&mut attrs, "monthly_budget", business.monthly_budget);
    put_str(&mut attrs, "target_audience", business.target_audience);
    put_list(&mut attrs, "content_goals", form.content_goals);
    put_list(&mut attrs, "integrations", form.integrations);
    put_str(&mut attrs, "selected_plan", form.selected_plan);
    put_str(&mut attrs, "timeline", form.timeline);
    put_str(&mut attrs, "brand_voice", form.brand_voice);
    put_str(&mut attrs, "launch_date", form.launch_date);
    put_str(&mut attrs, "additional_notes", form.additional_notes);

    let submission = LeadSubmission::onboarding(contact, attrs);
    Ok(match form.submitted_at {
        Some(at) => submission.with_submitted_at(at),
        None => submission,
    })
}

fn normalize_assessment(form: AssessmentForm) -> Result<LeadSubmission> {
    let contact = build_contact(form.first_name, form.last_name, form.email, form.phone)?;

    let mut attrs = Attributes::new();
    put_str(&mut attrs, "business_name", form.company_name);
    put_str(&mut attrs, "industry", form.industry);
    put_str(&mut attrs, "company_size", form.company_size);
    put_str(&mut attrs, "biggest_challenge", form.biggest_challenge);
    put_list(&mut attrs, "marketing_channels", form.marketing_channels);
    put_str(&mut attrs, "monthly_marketing_budget", form.monthly_marketing_budget);

    if !form.answers.is_empty() {
        attrs.insert(
            "assessment_responses".into(),
            Value::Object(responses_by_question(&form.answers)),
        );
    }

    if let Some(pct) = form.score_percentage.and_then(serde_json::Number::from_f64) {
        attrs.insert("reported_score".into(), Value::Number(pct));
    }

    let submission = LeadSubmission::assessment(contact, attrs, form.answers);
    Ok(match form.submitted_at {
        Some(at) => submission.with_submitted_at(at),
        None => submission,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Question label → answer, in answer order. A repeated label is prefixed
/// with its question id (and a counter if that repeats too) so every answer
/// keeps its own entry.
fn responses_by_question(answers: &[AssessmentAnswer]) -> Attributes {
    let mut responses = Attributes::new();
    for a in answers {
        let label = a
            .question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(&a.question_id);

        let mut key = label.to_string();
        if responses.contains_key(&key) {
            key = format!("{}: {label}", a.question_id);
        }
        let base = key.clone();
        let mut n = 2;
        while responses.contains_key(&key) {
            key = format!("{base} ({n})");
            n += 1;
        }

        responses.insert(key, Value::String(a.answer.trim().to_string()));
    }
    responses
}

fn build_contact(
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
) -> Result<Contact> {
    let first_name = first_name.trim().to_string();
    if first_name.is_empty() {
        return Err(LeadBridgeError::validation("first name is required"));
    }

    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(LeadBridgeError::validation("email is required"));
    }
    if !email.contains('@') {
        return Err(LeadBridgeError::validation(format!(
            "email '{email}' is not a valid address"
        )));
    }

    Ok(Contact {
        first_name,
        last_name: last_name.trim().to_string(),
        email,
        phone: clean(phone),
    })
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn put_str(attrs: &mut Attributes, key: &str, value: Option<String>) {
    if let Some(v) = clean(value) {
        attrs.insert(key.to_string(), Value::String(v));
    }
}

fn put_list(attrs: &mut Attributes, key: &str, values: Vec<String>) {
    let items: Vec<Value> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(Value::String)
        .collect();
    if !items.is_empty() {
        attrs.insert(key.to_string(), Value::Array(items));
    }
}
