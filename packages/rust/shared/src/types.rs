//! Core domain types shared by the CRM client and the reconciliation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered semantic attribute map (insertion order is preserved).
pub type Attributes = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// FieldDataType / ExternalFieldDefinition
// ---------------------------------------------------------------------------

/// Data type of a custom field, on either side of the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum FieldDataType {
    Text,
    LongText,
    Number,
    Date,
    Checkbox,
    SingleOption,
    MultiOption,
}

impl FieldDataType {
    /// Map a data type label to a variant, accepting both our own snake_case
    /// names and the CRM's wire names. Unknown labels fall back to `Text`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "TEXT" | "PHONE" | "EMAIL" => Self::Text,
            "LONG_TEXT" | "LARGE_TEXT" | "TEXTAREA" | "TEXTBOX_LIST" => Self::LongText,
            "NUMBER" | "NUMERICAL" | "MONETORY" | "MONETARY" | "FLOAT" => Self::Number,
            "DATE" => Self::Date,
            "CHECKBOX" => Self::Checkbox,
            "SINGLE_OPTION" | "SINGLE_OPTIONS" | "RADIO" | "DROPDOWN" => Self::SingleOption,
            "MULTI_OPTION" | "MULTIPLE_OPTIONS" => Self::MultiOption,
            _ => Self::Text,
        }
    }

    /// Stable lowercase name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::LongText => "long_text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::SingleOption => "single_option",
            Self::MultiOption => "multi_option",
        }
    }
}

impl From<String> for FieldDataType {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl std::fmt::Display for FieldDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A custom field definition as published by the CRM for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFieldDefinition {
    /// Opaque CRM identifier.
    pub id: String,
    /// Human-facing field name.
    pub display_name: String,
    /// Explicit field key, possibly namespaced (e.g. `contact.business_type`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Declared data type.
    pub data_type: FieldDataType,
}

impl ExternalFieldDefinition {
    /// The field key with any namespace prefix (`contact.`) removed.
    pub fn bare_key(&self) -> Option<&str> {
        self.key.as_deref().map(strip_namespace).filter(|k| !k.is_empty())
    }
}

/// Remove a namespace prefix such as `contact.` from a field key.
pub fn strip_namespace(key: &str) -> &str {
    let key = key.trim();
    match key.rsplit_once('.') {
        Some((_, bare)) => bare,
        None => key,
    }
}

// ---------------------------------------------------------------------------
// LeadSubmission
// ---------------------------------------------------------------------------

/// Which lead-capture flow produced a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Onboarding,
    Assessment,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboarding => "onboarding",
            Self::Assessment => "assessment",
        }
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact basics, emitted even when reconciliation is degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// One answered assessment question with its embedded point value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentAnswer {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub answer: String,
    /// Points on the 1-4 scale.
    pub score: u32,
}

/// A UUID v7 wrapper for submission identifiers (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized lead submission.
///
/// Only constructible through [`LeadSubmission::onboarding`] and
/// [`LeadSubmission::assessment`], so an onboarding submission never carries
/// raw assessment answers.
#[derive(Debug, Clone, Serialize)]
pub struct LeadSubmission {
    id: SubmissionId,
    submitted_at: DateTime<Utc>,
    form_kind: FormKind,
    contact: Contact,
    attributes: Attributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_answers: Option<Vec<AssessmentAnswer>>,
}

impl LeadSubmission {
    /// Build an onboarding submission.
    pub fn onboarding(contact: Contact, attributes: Attributes) -> Self {
        Self {
            id: SubmissionId::new(),
            submitted_at: Utc::now(),
            form_kind: FormKind::Onboarding,
            contact,
            attributes,
            raw_answers: None,
        }
    }

    /// Build an assessment submission with its answer set.
    pub fn assessment(
        contact: Contact,
        attributes: Attributes,
        answers: Vec<AssessmentAnswer>,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            submitted_at: Utc::now(),
            form_kind: FormKind::Assessment,
            contact,
            attributes,
            raw_answers: Some(answers),
        }
    }

    /// Override the submission timestamp (used when the UI supplies one).
    pub fn with_submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn form_kind(&self) -> FormKind {
        self.form_kind
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Look up one attribute, treating JSON `null` as absent.
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    pub fn raw_answers(&self) -> Option<&[AssessmentAnswer]> {
        self.raw_answers.as_deref()
    }
}

// ---------------------------------------------------------------------------
// ScoreResult
// ---------------------------------------------------------------------------

/// Coarse lead-quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Cold,
    Warm,
    Hot,
}

impl QualityTier {
    /// Tier for a 0-100 score. Lower bounds are inclusive.
    pub fn from_score(score: u8) -> Self {
        match score {
            75.. => Self::Hot,
            50..=74 => Self::Warm,
            _ => Self::Cold,
        }
    }

    /// Capitalized label written to the CRM.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cold => "Cold",
            Self::Warm => "Warm",
            Self::Hot => "Hot",
        }
    }

    /// Contact tag used for downstream routing.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Cold => "lead-cold",
            Self::Warm => "lead-warm",
            Self::Hot => "lead-hot",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Numeric score plus its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub numeric_score: u8,
    pub quality_tier: QualityTier,
}

impl ScoreResult {
    /// Clamp a raw score into `[0, 100]` and derive the tier.
    pub fn from_raw(raw: i64) -> Self {
        let numeric_score = raw.clamp(0, 100) as u8;
        Self {
            numeric_score,
            quality_tier: QualityTier::from_score(numeric_score),
        }
    }
}

// ---------------------------------------------------------------------------
// ReconciledField
// ---------------------------------------------------------------------------

/// One semantic field resolved to a concrete CRM field with its final value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledField {
    pub external_field_id: String,
    /// Bare external key (namespace stripped), when the CRM published one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_key: Option<String>,
    /// Semantic key that produced this value (`notes_fallback` for the dump).
    pub semantic_key: String,
    pub value: String,
}
