//! Static semantic field table.
//!
//! Each [`SemanticFieldSpec`] names one piece of lead data we care about,
//! independent of how a given CRM account happens to name or key it. The
//! table is `'static` and read-only, so it is shared freely across
//! concurrently processed submissions.

use leadbridge_shared::{FieldDataType, FormKind};

/// Enumerated code → human label table.
pub type ValueMap = &'static [(&'static str, &'static str)];

/// Which form kinds a semantic field applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    Both,
    Onboarding,
    Assessment,
}

impl FieldScope {
    pub fn applies_to(&self, kind: FormKind) -> bool {
        match self {
            Self::Both => true,
            Self::Onboarding => kind == FormKind::Onboarding,
            Self::Assessment => kind == FormKind::Assessment,
        }
    }
}

/// Static description of one semantic lead field.
#[derive(Debug, Clone, Copy)]
pub struct SemanticFieldSpec {
    /// Stable internal key, unique across the table.
    pub semantic_key: &'static str,
    /// Display name we expect the CRM field to carry.
    pub preferred_external_name: &'static str,
    pub data_type: FieldDataType,
    /// Code → label translations applied before writing.
    pub value_map: Option<ValueMap>,
    /// Character limit; the global 5,000 cap still applies on top.
    pub max_length: Option<usize>,
    pub scope: FieldScope,
}

impl SemanticFieldSpec {
    const fn new(
        semantic_key: &'static str,
        preferred_external_name: &'static str,
        data_type: FieldDataType,
        scope: FieldScope,
    ) -> Self {
        Self {
            semantic_key,
            preferred_external_name,
            data_type,
            value_map: None,
            max_length: None,
            scope,
        }
    }

    const fn mapped(mut self, map: ValueMap) -> Self {
        self.value_map = Some(map);
        self
    }

    const fn limit(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Translate a code through the value map, passing unknown codes through.
    pub fn label_for<'a>(&self, code: &'a str) -> &'a str {
        self.value_map
            .and_then(|map| map.iter().find(|(c, _)| *c == code).map(|(_, label)| *label))
            .unwrap_or(code)
    }
}

// ---------------------------------------------------------------------------
// Derived keys (populated from submission metadata and the score)
// ---------------------------------------------------------------------------

pub const LEAD_SCORE: &str = "lead_score";
pub const LEAD_QUALITY: &str = "lead_quality";
pub const FORM_TYPE: &str = "form_type";
pub const LEAD_SOURCE: &str = "lead_source";
pub const SUBMITTED_AT: &str = "submitted_at";

// ---------------------------------------------------------------------------
// Value maps
// ---------------------------------------------------------------------------

pub const BUSINESS_TYPES: ValueMap = &[
    ("agency", "Marketing Agency"),
    ("saas", "SaaS / Software"),
    ("ecommerce", "E-commerce"),
    ("professional-services", "Professional Services"),
    ("local-business", "Local Business"),
    ("coach-consultant", "Coach / Consultant"),
    ("other", "Other"),
];

pub const PLANS: ValueMap = &[
    ("starter", "Starter"),
    ("growth", "Growth"),
    ("complete-system", "Complete System"),
];

pub const CONTENT_GOALS: ValueMap = &[
    ("blog-posts", "Blog Posts"),
    ("social-media", "Social Media"),
    ("email-newsletters", "Email Newsletters"),
    ("video-scripts", "Video Scripts"),
    ("landing-pages", "Landing Pages"),
    ("seo", "SEO Content"),
    ("ad-copy", "Ad Copy"),
];

pub const INTEGRATIONS: ValueMap = &[
    ("gohighlevel", "GoHighLevel"),
    ("google-analytics", "Google Analytics"),
    ("google-business", "Google Business Profile"),
    ("facebook", "Facebook"),
    ("instagram", "Instagram"),
    ("linkedin", "LinkedIn"),
    ("stripe", "Stripe"),
    ("calendly", "Calendly"),
    ("zapier", "Zapier"),
    ("mailchimp", "Mailchimp"),
    ("shopify", "Shopify"),
    ("wordpress", "WordPress"),
];

pub const TEAM_SIZES: ValueMap = &[
    ("solo", "Just me"),
    ("2-5", "2-5 people"),
    ("6-20", "6-20 people"),
    ("21-50", "21-50 people"),
    ("50-plus", "50+ people"),
];

pub const BUDGETS: ValueMap = &[
    ("under-1k", "Under $1,000"),
    ("1k-3k", "$1,000 - $3,000"),
    ("3k-5k", "$3,000 - $5,000"),
    ("5k-10k", "$5,000 - $10,000"),
    ("10k-plus", "$10,000+"),
];

pub const TIMELINES: ValueMap = &[
    ("asap", "As soon as possible"),
    ("1-month", "Within 1 month"),
    ("3-months", "Within 3 months"),
    ("exploring", "Just exploring"),
];

pub const MARKETING_CHANNELS: ValueMap = &[
    ("seo", "SEO"),
    ("paid-ads", "Paid Ads"),
    ("social-media", "Social Media"),
    ("email", "Email"),
    ("referrals", "Referrals"),
    ("events", "Events"),
];

pub const FORM_TYPES: ValueMap = &[
    ("onboarding", "Onboarding Wizard"),
    ("assessment", "Readiness Assessment"),
];

// ---------------------------------------------------------------------------
// The table
// ---------------------------------------------------------------------------

use FieldDataType as T;
use FieldScope as S;

static SEMANTIC_FIELDS: &[SemanticFieldSpec] = &[
    // Applies to both forms
    SemanticFieldSpec::new(LEAD_SCORE, "Lead Score", T::Number, S::Both),
    SemanticFieldSpec::new(LEAD_QUALITY, "Lead Quality", T::SingleOption, S::Both),
    SemanticFieldSpec::new(FORM_TYPE, "Form Type", T::SingleOption, S::Both).mapped(FORM_TYPES),
    SemanticFieldSpec::new(LEAD_SOURCE, "Lead Source", T::Text, S::Both),
    SemanticFieldSpec::new(SUBMITTED_AT, "Submission Date", T::Date, S::Both),
    SemanticFieldSpec::new("business_name", "Business Name", T::Text, S::Both).limit(255),
    // Onboarding wizard
    SemanticFieldSpec::new("business_type", "Business Type", T::SingleOption, S::Onboarding)
        .mapped(BUSINESS_TYPES),
    SemanticFieldSpec::new("website_url", "Website URL", T::Text, S::Onboarding).limit(500),
    SemanticFieldSpec::new("team_size", "Team Size", T::SingleOption, S::Onboarding)
        .mapped(TEAM_SIZES),
    SemanticFieldSpec::new("monthly_budget", "Monthly Budget - USD", T::SingleOption, S::Onboarding)
        .mapped(BUDGETS),
    SemanticFieldSpec::new("target_audience", "Target Audience", T::LongText, S::Onboarding),
    SemanticFieldSpec::new("content_goals", "Content Goals", T::MultiOption, S::Onboarding)
        .mapped(CONTENT_GOALS),
    SemanticFieldSpec::new("integrations", "Requested Integrations", T::MultiOption, S::Onboarding)
        .mapped(INTEGRATIONS),
    SemanticFieldSpec::new("selected_plan", "Selected Plan", T::SingleOption, S::Onboarding)
        .mapped(PLANS),
    SemanticFieldSpec::new("timeline", "Launch Timeline", T::SingleOption, S::Onboarding)
        .mapped(TIMELINES),
    SemanticFieldSpec::new("brand_voice", "Brand Voice", T::Text, S::Onboarding).limit(500),
    SemanticFieldSpec::new("launch_date", "Preferred Launch Date", T::Date, S::Onboarding),
    SemanticFieldSpec::new("additional_notes", "Additional Notes", T::LongText, S::Onboarding),
    // Readiness assessment
    SemanticFieldSpec::new("industry", "Industry", T::Text, S::Assessment).limit(255),
    SemanticFieldSpec::new("company_size", "Company Size", T::SingleOption, S::Assessment)
        .mapped(TEAM_SIZES),
    SemanticFieldSpec::new(
        "biggest_challenge",
        "Biggest Challenge",
        T::LongText,
        S::Assessment,
    ),
    SemanticFieldSpec::new(
        "marketing_channels",
        "Marketing Channels",
        T::MultiOption,
        S::Assessment,
    )
    .mapped(MARKETING_CHANNELS),
    SemanticFieldSpec::new(
        "monthly_marketing_budget",
        "Marketing Budget",
        T::SingleOption,
        S::Assessment,
    )
    .mapped(BUDGETS),
    SemanticFieldSpec::new(
        "assessment_responses",
        "Assessment Responses",
        T::LongText,
        S::Assessment,
    ),
];

/// The full static field table.
pub fn semantic_fields() -> &'static [SemanticFieldSpec] {
    debug_assert!(keys_are_unique(), "duplicate semantic_key in field table");
    SEMANTIC_FIELDS
}

/// Fields applicable to one form kind, in table order.
pub fn fields_for(kind: FormKind) -> impl Iterator<Item = &'static SemanticFieldSpec> {
    semantic_fields().iter().filter(move |spec| spec.scope.applies_to(kind))
}

/// Look up a spec by semantic key.
pub fn find(semantic_key: &str) -> Option<&'static SemanticFieldSpec> {
    SEMANTIC_FIELDS.iter().find(|spec| spec.semantic_key == semantic_key)
}

fn keys_are_unique() -> bool {
    SEMANTIC_FIELDS.iter().enumerate().all(|(i, a)| {
        SEMANTIC_FIELDS[i + 1..]
            .iter()
            .all(|b| a.semantic_key != b.semantic_key)
    })
}
