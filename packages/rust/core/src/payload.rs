//! Outbound contact payload.

use leadbridge_crm::{ContactPayload, CustomFieldValue};
use leadbridge_shared::{FormKind, LeadSubmission, ScoreResult};

use crate::reconcile::Reconciliation;

/// Tag marking which website form produced the lead.
pub fn form_tag(kind: FormKind) -> String {
    format!("website-{}", kind.as_str())
}

/// Build the contact upsert body.
///
/// `reconciliation` is `None` when the catalog could not be fetched; the
/// payload then carries only the contact basics and tags.
pub fn build_payload(
    submission: &LeadSubmission,
    score: &ScoreResult,
    reconciliation: Option<&Reconciliation>,
    location_id: &str,
    source: &str,
) -> ContactPayload {
    let contact = submission.contact();

    let custom_fields = reconciliation
        .map(|r| {
            r.fields
                .iter()
                .map(|f| {
                    CustomFieldValue::new(
                        &f.external_field_id,
                        f.external_key.as_deref(),
                        f.value.clone(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    ContactPayload {
        first_name: contact.first_name.clone(),
        last_name: contact.last_name.clone(),
        email: contact.email.clone(),
        phone: contact.phone.clone(),
        location_id: location_id.to_string(),
        source: source.to_string(),
        tags: vec![
            score.quality_tier.tag().to_string(),
            form_tag(submission.form_kind()),
        ],
        custom_fields,
    }
}
