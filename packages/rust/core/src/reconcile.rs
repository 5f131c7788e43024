//! Reconciliation: semantic fields → concrete CRM custom-field values.
//!
//! For every spec that applies to the submission's form kind the engine
//! resolves a CRM field, looks up the value, transforms it and emits a
//! [`ReconciledField`]. A missing field or a bad value only affects that one
//! field. Once a catalog is in hand (even an empty one) reconciliation
//! cannot fail.

use std::collections::HashSet;

use leadbridge_shared::{
    ExternalFieldDefinition, LeadSubmission, ReconcileConfig, ReconciledField, ScoreResult,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::resolve::CatalogIndex;
use crate::specs::{self, FORM_TYPE, LEAD_QUALITY, LEAD_SCORE, LEAD_SOURCE, SUBMITTED_AT};
use crate::transform::{self, HARD_MAX_LENGTH};

/// Semantic key recorded on the notes-fallback field.
pub const NOTES_FALLBACK_KEY: &str = "notes_fallback";

/// Reconciliation policy knobs.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Below this many reconciled fields the notes fallback is attempted.
    pub fallback_floor: usize,
    /// Free-text CRM field names tried in order for the fallback dump.
    pub fallback_field_names: Vec<String>,
    /// Value written to the `lead_source` field.
    pub lead_source: String,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self::from(&ReconcileConfig::default())
    }
}

impl From<&ReconcileConfig> for ReconcileOptions {
    fn from(config: &ReconcileConfig) -> Self {
        Self {
            fallback_floor: config.fallback_floor,
            fallback_field_names: config.fallback_field_names.clone(),
            lead_source: config.lead_source.clone(),
        }
    }
}

/// A field whose value could not be transformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub semantic_key: String,
    pub reason: String,
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation {
    /// Values to write, in spec-table order (fallback last).
    pub fields: Vec<ReconciledField>,
    /// Semantic keys with no matching CRM field.
    pub unmapped: Vec<String>,
    /// Fields skipped because their value had the wrong shape.
    pub failed: Vec<FieldFailure>,
    /// Whether the notes dump was appended.
    pub fallback_applied: bool,
}

/// Reconcile with default options.
pub fn reconcile(
    submission: &LeadSubmission,
    score: &ScoreResult,
    catalog: &[ExternalFieldDefinition],
) -> Reconciliation {
    reconcile_with(submission, score, catalog, &ReconcileOptions::default())
}

/// Reconcile a scored submission against a fetched catalog.
pub fn reconcile_with(
    submission: &LeadSubmission,
    score: &ScoreResult,
    catalog: &[ExternalFieldDefinition],
    opts: &ReconcileOptions,
) -> Reconciliation {
    let index = CatalogIndex::new(catalog);
    let mut out = Reconciliation::default();
    let mut written: HashSet<&str> = HashSet::new();

    for spec in specs::fields_for(submission.form_kind()) {
        let Some(resolution) = index.resolve(spec) else {
            out.unmapped.push(spec.semantic_key.to_string());
            continue;
        };
        let field = resolution.field;

        if written.contains(field.id.as_str()) {
            debug!(
                semantic_key = spec.semantic_key,
                field_id = %field.id,
                "CRM field already written this run, skipping"
            );
            continue;
        }

        let Some(raw) = value_for(spec.semantic_key, submission, score, opts) else {
            debug!(semantic_key = spec.semantic_key, "no value submitted");
            continue;
        };

        match transform::transform(spec, &raw) {
            Ok(value) if value.is_empty() => {
                debug!(semantic_key = spec.semantic_key, "value rendered empty, skipping");
            }
            Ok(value) => {
                written.insert(field.id.as_str());
                out.fields.push(ReconciledField {
                    external_field_id: field.id.clone(),
                    external_key: field.bare_key().map(str::to_string),
                    semantic_key: spec.semantic_key.to_string(),
                    value,
                });
            }
            Err(e) => {
                warn!(
                    semantic_key = spec.semantic_key,
                    error = %e,
                    "value transform failed, skipping field"
                );
                out.failed.push(FieldFailure {
                    semantic_key: spec.semantic_key.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if out.fields.len() < opts.fallback_floor {
        apply_fallback(&index, submission, opts, &written, &mut out);
    }

    info!(
        submission = %submission.id(),
        catalog_fields = index.len(),
        mapped = out.fields.len(),
        unmapped = out.unmapped.len(),
        failed = out.failed.len(),
        fallback = out.fallback_applied,
        "reconciliation complete"
    );

    out
}

/// Append a `key: value` dump of the whole submission to a notes-shaped field.
fn apply_fallback(
    index: &CatalogIndex<'_>,
    submission: &LeadSubmission,
    opts: &ReconcileOptions,
    written: &HashSet<&str>,
    out: &mut Reconciliation,
) {
    let Some(resolution) = index.resolve_first_name(&opts.fallback_field_names, |f| {
        written.contains(f.id.as_str())
    }) else {
        warn!(
            mapped = out.fields.len(),
            floor = opts.fallback_floor,
            candidates = ?opts.fallback_field_names,
            "too few fields reconciled and no notes field available for fallback"
        );
        return;
    };

    let dump = submission_dump(submission);
    if dump.is_empty() {
        debug!("submission has no attributes to dump");
        return;
    }

    let field = resolution.field;
    warn!(
        mapped = out.fields.len(),
        floor = opts.fallback_floor,
        field_id = %field.id,
        field_name = %field.display_name,
        "too few fields reconciled, writing submission dump to notes field"
    );

    out.fields.push(ReconciledField {
        external_field_id: field.id.clone(),
        external_key: field.bare_key().map(str::to_string),
        semantic_key: NOTES_FALLBACK_KEY.to_string(),
        value: transform::truncate(dump, HARD_MAX_LENGTH),
    });
    out.fallback_applied = true;
}

/// One `key: value` line per non-null attribute, in submission order.
pub fn submission_dump(submission: &LeadSubmission) -> String {
    submission
        .attributes()
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| format!("{k}: {}", transform::render_plain(v)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Raw value for a semantic key: derived keys come from the score and the
/// submission metadata, everything else from the submitted attributes.
fn value_for(
    semantic_key: &str,
    submission: &LeadSubmission,
    score: &ScoreResult,
    opts: &ReconcileOptions,
) -> Option<Value> {
    match semantic_key {
        LEAD_SCORE => Some(Value::from(score.numeric_score)),
        LEAD_QUALITY => Some(Value::from(score.quality_tier.label())),
        FORM_TYPE => Some(Value::from(submission.form_kind().as_str())),
        LEAD_SOURCE => Some(Value::from(opts.lead_source.as_str())),
        SUBMITTED_AT => Some(Value::from(submission.submitted_at().to_rfc3339())),
        key => submission.attribute(key).cloned(),
    }
}
