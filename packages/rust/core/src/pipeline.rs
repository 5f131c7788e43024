//! End-to-end lead pipeline: normalize → score → catalog → reconcile → payload.

use std::time::Instant;

use leadbridge_crm::{CatalogSource, ContactPayload};
use leadbridge_shared::{
    CrmCredentials, ExternalFieldDefinition, LeadSubmission, Result, ScoreResult,
};
use tracing::{info, instrument, warn};

use crate::payload::build_payload;
use crate::reconcile::{ReconcileOptions, Reconciliation, reconcile_with};
use crate::scoring;
use crate::submission::{InboundSubmission, normalize_submission};

/// Result of one pipeline run.
#[derive(Debug)]
pub struct ProcessedLead {
    pub submission: LeadSubmission,
    pub score: ScoreResult,
    /// `None` when the catalog could not be fetched.
    pub reconciliation: Option<Reconciliation>,
    /// Contact upsert body, ready to send.
    pub payload: ContactPayload,
    /// `true` when the catalog was unavailable or empty.
    pub degraded: bool,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, lead: &ProcessedLead);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _lead: &ProcessedLead) {}
}

/// Run the full pipeline against a live catalog source.
///
/// Only an invalid submission aborts the run. A failed fetch or an empty
/// catalog degrades it: the payload keeps contact basics and tags but no
/// custom fields.
#[instrument(skip_all, fields(location = %creds.location_id))]
pub async fn process<S: CatalogSource>(
    source: &S,
    creds: &CrmCredentials,
    inbound: InboundSubmission,
    opts: &ReconcileOptions,
    progress: &dyn ProgressReporter,
) -> Result<ProcessedLead> {
    let start = Instant::now();

    progress.phase("Validating submission");
    let submission = normalize_submission(inbound)?;

    progress.phase("Fetching custom field catalog");
    let catalog = source.fetch_catalog(creds).await;

    progress.phase("Reconciling fields");
    let lead = finish(submission, catalog, &creds.location_id, opts, start);
    progress.done(&lead);
    Ok(lead)
}

/// Run the pipeline with an already-fetched catalog (or the error that
/// replaced it).
pub fn process_with_catalog(
    inbound: InboundSubmission,
    catalog: Result<Vec<ExternalFieldDefinition>>,
    location_id: &str,
    opts: &ReconcileOptions,
) -> Result<ProcessedLead> {
    let start = Instant::now();
    let submission = normalize_submission(inbound)?;
    Ok(finish(submission, catalog, location_id, opts, start))
}

fn finish(
    submission: LeadSubmission,
    catalog: Result<Vec<ExternalFieldDefinition>>,
    location_id: &str,
    opts: &ReconcileOptions,
    start: Instant,
) -> ProcessedLead {
    let score = scoring::score(&submission);
    info!(
        submission = %submission.id(),
        form_kind = %submission.form_kind(),
        score = score.numeric_score,
        tier = score.quality_tier.label(),
        "lead scored"
    );

    let (reconciliation, degraded) = match catalog {
        Ok(fields) => {
            if fields.is_empty() {
                warn!("catalog is empty, continuing without custom fields");
            }
            let reconciliation = reconcile_with(&submission, &score, &fields, opts);
            (Some(reconciliation), fields.is_empty())
        }
        Err(e) => {
            warn!(error = %e, "catalog unavailable, continuing without custom fields");
            (None, true)
        }
    };

    let payload = build_payload(
        &submission,
        &score,
        reconciliation.as_ref(),
        location_id,
        &opts.lead_source,
    );
    let elapsed = start.elapsed();

    info!(
        custom_fields = payload.custom_fields.len(),
        degraded,
        elapsed_ms = elapsed.as_millis() as u64,
        "lead processed"
    );

    ProcessedLead {
        submission,
        score,
        reconciliation,
        payload,
        degraded,
        elapsed,
    }
}
