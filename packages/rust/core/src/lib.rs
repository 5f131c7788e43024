//! Lead scoring and CRM field reconciliation for LeadBridge.
//!
//! This crate turns a raw website submission into a scored lead and a
//! contact payload whose custom fields match the live CRM catalog
//! (e.g., [`pipeline::process`]).

pub mod normalize;
pub mod payload;
pub mod pipeline;
pub mod reconcile;
pub mod resolve;
pub mod scoring;
pub mod specs;
pub mod submission;
pub mod transform;

pub use pipeline::{ProcessedLead, ProgressReporter, SilentProgress, process, process_with_catalog};
pub use reconcile::{FieldFailure, ReconcileOptions, Reconciliation, reconcile, reconcile_with};
pub use resolve::{CatalogIndex, MatchStrategy, Resolution, resolve};
pub use scoring::score;
pub use specs::SemanticFieldSpec;
pub use submission::{InboundSubmission, normalize_submission, parse_submission};
