//! Shared types, error model, and configuration for LeadBridge.
//!
//! This crate is the foundation depended on by all other LeadBridge crates.
//! It provides:
//! - [`LeadBridgeError`]: the unified error type
//! - Domain types ([`ExternalFieldDefinition`], [`LeadSubmission`], [`ScoreResult`],
//!   [`ReconciledField`])
//! - Configuration ([`AppConfig`], [`CrmCredentials`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrmConfig, CrmCredentials, ReconcileConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_credentials,
};
pub use error::{LeadBridgeError, Result};
pub use types::{
    AssessmentAnswer, Attributes, Contact, ExternalFieldDefinition, FieldDataType, FormKind,
    LeadSubmission, QualityTier, ReconciledField, ScoreResult, SubmissionId, strip_namespace,
};
