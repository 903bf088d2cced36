//! This crate provides the core logic for the self-service IAM policy
//! wizard:
//! - permission catalog (flag to IAM action mapping, embedded)
//! - per-service resource identifier normalization
//! - policy compilation into single-statement documents
//! - the wizard's multi-stage session state machine
//!
//! Approval, policy application, and AWS API access live in the external
//! review backend; this crate only prepares and packages requests for it.

pub mod catalog;
pub mod errors;
mod model;
pub mod policy;
mod submission;
pub mod wizard;

// Re-exports for a small, focused public API
pub use catalog::{load_permission_catalog, PermissionCatalog};
pub use errors::{Result, WizardError};
pub use model::{PermissionSelection, ResourceSpec, ServiceChoice, TemporalMetadata};
pub use policy::{compile, CompiledPolicy, Compiler, PolicyDocument, Statement};
pub use submission::{DataListEntry, ReviewRequest};
pub use wizard::{SubmissionState, WizardSession, WizardStage};
