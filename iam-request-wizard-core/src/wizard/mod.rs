//! Wizard state controller.
//!
//! Drives the three-stage self-service flow: pick a target role and
//! service, tick permission checkboxes, then review and submit. All
//! transitions are synchronous; validation failures are field-local values
//! that block the transition, never panics. Every input the compiler needs
//! is threaded through this session explicitly; there is no ambient
//! page-scoped state.

use std::sync::OnceLock;

use log::{debug, info};
use regex::Regex;
use serde_json::Value;

use crate::errors::{Result, WizardError};
use crate::model::{PermissionSelection, ResourceSpec, ServiceChoice, TemporalMetadata};
use crate::policy::Compiler;
use crate::submission::ReviewRequest;

/// The three ordered wizard stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStage {
    SelectResource,
    SpecifyPermissions,
    ReviewAndSubmit,
}

impl WizardStage {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SelectResource => "select_resource",
            Self::SpecifyPermissions => "specify_permissions",
            Self::ReviewAndSubmit => "review_and_submit",
        }
    }
}

/// Declarative submission status, rendered by whatever view hosts the
/// session. The controller never touches a view directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Loading,
    Success {
        request_id: String,
    },
    Error {
        message: String,
    },
}

/// Pattern a target role ARN from the search flow must match
fn role_arn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^arn:aws:iam::\d+:role/.+$").expect("role ARN pattern is valid")
    })
}

/// One wizard session, exactly one per browser tab / CLI invocation
#[derive(Debug)]
pub struct WizardSession {
    stage: WizardStage,
    account_id: String,
    role_arn: Option<String>,
    service: Option<ServiceChoice>,
    resource: Option<ResourceSpec>,
    permissions: PermissionSelection,
    temporal: TemporalMetadata,
    /// User-edited policy JSON; suppresses regeneration until reset
    policy_override: Option<Value>,
    /// Compiled document for the current selections; cleared whenever a
    /// selection changes so the review page and the submission payload
    /// always show the same document
    compiled: Option<Value>,
    /// Name of the most recently compiled policy, reused for submission
    policy_name: Option<String>,
    /// Whether the Custom short-circuit skipped the permissions stage
    custom_shortcut: bool,
    submission: SubmissionState,
    compiler: Compiler,
}

impl WizardSession {
    /// Start a fresh session for the given account.
    ///
    /// # Errors
    /// Returns `WizardError::CatalogLoad` if the embedded permission
    /// catalog cannot be loaded.
    pub fn new(account_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            stage: WizardStage::SelectResource,
            account_id: account_id.into(),
            role_arn: None,
            service: None,
            resource: None,
            permissions: PermissionSelection::new(),
            temporal: TemporalMetadata::default(),
            policy_override: None,
            compiled: None,
            policy_name: None,
            custom_shortcut: false,
            submission: SubmissionState::Idle,
            compiler: Compiler::new()?,
        })
    }

    #[must_use]
    pub const fn stage(&self) -> WizardStage {
        self.stage
    }

    #[must_use]
    pub const fn submission_state(&self) -> &SubmissionState {
        &self.submission
    }

    #[must_use]
    pub fn role_arn(&self) -> Option<&str> {
        self.role_arn.as_deref()
    }

    /// Set the target role from the search flow. Format is validated at
    /// the stage transition, not here, so partial typeahead state is fine.
    pub fn set_role_arn(&mut self, arn: impl Into<String>) {
        self.role_arn = Some(arn.into());
    }

    /// Choose the service. Re-choosing resets permission selections, the
    /// resource fields, and any manual policy override.
    pub fn choose_service(&mut self, service: ServiceChoice) {
        if self.service != Some(service) {
            debug!("service changed to {service}; resetting selections");
            self.permissions.clear();
            self.resource = None;
            self.policy_override = None;
            self.compiled = None;
            self.policy_name = None;
        }
        self.service = Some(service);
    }

    /// Commit the service-specific resource fields.
    ///
    /// # Errors
    /// Returns a validation error if the spec belongs to a different
    /// service than the one chosen.
    pub fn set_resource(&mut self, resource: ResourceSpec) -> Result<()> {
        match self.service {
            Some(service) if service == resource.service() => {
                self.resource = Some(resource);
                self.compiled = None;
                Ok(())
            }
            Some(service) => Err(WizardError::validation(format!(
                "resource fields are for '{}' but the chosen service is '{service}'",
                resource.service()
            ))),
            None => Err(WizardError::validation(
                "choose a service before entering resource fields",
            )),
        }
    }

    pub fn set_permission(&mut self, flag: impl Into<String>, selected: bool) {
        self.permissions.set(flag, selected);
        self.compiled = None;
    }

    pub fn set_temporal(&mut self, temporal: TemporalMetadata) {
        self.temporal = temporal;
        self.compiled = None;
    }

    /// Advance one stage, or short-circuit to review for Custom.
    ///
    /// # Errors
    /// Field-local validation errors block the transition:
    /// - leaving `SelectResource` requires a role ARN matching
    ///   `arn:aws:iam::{account}:role/...` and a chosen service;
    /// - leaving `SpecifyPermissions` requires the service's required
    ///   identifier fields to be non-blank. An all-false permission
    ///   selection is allowed and produces an empty-Action statement.
    pub fn next_page(&mut self) -> Result<WizardStage> {
        match self.stage {
            WizardStage::SelectResource => {
                self.validate_role_selection()?;
                if self.service == Some(ServiceChoice::Custom) {
                    // No permissions page for user-written policies
                    info!("custom policy request; skipping permissions stage");
                    self.custom_shortcut = true;
                    self.resource = Some(ResourceSpec::Custom);
                    self.stage = WizardStage::ReviewAndSubmit;
                } else {
                    self.custom_shortcut = false;
                    self.stage = WizardStage::SpecifyPermissions;
                }
            }
            WizardStage::SpecifyPermissions => {
                self.validate_resource_fields()?;
                self.stage = WizardStage::ReviewAndSubmit;
            }
            WizardStage::ReviewAndSubmit => {
                return Err(WizardError::invalid_transition(
                    self.stage.name(),
                    "already at the final stage; submit or go back",
                ));
            }
        }
        Ok(self.stage)
    }

    /// Move back one stage. After the Custom short-circuit the permissions
    /// stage was never visited, so back from review lands on the first
    /// stage.
    pub fn previous_page(&mut self) -> WizardStage {
        self.stage = match self.stage {
            WizardStage::SelectResource | WizardStage::SpecifyPermissions => {
                WizardStage::SelectResource
            }
            WizardStage::ReviewAndSubmit => {
                if self.custom_shortcut {
                    WizardStage::SelectResource
                } else {
                    WizardStage::SpecifyPermissions
                }
            }
        };
        self.stage
    }

    /// The policy JSON shown on the review page.
    ///
    /// Returns the manual override verbatim when one exists. Otherwise the
    /// committed selections are compiled once and the result is cached, so
    /// repeated renders and the eventual submission all carry the same
    /// document and name; any selection change invalidates the cache.
    ///
    /// # Errors
    /// Propagates compilation errors; also fails when called before a
    /// resource was committed.
    pub fn policy_document(&mut self) -> Result<Value> {
        if let Some(existing) = &self.policy_override {
            debug!("manual policy override present; regeneration suppressed");
            return Ok(existing.clone());
        }
        if let Some(cached) = &self.compiled {
            return Ok(cached.clone());
        }

        let resource = self.resource.as_ref().ok_or_else(|| {
            WizardError::validation("no resource selection committed for this session")
        })?;

        let compiled = self
            .compiler
            .compile(resource, &self.permissions, &self.temporal)?;
        self.policy_name = Some(compiled.policy_name.clone());

        let document =
            serde_json::to_value(&compiled.document).map_err(|source| WizardError::Json {
                context: "compiled policy document".to_string(),
                source,
            })?;
        self.compiled = Some(document.clone());
        Ok(document)
    }

    /// Replace the generated policy with a user-edited document. The
    /// session returns this value unchanged until it is reset.
    pub fn set_policy_override(&mut self, document: Value) {
        if self.policy_name.is_none() {
            // Override before any compile still needs a name to submit under
            self.policy_name = Some(crate::policy::generate_policy_name(&self.temporal));
        }
        self.policy_override = Some(document);
    }

    /// Build the review request for submission.
    ///
    /// # Errors
    /// Returns a field-local validation error if the justification is
    /// blank, and propagates compilation errors when no policy has been
    /// produced yet.
    pub fn build_submission(&mut self, justification: &str) -> Result<ReviewRequest> {
        if self.stage != WizardStage::ReviewAndSubmit {
            return Err(WizardError::invalid_transition(
                self.stage.name(),
                "submission is only available from the review stage",
            ));
        }
        if justification.trim().is_empty() {
            return Err(WizardError::required_field("justification"));
        }
        let arn = self
            .role_arn
            .clone()
            .ok_or_else(|| WizardError::required_field("arn"))?;

        let document = self.policy_document()?;
        let policy_name = self
            .policy_name
            .clone()
            .ok_or_else(|| WizardError::validation("no policy name generated"))?;

        Ok(ReviewRequest::inline_policy(
            arn,
            self.account_id.clone(),
            justification.trim().to_string(),
            policy_name,
            document,
        ))
    }

    /// Record that a submission round trip is in flight
    pub fn begin_submission(&mut self) {
        self.submission = SubmissionState::Loading;
    }

    /// Record the backend's answer. Session state is otherwise preserved
    /// so a failed submission can be retried manually.
    pub fn finish_submission(&mut self, outcome: std::result::Result<String, String>) {
        self.submission = match outcome {
            Ok(request_id) => {
                info!("review request {request_id} accepted");
                SubmissionState::Success { request_id }
            }
            Err(message) => SubmissionState::Error { message },
        };
    }

    /// Discard everything and return to the first stage
    pub fn reset(&mut self) {
        debug!("wizard session reset");
        self.stage = WizardStage::SelectResource;
        self.role_arn = None;
        self.service = None;
        self.resource = None;
        self.permissions.clear();
        self.temporal = TemporalMetadata::default();
        self.policy_override = None;
        self.compiled = None;
        self.policy_name = None;
        self.custom_shortcut = false;
        self.submission = SubmissionState::Idle;
    }

    fn validate_role_selection(&self) -> Result<()> {
        let arn = self
            .role_arn
            .as_deref()
            .filter(|arn| !arn.trim().is_empty())
            .ok_or_else(|| WizardError::required_field("arn"))?;

        if !role_arn_pattern().is_match(arn) {
            return Err(WizardError::Validation {
                message: format!("'{arn}' is not an IAM role ARN"),
                field: Some("arn".to_string()),
            });
        }
        if self.service.is_none() {
            return Err(WizardError::required_field("service"));
        }
        Ok(())
    }

    fn validate_resource_fields(&self) -> Result<()> {
        let resource = self
            .resource
            .as_ref()
            .ok_or_else(|| WizardError::required_field("resource"))?;

        if let Some((field, value)) = resource.required_identifier() {
            if value.trim().is_empty() {
                return Err(WizardError::required_field(field));
            }
        }
        Ok(())
    }
}
