//! Error handling module

use thiserror::Error;

/// Result type alias for operations that can fail with `WizardError`
pub type Result<T> = std::result::Result<T, WizardError>;

/// Error type for the self-service policy wizard.
///
/// Validation errors are field-local and recoverable: callers render them
/// inline next to the offending input and block the stage transition. They
/// never abort the wizard session.
#[derive(Error, Debug)]
pub enum WizardError {
    /// Input validation errors for user-provided data
    #[error("Validation error: {message}")]
    Validation {
        /// Detailed validation error message
        message: String,
        /// Optional field name that failed validation
        field: Option<String>,
    },

    /// Policy compilation errors
    #[error("Policy compilation error: {message}")]
    PolicyCompilation {
        /// Detailed error message
        message: String,
    },

    /// Embedded permission catalog loading errors
    #[error("Failed to load permission catalog: {message}")]
    CatalogLoad {
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Stage transition attempted out of order
    #[error("Invalid wizard transition from stage '{stage}': {message}")]
    InvalidTransition {
        /// The stage the session was in
        stage: String,
        /// Detailed error message
        message: String,
    },

    /// JSON parsing and serialization errors with context
    #[error("JSON error in {context}: {source}")]
    Json {
        /// Context where the JSON error occurred (e.g., "policy override")
        context: String,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

impl WizardError {
    /// Create a validation error without a field
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error tied to a specific form field
    pub(crate) fn required_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::Validation {
            message: format!("'{field}' is required"),
            field: Some(field),
        }
    }

    /// Create a policy compilation error
    pub(crate) fn policy_compilation(message: impl Into<String>) -> Self {
        Self::PolicyCompilation {
            message: message.into(),
        }
    }

    /// Create an invalid transition error
    pub(crate) fn invalid_transition(
        stage: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// The form field this error is attached to, if field-local
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}
