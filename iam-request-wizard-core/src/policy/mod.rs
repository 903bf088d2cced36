//! IAM policy document model and compilation.
//!
//! The compiler turns committed wizard selections into a single-statement
//! identity policy document ready for review submission.

mod compile;
mod normalize;

pub use compile::{compile, generate_policy_name, sid_from_name, Compiler};
pub use normalize::{normalize_s3_prefix, S3_EXPANSION_REGIONS};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// IAM policy language version used for all generated documents
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Condition block: operator -> condition key -> value.
///
/// The wizard only ever emits `StringLike` with `ses:FromAddress`, but the
/// document model stays general so manual overrides round-trip cleanly.
pub type ConditionMap = BTreeMap<String, BTreeMap<String, String>>;

/// One authorization rule within a policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub sid: String,
    pub effect: Effect,
    pub action: Vec<String>,
    pub resource: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionMap>,
}

impl Statement {
    /// Create an Allow statement with deduplicated actions and resources
    #[must_use]
    pub fn allow(sid: String, action: Vec<String>, resource: Vec<String>) -> Self {
        Self {
            sid,
            effect: Effect::Allow,
            action: dedup_preserving_order(action),
            resource: dedup_preserving_order(resource),
            condition: None,
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: ConditionMap) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// A complete IAM policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// Single-statement document with the standard version string
    #[must_use]
    pub fn single(statement: Statement) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![statement],
        }
    }
}

/// Compiler output: the document plus the generated display name it was
/// derived from. The name becomes the inline-policy name in the review
/// request; the Sid is the name with non-alphanumerics stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledPolicy {
    pub policy_name: String,
    pub document: PolicyDocument,
}

/// Remove duplicates while preserving first-seen order
fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
