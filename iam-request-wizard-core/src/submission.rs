//! Review submission payloads.
//!
//! Wire types for handing a compiled (or manually edited) policy to the
//! review backend. The backend owns approval and application; this side
//! only packages the request.

use serde::{Deserialize, Serialize};

/// One proposed change within a review request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataListEntry {
    /// Change kind, e.g. `inline_policy`
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Policy name the change applies to
    pub name: String,
    /// The policy document, as the JSON the user reviewed
    pub value: serde_json::Value,
    /// Whether this creates a new policy rather than editing one
    pub is_new: bool,
}

/// Body of `POST /policies/submit_for_review`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Principal the requested policy attaches to
    pub arn: String,
    pub account_id: String,
    /// Mandatory free-text reason shown to reviewers
    pub justification: String,
    pub admin_auto_approve: bool,
    pub data_list: Vec<DataListEntry>,
}

impl ReviewRequest {
    /// Package a single new inline policy for review
    #[must_use]
    pub fn inline_policy(
        arn: String,
        account_id: String,
        justification: String,
        policy_name: String,
        document: serde_json::Value,
    ) -> Self {
        Self {
            arn,
            account_id,
            justification,
            admin_auto_approve: false,
            data_list: vec![DataListEntry {
                entry_type: "inline_policy".to_string(),
                name: policy_name,
                value: document,
                is_new: true,
            }],
        }
    }
}
