//! Per-service resource identifier shaping.
//!
//! Turns the wizard's service-specific selections into the `Resource`
//! entries (and, for SES, the `Condition` block) of the generated
//! statement. S3 gets the most massaging: prefix normalization, ARN
//! prefixing, and optional multi-region bucket expansion.

use log::{debug, error};

use super::ConditionMap;
use crate::errors::{Result, WizardError};
use crate::model::{PermissionSelection, ResourceSpec};

/// Regions a multi-region S3 request expands to, as `{region}.{bucket}`
pub const S3_EXPANSION_REGIONS: [&str; 2] = ["us-west-2", "eu-west-2"];

const S3_ARN_PREFIX: &str = "arn:aws:s3:::";

/// Normalize an S3 key prefix so it always starts with `/` and ends
/// with `/*`. An empty prefix means the whole bucket: `/*`.
#[must_use]
pub fn normalize_s3_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix == "*" || prefix == "/*" {
        return "/*".to_string();
    }

    let mut normalized = if prefix.starts_with('/') {
        prefix.to_string()
    } else {
        format!("/{prefix}")
    };

    if !normalized.ends_with("/*") {
        normalized.push_str("/*");
    }

    normalized
}

/// Bucket ARN for a bucket field that may already be a full ARN
fn s3_bucket_arn(bucket: &str) -> String {
    if bucket.contains(S3_ARN_PREFIX) {
        bucket.to_string()
    } else {
        format!("{S3_ARN_PREFIX}{bucket}")
    }
}

/// Bare bucket name, for `{region}.{bucket}` expansion
fn s3_bucket_name(bucket: &str) -> &str {
    bucket
        .rfind(S3_ARN_PREFIX)
        .map_or(bucket, |idx| &bucket[idx + S3_ARN_PREFIX.len()..])
}

/// Resolve the `Resource` entries for a committed resource selection.
///
/// A blank required identifier here is a contract violation: the wizard
/// must surface it as a field-level validation error before compilation
/// ever starts.
///
/// # Errors
/// Returns `WizardError::PolicyCompilation` when a required identifier is
/// blank.
pub(super) fn resources_for(
    spec: &ResourceSpec,
    selection: &PermissionSelection,
) -> Result<Vec<String>> {
    if let Some((field, value)) = spec.required_identifier() {
        if value.trim().is_empty() {
            error!("blank '{field}' reached the compiler; validation must run first");
            return Err(WizardError::policy_compilation(format!(
                "cannot compile a statement without '{field}'"
            )));
        }
    }

    let resources = match spec {
        ResourceSpec::S3 {
            bucket,
            prefix,
            multiregion,
        } => {
            let prefix = normalize_s3_prefix(prefix);
            let bucket_arn = s3_bucket_arn(bucket);
            let mut resources = vec![format!("{bucket_arn}{prefix}"), bucket_arn];

            if *multiregion {
                let name = s3_bucket_name(bucket);
                for region in S3_EXPANSION_REGIONS {
                    resources.push(format!("{S3_ARN_PREFIX}{region}.{name}{prefix}"));
                    resources.push(format!("{S3_ARN_PREFIX}{region}.{name}"));
                }
            }

            resources
        }
        ResourceSpec::Sqs { queue_arn } => vec![queue_arn.clone()],
        ResourceSpec::Sns { topic_arn } => vec![topic_arn.clone()],
        ResourceSpec::Sts { role_arn } => vec![role_arn.clone()],
        ResourceSpec::R53 | ResourceSpec::Ec2 => vec!["*".to_string()],
        ResourceSpec::Rds { account_id } => {
            if selection.is_selected("passrole") {
                vec![format!(
                    "arn:aws:iam::{account_id}:role/rds-monitoring-role"
                )]
            } else {
                vec![]
            }
        }
        ResourceSpec::Ses { identity_arn, .. } => vec![identity_arn.clone()],
        ResourceSpec::Custom => vec![],
    };

    debug!("resolved {} resource entries for {}", resources.len(), spec.service());
    Ok(resources)
}

/// Condition block for a resource selection. Only SES carries one: a
/// `StringLike` match on the requested from-address.
pub(super) fn condition_for(spec: &ResourceSpec) -> Option<ConditionMap> {
    match spec {
        ResourceSpec::Ses { from_address, .. } => {
            let mut keys = std::collections::BTreeMap::new();
            keys.insert("ses:FromAddress".to_string(), from_address.clone());
            let mut condition = ConditionMap::new();
            condition.insert("StringLike".to_string(), keys);
            Some(condition)
        }
        _ => None,
    }
}
