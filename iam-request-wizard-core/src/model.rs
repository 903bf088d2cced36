//! Shared data model for the self-service wizard.
//!
//! The resource selection is a discriminated union keyed by service: each
//! variant carries only the fields that service actually uses, so downstream
//! code never reads optional fields that belong to a different service.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::WizardError;

/// The AWS services the wizard can request access to.
///
/// `Custom` means the user writes the policy document themselves; the
/// wizard skips the permissions stage entirely for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceChoice {
    S3,
    Sqs,
    Sns,
    Sts,
    R53,
    Ec2,
    Rds,
    Ses,
    Custom,
}

impl ServiceChoice {
    /// Key under which this service's permission flags live in the catalog
    #[must_use]
    pub const fn catalog_key(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Sqs => "sqs",
            Self::Sns => "sns",
            Self::Sts => "sts",
            Self::R53 => "r53",
            Self::Ec2 => "ec2",
            Self::Rds => "rds",
            Self::Ses => "ses",
            Self::Custom => "custom",
        }
    }

    /// Permission flag that is always treated as selected for this service.
    ///
    /// STS requests always carry `sts:AssumeRole`, and SES requests always
    /// carry the send-email actions, regardless of checkbox state.
    #[must_use]
    pub const fn forced_flag(self) -> Option<&'static str> {
        match self {
            Self::Sts => Some("assumerole"),
            Self::Ses => Some("sendemail"),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_key())
    }
}

impl FromStr for ServiceChoice {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "sqs" => Ok(Self::Sqs),
            "sns" => Ok(Self::Sns),
            "sts" => Ok(Self::Sts),
            "r53" | "route53" => Ok(Self::R53),
            "ec2" => Ok(Self::Ec2),
            "rds" => Ok(Self::Rds),
            "ses" => Ok(Self::Ses),
            "custom" => Ok(Self::Custom),
            other => Err(WizardError::validation(format!(
                "unknown service choice '{other}'"
            ))),
        }
    }
}

/// Checkbox state for the permission flags of the chosen service.
///
/// Flags unknown to the catalog are silently ignored. Iteration order never
/// comes from this map; the catalog's per-service flag order drives action
/// resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSelection {
    flags: HashMap<String, bool>,
}

impl PermissionSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection with every named flag set to true
    pub fn from_flags<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(|f| (f.into(), true)).collect(),
        }
    }

    pub fn set(&mut self, flag: impl Into<String>, selected: bool) {
        self.flags.insert(flag.into(), selected);
    }

    #[must_use]
    pub fn is_selected(&self, flag: &str) -> bool {
        self.flags.get(flag).copied().unwrap_or(false)
    }

    /// True if no flag is selected at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.flags.values().any(|selected| *selected)
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }
}

/// Service-specific resource selection, one variant per service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "lowercase")]
pub enum ResourceSpec {
    S3 {
        /// Bucket name or full bucket ARN
        bucket: String,
        /// Key prefix, normalized to `/{prefix}/*` at compile time
        prefix: String,
        /// Also emit `{region}.{bucket}` ARNs for the fixed region list
        multiregion: bool,
    },
    Sqs {
        queue_arn: String,
    },
    Sns {
        topic_arn: String,
    },
    Sts {
        role_arn: String,
    },
    R53,
    Ec2,
    Rds {
        /// Account that owns the rds-monitoring-role being passed
        account_id: String,
    },
    Ses {
        from_address: String,
        /// SES identity ARN configured for the deployment
        identity_arn: String,
    },
    Custom,
}

impl ResourceSpec {
    /// The service this spec belongs to
    #[must_use]
    pub const fn service(&self) -> ServiceChoice {
        match self {
            Self::S3 { .. } => ServiceChoice::S3,
            Self::Sqs { .. } => ServiceChoice::Sqs,
            Self::Sns { .. } => ServiceChoice::Sns,
            Self::Sts { .. } => ServiceChoice::Sts,
            Self::R53 => ServiceChoice::R53,
            Self::Ec2 => ServiceChoice::Ec2,
            Self::Rds { .. } => ServiceChoice::Rds,
            Self::Ses { .. } => ServiceChoice::Ses,
            Self::Custom => ServiceChoice::Custom,
        }
    }

    /// The required identifier field for this service, with its current
    /// value, or `None` when the service needs no identifier (R53, EC2,
    /// Custom). Used for field-level "Required" validation before the
    /// compiler ever runs.
    #[must_use]
    pub fn required_identifier(&self) -> Option<(&'static str, &str)> {
        match self {
            Self::S3 { bucket, .. } => Some(("bucket", bucket)),
            Self::Sqs { queue_arn } => Some(("queue_arn", queue_arn)),
            Self::Sns { topic_arn } => Some(("topic_arn", topic_arn)),
            Self::Sts { role_arn } => Some(("role_arn", role_arn)),
            Self::Rds { account_id } => Some(("account_id", account_id)),
            Self::Ses { from_address, .. } => Some(("from_address", from_address)),
            Self::R53 | Self::Ec2 | Self::Custom => None,
        }
    }
}

/// Optional temporary-access metadata.
///
/// Only influences the generated policy name (`temp_{date}_{random}`),
/// never the statements themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalMetadata {
    pub is_temporary: bool,
    pub expiration_date: Option<NaiveDate>,
}

impl TemporalMetadata {
    /// Temporary access expiring on the given date
    #[must_use]
    pub const fn expiring(date: NaiveDate) -> Self {
        Self {
            is_temporary: true,
            expiration_date: Some(date),
        }
    }
}
