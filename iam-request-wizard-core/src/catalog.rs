//! Permission catalog loader with caching capabilities.
//!
//! The catalog maps `(service, permission flag)` to the IAM action strings
//! that flag grants. It ships embedded in the binary and is parsed once;
//! flag order within a service is the canonical iteration order used when
//! compiling a policy, regardless of the order the user ticked checkboxes.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::errors::{Result, WizardError};
use crate::model::ServiceChoice;

/// One permission flag and the IAM actions it expands to
#[derive(Clone, Debug, Deserialize)]
pub struct FlagActions {
    /// Flag name as shown on the wizard's checkbox (e.g. `list`, `publish`)
    pub flag: String,
    /// IAM action strings, in the order they appear in the policy
    pub actions: Vec<String>,
}

/// Static lookup table of permission flags per service
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct PermissionCatalog {
    services: HashMap<String, Vec<FlagActions>>,
}

impl PermissionCatalog {
    /// Flag entries for a service in canonical catalog order.
    ///
    /// Unknown services yield an empty slice; the wizard's `Custom` choice
    /// intentionally has no catalog entry.
    #[must_use]
    pub fn entries_for(&self, service: ServiceChoice) -> &[FlagActions] {
        self.services
            .get(service.catalog_key())
            .map_or(&[], Vec::as_slice)
    }

    /// IAM actions for a single `(service, flag)` pair.
    ///
    /// Unknown combinations contribute no actions and no error.
    #[must_use]
    pub fn actions_for(&self, service: ServiceChoice, flag: &str) -> &[String] {
        self.entries_for(service)
            .iter()
            .find(|entry| entry.flag == flag)
            .map_or(&[], |entry| entry.actions.as_slice())
    }
}

/// Embedded permission catalog data
#[derive(RustEmbed)]
#[folder = "resources/config"]
#[include = "permission-catalog.json"]
struct EmbeddedCatalog;

/// Static cache for the parsed catalog
static CATALOG_CACHE: OnceLock<std::result::Result<Arc<PermissionCatalog>, String>> =
    OnceLock::new();

/// Load and cache the embedded permission catalog.
///
/// # Errors
/// Returns `WizardError::CatalogLoad` if the embedded file is missing,
/// not UTF-8, or not valid catalog JSON. The failure is cached: a broken
/// embed fails the same way on every call.
pub fn load_permission_catalog() -> Result<Arc<PermissionCatalog>> {
    let cached = CATALOG_CACHE.get_or_init(|| {
        let embedded_file = EmbeddedCatalog::get("permission-catalog.json")
            .ok_or_else(|| "embedded permission catalog file not found".to_string())?;

        let json_str = std::str::from_utf8(&embedded_file.data)
            .map_err(|e| format!("invalid UTF-8 in embedded permission catalog: {e}"))?;

        let catalog: PermissionCatalog = serde_json::from_str(json_str)
            .map_err(|e| format!("failed to parse permission catalog JSON: {e}"))?;

        Ok(Arc::new(catalog))
    });

    match cached {
        Ok(catalog) => Ok(Arc::clone(catalog)),
        Err(message) => Err(WizardError::CatalogLoad {
            message: message.clone(),
            source: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_permission_catalog_embedded() {
        let catalog = load_permission_catalog().unwrap();

        // Subsequent calls return the same cached data
        let catalog2 = load_permission_catalog().unwrap();
        assert!(Arc::ptr_eq(&catalog, &catalog2));
    }

    #[test]
    fn test_catalog_flag_order_is_canonical() {
        let catalog = load_permission_catalog().unwrap();

        let s3_flags: Vec<&str> = catalog
            .entries_for(ServiceChoice::S3)
            .iter()
            .map(|entry| entry.flag.as_str())
            .collect();
        assert_eq!(s3_flags, vec!["list", "get", "put", "delete"]);

        let sqs_flags: Vec<&str> = catalog
            .entries_for(ServiceChoice::Sqs)
            .iter()
            .map(|entry| entry.flag.as_str())
            .collect();
        assert_eq!(sqs_flags, vec!["get", "send", "receive", "delete", "set"]);
    }

    #[test]
    fn test_catalog_exact_action_lists() {
        let catalog = load_permission_catalog().unwrap();

        assert_eq!(
            catalog.actions_for(ServiceChoice::S3, "list"),
            ["s3:ListBucket", "s3:ListBucketVersions"]
        );
        // The trailing `*` on ListMultipartUploadParts is part of the
        // catalog's literal action string.
        assert!(catalog
            .actions_for(ServiceChoice::S3, "put")
            .contains(&"s3:ListMultipartUploadParts*".to_string()));
        assert_eq!(
            catalog.actions_for(ServiceChoice::R53, "change"),
            ["route53:changeresourcerecordsets"]
        );
        assert_eq!(
            catalog.actions_for(ServiceChoice::Rds, "passrole"),
            ["iam:PassRole"]
        );
        assert_eq!(
            catalog.actions_for(ServiceChoice::Sts, "assumerole"),
            ["sts:AssumeRole"]
        );
        assert_eq!(
            catalog.actions_for(ServiceChoice::Ses, "sendemail"),
            ["ses:SendEmail", "ses:SendRawEmail"]
        );
        assert_eq!(catalog.actions_for(ServiceChoice::Ec2, "volmount").len(), 7);
    }

    #[test]
    fn test_unknown_combinations_contribute_nothing() {
        let catalog = load_permission_catalog().unwrap();

        assert!(catalog.actions_for(ServiceChoice::S3, "publish").is_empty());
        assert!(catalog
            .actions_for(ServiceChoice::Custom, "anything")
            .is_empty());
        assert!(catalog.entries_for(ServiceChoice::Custom).is_empty());
    }
}
