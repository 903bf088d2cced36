//! Policy compilation from committed wizard selections.
//!
//! One invocation produces exactly one Allow statement. Action order is
//! driven by the catalog's per-service flag order, never by the order the
//! user ticked checkboxes, so identical selections always compile to the
//! same statement body. Only the generated name (and therefore the Sid)
//! varies between invocations, via the random suffix.

use std::sync::Arc;

use log::debug;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use super::normalize::{condition_for, resources_for};
use super::{CompiledPolicy, PolicyDocument, Statement};
use crate::catalog::{load_permission_catalog, PermissionCatalog};
use crate::errors::Result;
use crate::model::{PermissionSelection, ResourceSpec, TemporalMetadata};

/// Prefix for non-temporary generated policy names. The review backend
/// recognizes this prefix; changing it breaks request attribution.
const POLICY_NAME_PREFIX: &str = "ConsoleMe";

/// Length of the random name suffix
const RANDOM_SUFFIX_LEN: usize = 8;

/// Random display-identifier suffix from `[0-9a-zA-Z]`. Not a credential;
/// cryptographic strength is not required.
fn random_suffix() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// Generate a unique display name for the policy.
///
/// Temporary requests are named `temp_{expiration}_{random}` so reapers on
/// the backend can find and retire them by date; everything else gets the
/// standard prefix.
#[must_use]
pub fn generate_policy_name(temporal: &TemporalMetadata) -> String {
    if temporal.is_temporary {
        let expiration = temporal
            .expiration_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        format!("temp_{expiration}_{}", random_suffix())
    } else {
        format!("{POLICY_NAME_PREFIX}{}", random_suffix())
    }
}

/// Derive a Sid from a policy name by stripping non-alphanumerics
#[must_use]
pub fn sid_from_name(name: &str) -> String {
    name.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Policy compiler bound to a permission catalog.
///
/// Pure aside from random name generation: the same selections always
/// yield the same statement body.
#[derive(Debug, Clone)]
pub struct Compiler {
    catalog: Arc<PermissionCatalog>,
}

impl Compiler {
    /// Create a compiler over the embedded catalog.
    ///
    /// # Errors
    /// Returns `WizardError::CatalogLoad` if the embedded catalog cannot
    /// be parsed.
    pub fn new() -> Result<Self> {
        Ok(Self {
            catalog: load_permission_catalog()?,
        })
    }

    /// Compile committed selections into a single-statement policy.
    ///
    /// # Errors
    /// Returns `WizardError::PolicyCompilation` when a required resource
    /// identifier is blank; validation is expected to have caught that
    /// before this point.
    pub fn compile(
        &self,
        spec: &ResourceSpec,
        selection: &PermissionSelection,
        temporal: &TemporalMetadata,
    ) -> Result<CompiledPolicy> {
        let policy_name = generate_policy_name(temporal);
        let sid = sid_from_name(&policy_name);

        let actions = self.resolve_actions(spec, selection);
        let resources = resources_for(spec, selection)?;

        debug!(
            "compiled policy '{}' for {}: {} actions, {} resources",
            policy_name,
            spec.service(),
            actions.len(),
            resources.len()
        );

        let mut statement = Statement::allow(sid, actions, resources);
        if let Some(condition) = condition_for(spec) {
            statement = statement.with_condition(condition);
        }

        Ok(CompiledPolicy {
            policy_name,
            document: PolicyDocument::single(statement),
        })
    }

    /// Resolve the action list in catalog order.
    ///
    /// A flag contributes its actions when the user selected it or when the
    /// service forces it (STS's `assumerole`, SES's `sendemail`). Flags
    /// present in the selection but unknown to the catalog are ignored.
    fn resolve_actions(&self, spec: &ResourceSpec, selection: &PermissionSelection) -> Vec<String> {
        let service = spec.service();
        let forced = service.forced_flag();

        self.catalog
            .entries_for(service)
            .iter()
            .filter(|entry| forced == Some(entry.flag.as_str()) || selection.is_selected(&entry.flag))
            .flat_map(|entry| entry.actions.iter().cloned())
            .collect()
    }
}

/// Compile with a fresh compiler over the embedded catalog.
///
/// # Errors
/// See [`Compiler::compile`].
pub fn compile(
    spec: &ResourceSpec,
    selection: &PermissionSelection,
    temporal: &TemporalMetadata,
) -> Result<CompiledPolicy> {
    Compiler::new()?.compile(spec, selection, temporal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServiceChoice;
    use chrono::NaiveDate;

    fn s3_spec() -> ResourceSpec {
        ResourceSpec::S3 {
            bucket: "my-bucket".to_string(),
            prefix: "logs".to_string(),
            multiregion: false,
        }
    }

    #[test]
    fn test_policy_name_shapes() {
        let standing = generate_policy_name(&TemporalMetadata::default());
        assert!(standing.starts_with("ConsoleMe"));
        assert_eq!(standing.len(), "ConsoleMe".len() + 8);
        assert!(standing["ConsoleMe".len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));

        let date = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
        let temporary = generate_policy_name(&TemporalMetadata::expiring(date));
        assert!(temporary.starts_with("temp_2026-09-30_"));
        assert_eq!(temporary.len(), "temp_2026-09-30_".len() + 8);
    }

    #[test]
    fn test_sid_strips_non_alphanumerics() {
        assert_eq!(sid_from_name("temp_2026-09-30_a1B2c3D4"), "temp20260930a1B2c3D4");
        assert_eq!(sid_from_name("ConsoleMeAbCd1234"), "ConsoleMeAbCd1234");
    }

    #[test]
    fn test_action_order_follows_catalog_not_selection() {
        let compiler = Compiler::new().unwrap();

        // Select delete before list; output must still be list-first.
        let mut selection = PermissionSelection::new();
        selection.set("delete", true);
        selection.set("list", true);

        let compiled = compiler
            .compile(&s3_spec(), &selection, &TemporalMetadata::default())
            .unwrap();
        let statement = &compiled.document.statement[0];
        assert_eq!(statement.action[0], "s3:ListBucket");
        assert_eq!(statement.action[1], "s3:ListBucketVersions");
        assert_eq!(statement.action[2], "s3:DeleteObject");
    }

    #[test]
    fn test_all_flags_false_yields_empty_actions() {
        let compiler = Compiler::new().unwrap();
        let compiled = compiler
            .compile(
                &s3_spec(),
                &PermissionSelection::new(),
                &TemporalMetadata::default(),
            )
            .unwrap();

        let statement = &compiled.document.statement[0];
        assert!(statement.action.is_empty());
        assert_eq!(
            statement.resource,
            vec!["arn:aws:s3:::my-bucket/logs/*", "arn:aws:s3:::my-bucket"]
        );
    }

    #[test]
    fn test_compile_twice_differs_only_in_name_and_sid() {
        let compiler = Compiler::new().unwrap();
        let selection = PermissionSelection::from_flags(["list", "get"]);

        let first = compiler
            .compile(&s3_spec(), &selection, &TemporalMetadata::default())
            .unwrap();
        let second = compiler
            .compile(&s3_spec(), &selection, &TemporalMetadata::default())
            .unwrap();

        let stmt1 = &first.document.statement[0];
        let stmt2 = &second.document.statement[0];
        assert_eq!(stmt1.action, stmt2.action);
        assert_eq!(stmt1.resource, stmt2.resource);
        assert_eq!(stmt1.condition, stmt2.condition);
    }

    #[test]
    fn test_no_duplicate_actions_across_flags() {
        let compiler = Compiler::new().unwrap();
        let selection = PermissionSelection::from_flags(["list", "get", "put", "delete"]);

        let compiled = compiler
            .compile(&s3_spec(), &selection, &TemporalMetadata::default())
            .unwrap();
        let actions = &compiled.document.statement[0].action;

        let mut unique: Vec<&String> = actions.iter().collect();
        unique.dedup();
        assert_eq!(unique.len(), actions.len());
    }

    #[test]
    fn test_sts_scenario() {
        let compiler = Compiler::new().unwrap();
        let spec = ResourceSpec::Sts {
            role_arn: "arn:aws:iam::111111111111:role/Foo".to_string(),
        };

        // assumerole is forced on for STS even with nothing selected
        let compiled = compiler
            .compile(&spec, &PermissionSelection::new(), &TemporalMetadata::default())
            .unwrap();

        let statement = &compiled.document.statement[0];
        assert_eq!(statement.action, vec!["sts:AssumeRole"]);
        assert_eq!(statement.resource, vec!["arn:aws:iam::111111111111:role/Foo"]);
    }

    #[test]
    fn test_ses_scenario() {
        let compiler = Compiler::new().unwrap();
        let spec = ResourceSpec::Ses {
            from_address: "a@b.com".to_string(),
            identity_arn: "arn:aws:ses:us-east-1:123456789012:identity/b.com".to_string(),
        };

        let compiled = compiler
            .compile(&spec, &PermissionSelection::new(), &TemporalMetadata::default())
            .unwrap();

        let statement = &compiled.document.statement[0];
        assert_eq!(statement.action, vec!["ses:SendEmail", "ses:SendRawEmail"]);
        let condition = statement.condition.as_ref().unwrap();
        assert_eq!(condition["StringLike"]["ses:FromAddress"], "a@b.com");
    }

    #[test]
    fn test_unknown_flags_are_ignored() {
        let compiler = Compiler::new().unwrap();
        let mut selection = PermissionSelection::from_flags(["list"]);
        selection.set("launch-missiles", true);

        let compiled = compiler
            .compile(&s3_spec(), &selection, &TemporalMetadata::default())
            .unwrap();
        assert_eq!(
            compiled.document.statement[0].action,
            vec!["s3:ListBucket", "s3:ListBucketVersions"]
        );
    }

    #[test]
    fn test_custom_compiles_to_empty_statement() {
        let compiler = Compiler::new().unwrap();
        let compiled = compiler
            .compile(
                &ResourceSpec::Custom,
                &PermissionSelection::new(),
                &TemporalMetadata::default(),
            )
            .unwrap();

        let statement = &compiled.document.statement[0];
        assert!(statement.action.is_empty());
        assert!(statement.resource.is_empty());
        assert_eq!(ResourceSpec::Custom.service(), ServiceChoice::Custom);
    }
}
