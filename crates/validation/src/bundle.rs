//! Per-bundle ownership of schema definitions.

use crate::config::DescriptorFailurePolicy;
use crate::result::{ErrorKind, Issue, ManifestResult};
use crate::validator::{Job, Validator};
use opcheck_common::{Error, Result};
use opcheck_manifest_schema::{Bundle, ClusterServiceVersion, Object};
use tracing::warn;

/// Validates every [`Object::Bundle`] it is handed.
#[derive(Debug, Clone, Default)]
pub struct BundleValidator {
    policy: DescriptorFailurePolicy,
}

impl BundleValidator {
    pub fn new(policy: DescriptorFailurePolicy) -> Self {
        Self { policy }
    }
}

impl Validator for BundleValidator {
    fn name(&self) -> &'static str {
        "Bundle Validator"
    }

    fn jobs(&self, objs: &[Object]) -> Vec<Job> {
        objs.iter()
            .filter_map(|obj| match obj {
                Object::Bundle(bundle) => Some(bundle.clone()),
                _ => None,
            })
            .map(|bundle| {
                let policy = self.policy;
                Box::new(move || validate_bundle(&bundle, policy)) as Job
            })
            .collect()
    }
}

pub fn validate_bundle(bundle: &Bundle, policy: DescriptorFailurePolicy) -> Result<ManifestResult> {
    let mut result = ManifestResult::new(bundle.name.as_str());
    let Some(csv) = bundle.csv() else {
        warn!("Bundle {} has no CSV", bundle.name);
        missing_descriptor(&mut result, &bundle.name, policy)?;
        return Ok(result);
    };
    result.extend(check_owned_crds(bundle, csv));
    Ok(result)
}

/// Apply `policy` to a bundle whose descriptor could not be retrieved.
/// Under `Report` the issue is recorded and the caller carries on.
pub(crate) fn missing_descriptor(
    result: &mut ManifestResult,
    bundle_name: &str,
    policy: DescriptorFailurePolicy,
) -> Result<()> {
    match policy {
        DescriptorFailurePolicy::Abort => Err(Error::MissingDescriptor(bundle_name.to_string())),
        DescriptorFailurePolicy::Report => {
            result.add(
                Issue::error(ErrorKind::InvalidParse, "error getting bundle CSV")
                    .with_value(bundle_name),
            );
            Ok(())
        }
    }
}

fn check_owned_crds(bundle: &Bundle, csv: &ClusterServiceVersion) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut present = bundle.crd_names();

    for owned in &csv.spec.custom_resource_definitions.owned {
        let Some(crd) = bundle.crd(&owned.name) else {
            issues.push(
                Issue::error(
                    ErrorKind::InvalidBundle,
                    format!("owned crd ({}) not found in bundle {}", owned.name, bundle.name),
                )
                .with_value(owned.name.as_str()),
            );
            continue;
        };
        present.remove(owned.name.as_str());

        if !crd.version_names().contains(&owned.version.as_str()) {
            issues.push(
                Issue::error(
                    ErrorKind::InvalidBundle,
                    format!(
                        "owned crd ({}) version {:?} not served by the bundled CRD (versions: {})",
                        owned.name,
                        owned.version,
                        crd.version_names().join(", ")
                    ),
                )
                .with_value(owned.name.as_str()),
            );
        }
        if owned.kind != crd.resource_kind() {
            issues.push(
                Issue::error(
                    ErrorKind::InvalidBundle,
                    format!(
                        "owned crd ({}) kind {:?} does not match the bundled CRD kind {:?}",
                        owned.name,
                        owned.kind,
                        crd.resource_kind()
                    ),
                )
                .with_value(owned.name.as_str()),
            );
        }
    }

    for name in present {
        issues.push(
            Issue::warn(
                ErrorKind::InvalidBundle,
                format!(
                    "`{}` crd present in bundle `{}` not defined in csv",
                    name, bundle.name
                ),
            )
            .with_value(name),
        );
    }
    issues
}
