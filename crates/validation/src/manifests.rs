//! Cross-bundle checks: the replaces chain and channel heads.

use crate::bundle::missing_descriptor;
use crate::config::DescriptorFailurePolicy;
use crate::result::{ErrorKind, Issue, ManifestResult};
use crate::validator::{Job, Validator};
use opcheck_common::Result;
use opcheck_manifest_schema::{Bundle, Object, PackageManifest};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Validates a package against every bundle handed alongside it. Produces a
/// single job, and only when a package and at least one bundle are present.
#[derive(Debug, Clone, Default)]
pub struct ManifestsValidator {
    policy: DescriptorFailurePolicy,
}

impl ManifestsValidator {
    pub fn new(policy: DescriptorFailurePolicy) -> Self {
        Self { policy }
    }
}

impl Validator for ManifestsValidator {
    fn name(&self) -> &'static str {
        "Manifests Validator"
    }

    fn jobs(&self, objs: &[Object]) -> Vec<Job> {
        let mut pkg: Option<Arc<PackageManifest>> = None;
        let mut bundles = Vec::new();
        for obj in objs {
            match obj {
                Object::Package(p) if pkg.is_none() => pkg = Some(p.clone()),
                Object::Bundle(b) => bundles.push(b.clone()),
                _ => {}
            }
        }

        match pkg {
            Some(pkg) if !bundles.is_empty() => {
                let policy = self.policy;
                vec![Box::new(move || validate_manifests(&pkg, &bundles, policy)) as Job]
            }
            _ => Vec::new(),
        }
    }
}

pub fn validate_manifests(
    pkg: &PackageManifest,
    bundles: &[Arc<Bundle>],
    policy: DescriptorFailurePolicy,
) -> Result<ManifestResult> {
    debug!(
        "Checking upgrade graph of {} across {} bundles",
        pkg.package_name,
        bundles.len()
    );
    let mut result = ManifestResult::new(pkg.package_name.as_str());
    let mut known = HashSet::new();
    let mut replaced_by = BTreeMap::new();

    for bundle in bundles {
        let Some(csv) = bundle.csv() else {
            missing_descriptor(&mut result, &bundle.name, policy)?;
            continue;
        };
        let replaces = csv.replaces();
        if replaces.is_empty() {
            result.add(
                Issue::warn(
                    ErrorKind::InvalidCsv,
                    "`spec.replaces` field not present. If this csv replaces an old version, populate this field with the `metadata.Name` of the old csv",
                )
                .with_value(csv.name()),
            );
        } else if replaces == csv.name() {
            result.add(
                Issue::warn(
                    ErrorKind::InvalidCsv,
                    "`spec.replaces` field matches its own `metadata.name`. It should contain `metadata.name` of the old CSV to be replaced",
                )
                .with_value(csv.name()),
            );
        } else {
            known.insert(csv.name());
            replaced_by.insert(replaces, csv.name());
        }
    }

    for (target, source) in &replaced_by {
        if !known.contains(target) {
            result.add(
                Issue::error(
                    ErrorKind::InvalidCsv,
                    format!(
                        "{:?} mentioned in the `spec.replaces` field is not present in manifests",
                        target
                    ),
                )
                .with_value(*source),
            );
        }
    }

    for channel in &pkg.channels {
        if !known.contains(channel.current_csv_name.as_str()) {
            result.add(
                Issue::error(
                    ErrorKind::InvalidBundle,
                    format!(
                        "currentCSV {:?} for channel name {:?} in package {:?} not found in bundle",
                        channel.current_csv_name, channel.name, pkg.package_name
                    ),
                )
                .with_value(channel.current_csv_name.as_str()),
            );
        }
    }

    Ok(result)
}
