//! Package manifest channel integrity.

use crate::result::{ErrorKind, Issue, ManifestResult};
use crate::validator::{Job, Validator};
use opcheck_manifest_schema::{Object, PackageManifest};
use std::collections::HashSet;

/// Validates every [`Object::Package`] it is handed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageValidator;

impl Validator for PackageValidator {
    fn name(&self) -> &'static str {
        "PackageManifest Validator"
    }

    fn jobs(&self, objs: &[Object]) -> Vec<Job> {
        objs.iter()
            .filter_map(|obj| match obj {
                Object::Package(pkg) => Some(pkg.clone()),
                _ => None,
            })
            .map(|pkg| Box::new(move || Ok(validate_package(&pkg))) as Job)
            .collect()
    }
}

pub fn validate_package(pkg: &PackageManifest) -> ManifestResult {
    let mut result = ManifestResult::new(pkg.package_name.as_str());
    result.extend(check_channels(pkg));
    result
}

fn check_channels(pkg: &PackageManifest) -> Vec<Issue> {
    let invalid = |detail: String| {
        Issue::error(ErrorKind::InvalidPackageManifest, detail).with_value(pkg.package_name.as_str())
    };

    let mut issues = Vec::new();
    if pkg.package_name.is_empty() {
        issues.push(invalid("packageName empty".into()));
    }
    if pkg.channels.is_empty() {
        issues.push(invalid("channels empty".into()));
        return issues;
    }
    if pkg.default_channel.is_empty() {
        issues.push(
            Issue::warn(ErrorKind::InvalidPackageManifest, "default channel not found")
                .with_value(pkg.package_name.as_str()),
        );
    }

    let mut seen = HashSet::new();
    for (i, channel) in pkg.channels.iter().enumerate() {
        if channel.name.is_empty() {
            issues.push(invalid(format!("channel {} name cannot be empty", i)));
        }
        if channel.current_csv_name.is_empty() {
            issues.push(invalid(format!(
                "channel {:?} currentCSV cannot be empty",
                channel.name
            )));
        }
        if !seen.insert(channel.name.as_str()) {
            issues.push(invalid(format!(
                "duplicate package manifest channel name {:?}; channel names must be unique",
                channel.name
            )));
        }
    }

    if !pkg.default_channel.is_empty() && !seen.contains(pkg.default_channel.as_str()) {
        issues.push(invalid(format!(
            "default channel {} not found in the list of declared channels",
            pkg.default_channel
        )));
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcheck_manifest_schema::PackageChannel;
    use pretty_assertions::assert_eq;

    fn package() -> PackageManifest {
        PackageManifest {
            package_name: "etcd".into(),
            channels: vec![
                PackageChannel::new("alpha", "etcdoperator.v0.9.2"),
                PackageChannel::new("singlenamespace-alpha", "etcdoperator.v0.9.4"),
            ],
            default_channel: "alpha".into(),
        }
    }

    fn details(result: &ManifestResult) -> Vec<&str> {
        result.errors().iter().map(|e| e.detail.as_str()).collect()
    }

    #[test]
    fn test_valid_package() {
        assert!(validate_package(&package()).is_empty());
    }

    #[test]
    fn test_no_channels_stops_early() {
        let pkg = PackageManifest {
            default_channel: "missing".into(),
            ..Default::default()
        };
        let result = validate_package(&pkg);
        assert_eq!(details(&result), vec!["packageName empty", "channels empty"]);
        assert!(!result.has_warn());
    }

    #[test]
    fn test_missing_default_channel_warns() {
        let mut pkg = package();
        pkg.default_channel.clear();
        let result = validate_package(&pkg);
        assert!(!result.has_error());
        assert_eq!(result.warnings()[0].detail, "default channel not found");
    }

    #[test]
    fn test_channel_rules() {
        let mut pkg = package();
        pkg.channels.push(PackageChannel::new("", ""));
        pkg.channels.push(PackageChannel::new("alpha", "etcdoperator.v0.9.0"));
        let result = validate_package(&pkg);
        assert_eq!(
            details(&result),
            vec![
                "channel 2 name cannot be empty",
                "channel \"\" currentCSV cannot be empty",
                "duplicate package manifest channel name \"alpha\"; channel names must be unique",
            ]
        );
    }

    #[test]
    fn test_unknown_default_channel() {
        let mut pkg = package();
        pkg.default_channel = "stable".into();
        let result = validate_package(&pkg);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].kind, ErrorKind::InvalidPackageManifest);
        assert!(result.errors()[0].detail.contains("stable"));
    }
}
