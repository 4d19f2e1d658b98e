//! ClusterServiceVersion rules: name format, install modes, example
//! resources against provided APIs, and field completeness.

use crate::config::ValidatorConfig;
use crate::result::{ErrorKind, Issue, ManifestResult};
use crate::validator::{Job, Validator};
use opcheck_manifest_schema::descriptor::{
    GroupVersionKind, ALM_EXAMPLES_ANNOTATION, OLM_EXAMPLES_ANNOTATION,
};
use opcheck_manifest_schema::{ClusterServiceVersion, Inspect, Object};
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;
use tracing::debug;

static DNS1123_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
});

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(-(0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(\.(0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*)?(\+[0-9a-zA-Z-]+(\.[0-9a-zA-Z-]+)*)?$",
    )
    .unwrap()
});

/// Validates every [`Object::Descriptor`] it is handed.
#[derive(Debug, Clone, Default)]
pub struct CsvValidator {
    config: ValidatorConfig,
}

impl CsvValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }
}

impl Validator for CsvValidator {
    fn name(&self) -> &'static str {
        "ClusterServiceVersion Validator"
    }

    fn jobs(&self, objs: &[Object]) -> Vec<Job> {
        objs.iter()
            .filter_map(|obj| match obj {
                Object::Descriptor(csv) => Some(csv.clone()),
                _ => None,
            })
            .map(|csv| {
                let check_names = self.config.check_name_format;
                Box::new(move || Ok(validate_csv(&csv, check_names))) as Job
            })
            .collect()
    }
}

/// Run every descriptor rule against `csv`.
pub fn validate_csv(csv: &ClusterServiceVersion, check_names: bool) -> ManifestResult {
    debug!("Validating CSV {}", csv.name());
    let mut result = ManifestResult::new(csv.name());
    if check_names {
        result.extend(check_name_format(csv));
    }
    result.extend(check_examples(csv));
    result.extend(check_install_modes(csv));
    check_missing_fields(&mut result, csv, "");
    result
}

/// `<base>.v<semver>` where the base is a DNS-1123 subdomain.
pub fn is_valid_csv_name(name: &str) -> bool {
    name.match_indices(".v").any(|(i, _)| {
        let (base, version) = (&name[..i], &name[i + 2..]);
        DNS1123_SUBDOMAIN.is_match(base) && SEMVER.is_match(version)
    })
}

fn check_name_format(csv: &ClusterServiceVersion) -> Vec<Issue> {
    let mut issues = Vec::new();
    if !is_valid_csv_name(csv.name()) {
        issues.push(
            Issue::error(
                ErrorKind::InvalidCsv,
                format!(
                    "metadata.name {:?} must be of the form <name>.v<semver>",
                    csv.name()
                ),
            )
            .with_value(csv.name()),
        );
    }
    let replaces = csv.replaces();
    if !replaces.is_empty() && !is_valid_csv_name(replaces) {
        issues.push(
            Issue::error(
                ErrorKind::InvalidCsv,
                format!(
                    "spec.replaces {:?} must be of the form <name>.v<semver>",
                    replaces
                ),
            )
            .with_value(csv.name()),
        );
    }
    issues
}

fn check_install_modes(csv: &ClusterServiceVersion) -> Vec<Issue> {
    let modes = &csv.spec.install_modes;
    if modes.is_empty() {
        return vec![Issue::error(ErrorKind::InvalidCsv, "install modes not found").with_value(csv.name())];
    }

    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let mut any_supported = false;
    for mode in modes {
        if !seen.insert(mode.mode_type.as_str()) {
            issues.push(
                Issue::error(ErrorKind::InvalidCsv, "duplicate install modes present")
                    .with_value(csv.name()),
            );
        } else if mode.supported {
            any_supported = true;
        }
    }

    if !any_supported {
        issues.push(
            Issue::error(ErrorKind::InvalidCsv, "none of InstallModeTypes are supported")
                .with_value(csv.name()),
        );
    }
    issues
}

fn check_examples(csv: &ClusterServiceVersion) -> Vec<Issue> {
    let annotations = csv.annotations();
    if annotations.is_empty() {
        return vec![Issue::warn(ErrorKind::InvalidCsv, "annotations not found").with_value(csv.name())];
    }

    let present = |key: &str| {
        annotations
            .get(key)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    };

    let mut issues = Vec::new();
    let examples = match (present(ALM_EXAMPLES_ANNOTATION), present(OLM_EXAMPLES_ANNOTATION)) {
        (None, None) => {
            issues.push(
                Issue::warn(ErrorKind::InvalidCsv, "example annotations not found")
                    .with_value(csv.name()),
            );
            return issues;
        }
        (Some(alm), Some(_)) => {
            issues.push(
                Issue::warn(
                    ErrorKind::InvalidCsv,
                    "both `alm-examples` and `olm.examples` are present. Checking only `alm-examples`",
                )
                .with_value(csv.name()),
            );
            alm
        }
        (Some(alm), None) => alm,
        (None, Some(olm)) => olm,
    };

    let decoded: Vec<Value> = match serde_yaml::from_str(examples) {
        Ok(v) => v,
        Err(e) => {
            issues.push(Issue::error(
                ErrorKind::InvalidParse,
                format!("error decoding example CustomResource: {}", e),
            ));
            return issues;
        }
    };

    let mut parsed = BTreeSet::new();
    for example in &decoded {
        match example_gvk(example) {
            Ok(gvk) => {
                parsed.insert(gvk);
            }
            Err(issue) => issues.push(issue),
        }
    }

    let (provided, errs) = provided_apis(csv);
    issues.extend(errs);

    for gvk in parsed.iter().filter(|gvk| !provided.contains(*gvk)) {
        issues.push(
            Issue::error(
                ErrorKind::InvalidOperation,
                format!(
                    "couldn't match {} in provided APIs list: [{}]",
                    gvk,
                    provided
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join("; ")
                ),
            )
            .with_value(gvk.to_string()),
        );
    }
    issues
}

fn example_gvk(example: &Value) -> Result<GroupVersionKind, Issue> {
    let api_version = example
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let kind = example.get("kind").and_then(Value::as_str).unwrap_or_default();
    match api_version.split_once('/') {
        Some((group, version)) => Ok(GroupVersionKind::new(group, version, kind)),
        None => Err(Issue::error(
            ErrorKind::InvalidParse,
            format!(
                "couldn't parse group/version from example apiVersion {:?}",
                api_version
            ),
        )
        .with_value(kind)),
    }
}

/// The APIs a descriptor declares it owns. Schema-definition groups are taken
/// from the `<plural>.<group>` name.
fn provided_apis(csv: &ClusterServiceVersion) -> (BTreeSet<GroupVersionKind>, Vec<Issue>) {
    let mut provided = BTreeSet::new();
    let mut issues = Vec::new();

    for owned in &csv.spec.custom_resource_definitions.owned {
        match owned.name.split_once('.') {
            Some((_, group)) => {
                provided.insert(GroupVersionKind::new(group, &owned.version, &owned.kind));
            }
            None => issues.push(Issue::error(
                ErrorKind::InvalidParse,
                format!("couldn't parse plural.group from crd name: {}", owned.name),
            )),
        }
    }

    for api in &csv.spec.api_service_definitions.owned {
        provided.insert(GroupVersionKind::new(&api.group, &api.version, &api.kind));
    }

    (provided, issues)
}

/// Walk the declared field tables. Empty optional fields warn; empty
/// required fields error, except the top-level `Status`. Only non-empty
/// structs are descended into.
pub fn check_missing_fields(result: &mut ManifestResult, obj: &dyn Inspect, parent: &str) {
    for field in obj.fields() {
        let path = if parent.is_empty() {
            field.name.to_string()
        } else {
            format!("{}.{}", parent, field.name)
        };
        let empty = field.value.is_empty();
        let type_name = if field.value.is_struct() { "struct" } else { "field" };

        if empty {
            if field.optional {
                result.add(
                    Issue::warn(ErrorKind::FieldMissing, "optional field is empty")
                        .with_field(path.as_str())
                        .with_value(type_name),
                );
            } else if path != "Status" {
                result.add(
                    Issue::error(ErrorKind::FieldMissing, "required field is empty")
                        .with_field(path.as_str())
                        .with_value(type_name),
                );
            }
        } else if let opcheck_manifest_schema::FieldValue::Struct(inner) = field.value {
            check_missing_fields(result, inner, &path);
        }
    }
}
