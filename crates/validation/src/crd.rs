//! Schema-definition rules, delegated to the structural checker.

use crate::result::{ErrorKind, Issue, ManifestResult};
use crate::scheme::Scheme;
use crate::validator::{Job, Validator};
use opcheck_manifest_schema::{CustomResourceDefinition, Object};
use std::sync::Arc;
use tracing::debug;

/// Sub-fields that are never checked.
const IGNORED_FIELDS: &[&str] = &["openAPIV3Schema", "status"];

/// Validates every [`Object::SchemaDefinition`] it is handed.
#[derive(Debug, Clone)]
pub struct CrdValidator {
    scheme: Arc<Scheme>,
}

impl CrdValidator {
    pub fn new(scheme: Arc<Scheme>) -> Self {
        Self { scheme }
    }
}

impl Validator for CrdValidator {
    fn name(&self) -> &'static str {
        "CustomResourceDefinition Validator"
    }

    fn jobs(&self, objs: &[Object]) -> Vec<Job> {
        objs.iter()
            .filter_map(|obj| match obj {
                Object::SchemaDefinition(crd) => Some(crd.clone()),
                _ => None,
            })
            .map(|crd| {
                let scheme = self.scheme.clone();
                Box::new(move || Ok(validate_crd(&scheme, &crd))) as Job
            })
            .collect()
    }
}

pub fn validate_crd(scheme: &Scheme, crd: &CustomResourceDefinition) -> ManifestResult {
    debug!("Validating CRD {} ({})", crd.name(), crd.api_version());
    let mut result = ManifestResult::new(crd.name());
    let canonical = match scheme.convert(crd) {
        Ok(c) => c,
        Err(e) => {
            result.add(Issue::error(
                ErrorKind::InvalidParse,
                format!("error converting versioned crd to unversioned crd: {}", e),
            ));
            return result;
        }
    };

    for violation in scheme.check(&canonical) {
        if IGNORED_FIELDS.iter().any(|f| violation.field.contains(f)) {
            continue;
        }
        let mut issue = Issue::error(ErrorKind::Schema(violation.violation_type), violation.to_string())
            .with_field(violation.field.as_str());
        if let Some(value) = violation.bad_value.clone().filter(|v| !v.is_null()) {
            issue = issue.with_value(value);
        }
        result.add(issue);
    }
    result
}
