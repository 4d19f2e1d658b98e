//! Structural soundness checks for canonical CustomResourceDefinitions.
//!
//! Shape rules come from the compiled [`CANONICAL_CRD_SCHEMA`]; rules that
//! relate fields to each other are checked by hand afterwards.
//!
//! [`CANONICAL_CRD_SCHEMA`]: crate::schema::CANONICAL_CRD_SCHEMA

use crate::crd::CanonicalCrd;
use crate::schema;
use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Field-level violation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationType {
    #[serde(rename = "FieldValueRequired")]
    Required,
    #[serde(rename = "FieldValueInvalid")]
    Invalid,
    #[serde(rename = "FieldValueNotSupported")]
    NotSupported,
    #[serde(rename = "FieldValueDuplicate")]
    Duplicate,
    #[serde(rename = "FieldValueForbidden")]
    Forbidden,
    #[serde(rename = "FieldValueTypeInvalid")]
    TypeInvalid,
}

impl ViolationType {
    /// Stable machine-readable name, e.g. `FieldValueRequired`.
    pub fn code(&self) -> &'static str {
        match self {
            ViolationType::Required => "FieldValueRequired",
            ViolationType::Invalid => "FieldValueInvalid",
            ViolationType::NotSupported => "FieldValueNotSupported",
            ViolationType::Duplicate => "FieldValueDuplicate",
            ViolationType::Forbidden => "FieldValueForbidden",
            ViolationType::TypeInvalid => "FieldValueTypeInvalid",
        }
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationType::Required => "Required value",
            ViolationType::Invalid | ViolationType::TypeInvalid => "Invalid value",
            ViolationType::NotSupported => "Unsupported value",
            ViolationType::Duplicate => "Duplicate value",
            ViolationType::Forbidden => "Forbidden",
        };
        write!(f, "{}", s)
    }
}

/// One structural problem at a field path such as `spec.versions[0].name`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub violation_type: ViolationType,
    pub field: String,
    pub bad_value: Option<Value>,
    pub detail: String,
}

impl Violation {
    fn new(violation_type: ViolationType, field: impl Into<String>) -> Self {
        Self {
            violation_type,
            field: field.into(),
            bad_value: None,
            detail: String::new(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::new(ViolationType::Required, field)
    }

    pub fn invalid(field: impl Into<String>, value: Value, detail: impl Into<String>) -> Self {
        Self::new(ViolationType::Invalid, field)
            .with_value(value)
            .with_detail(detail)
    }

    pub fn forbidden(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ViolationType::Forbidden, field).with_detail(detail)
    }

    pub fn duplicate(field: impl Into<String>, value: Value) -> Self {
        Self::new(ViolationType::Duplicate, field).with_value(value)
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.bad_value = Some(value);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.violation_type)?;
        if let Some(value) = &self.bad_value {
            write!(f, ": {}", value)?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Compiled checker, safe to share between threads.
pub struct StructuralValidator {
    compiled: JSONSchema,
}

impl fmt::Debug for StructuralValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuralValidator").finish_non_exhaustive()
    }
}

impl StructuralValidator {
    pub fn new() -> Result<Self, String> {
        let schema_value = schema::canonical_crd_schema();
        let compiled = JSONSchema::compile(&schema_value).map_err(|e| e.to_string())?;
        Ok(Self { compiled })
    }

    /// Every violation found in `crd`, shape rules first.
    pub fn validate(&self, crd: &CanonicalCrd) -> Vec<Violation> {
        let instance = match serde_json::to_value(crd) {
            Ok(v) => v,
            Err(e) => return vec![Violation::invalid("", Value::Null, e.to_string())],
        };

        let mut violations = Vec::new();
        if let Err(errors) = self.compiled.validate(&instance) {
            for error in errors {
                let field = field_path(&error.instance_path.to_string());
                let value = error.instance.clone().into_owned();
                violations.push(match &error.kind {
                    ValidationErrorKind::Required { property } => {
                        let prop = property.as_str().unwrap_or_default();
                        Violation::required(join(&field, prop))
                    }
                    ValidationErrorKind::MinLength { .. } | ValidationErrorKind::MinItems { .. } => {
                        Violation::required(field)
                    }
                    ValidationErrorKind::Enum { options } => {
                        if value.as_str() == Some("") {
                            Violation::required(field)
                        } else {
                            Violation::new(ViolationType::NotSupported, field)
                                .with_value(value)
                                .with_detail(format!("supported values: {}", supported(options)))
                        }
                    }
                    ValidationErrorKind::Type { .. } => {
                        Violation::new(ViolationType::TypeInvalid, field)
                            .with_value(value)
                            .with_detail(error.to_string())
                    }
                    _ => Violation::invalid(field, value, error.to_string()),
                });
            }
        }

        check_naming(crd, &mut violations);
        check_versions(crd, &mut violations);
        check_subresources(crd, &mut violations);
        violations
    }
}

fn check_naming(crd: &CanonicalCrd, out: &mut Vec<Violation>) {
    let spec = &crd.spec;
    let name = &crd.metadata.name;

    if !name.is_empty() && !spec.group.is_empty() && !spec.names.plural.is_empty() {
        let expected = format!("{}.{}", spec.names.plural, spec.group);
        if *name != expected {
            out.push(Violation::invalid(
                "metadata.name",
                Value::from(name.as_str()),
                "must be spec.names.plural+\".\"+spec.group",
            ));
        }
    }

    if !spec.group.is_empty() && !spec.group.contains('.') {
        out.push(Violation::invalid(
            "spec.group",
            Value::from(spec.group.as_str()),
            "should be a domain with at least one dot",
        ));
    }

    if !spec.names.kind.is_empty() && spec.names.kind == spec.names.list_kind {
        out.push(Violation::invalid(
            "spec.names.listKind",
            Value::from(spec.names.list_kind.as_str()),
            "kind and listKind may not be the same",
        ));
    }
}

fn check_versions(crd: &CanonicalCrd, out: &mut Vec<Violation>) {
    let spec = &crd.spec;
    if spec.versions.is_empty() {
        return;
    }

    let mut seen = HashSet::new();
    for (i, version) in spec.versions.iter().enumerate() {
        if !version.name.is_empty() && !seen.insert(version.name.as_str()) {
            out.push(Violation::duplicate(
                format!("spec.versions[{}].name", i),
                Value::from(version.name.as_str()),
            ));
        }
    }

    let storage = spec.versions.iter().filter(|v| v.storage).count();
    if storage != 1 {
        out.push(Violation::invalid(
            "spec.versions",
            Value::from(storage),
            "must have exactly one version marked as storage version",
        ));
    }

    if !spec.versions.iter().any(|v| v.served) {
        out.push(Violation::invalid(
            "spec.versions",
            Value::Null,
            "must have at least one version marked as served",
        ));
    }

    if let Some(version) = &spec.version {
        if *version != spec.versions[0].name {
            out.push(Violation::invalid(
                "spec.version",
                Value::from(version.as_str()),
                "must match the first version in spec.versions",
            ));
        }
    }

    let top_level_schema = spec
        .validation
        .as_ref()
        .is_some_and(|v| v.open_api_v3_schema.is_some());
    for (i, version) in spec.versions.iter().enumerate() {
        let Some(schema) = version.schema.as_ref().and_then(|s| s.open_api_v3_schema.as_ref()) else {
            continue;
        };
        if top_level_schema {
            out.push(Violation::forbidden(
                format!("spec.versions[{}].schema", i),
                "top-level and per-version schemas are mutually exclusive",
            ));
        }
        if let Some(ty) = schema.get("type") {
            if ty.as_str() != Some("object") {
                out.push(Violation::invalid(
                    format!("spec.versions[{}].schema.openAPIV3Schema.type", i),
                    ty.clone(),
                    "must be object at the root",
                ));
            }
        }
    }
}

fn check_subresources(crd: &CanonicalCrd, out: &mut Vec<Violation>) {
    let spec = &crd.spec;
    let top_level = spec.subresources.as_ref().filter(|s| !s.is_null());
    if let Some(sub) = top_level {
        check_subresource_shape("spec.subresources", sub, out);
    }

    for (i, version) in spec.versions.iter().enumerate() {
        let Some(sub) = version.subresources.as_ref().filter(|s| !s.is_null()) else {
            continue;
        };
        let path = format!("spec.versions[{}].subresources", i);
        if top_level.is_some() {
            out.push(Violation::forbidden(
                path.clone(),
                "top-level and per-version subresources are mutually exclusive",
            ));
        }
        check_subresource_shape(&path, sub, out);
    }
}

fn check_subresource_shape(path: &str, sub: &Value, out: &mut Vec<Violation>) {
    if let Some(status) = sub.get("status") {
        if !status.is_object() {
            out.push(Violation::invalid(
                format!("{}.status", path),
                status.clone(),
                "must be an object",
            ));
        }
    }

    if let Some(scale) = sub.get("scale") {
        for key in ["specReplicasPath", "statusReplicasPath"] {
            let set = scale
                .get(key)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());
            if !set {
                out.push(Violation::required(format!("{}.scale.{}", path, key)));
            }
        }
    }
}

/// `/spec/versions/0/name` becomes `spec.versions[0].name`.
fn field_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if segment.chars().all(|c| c.is_ascii_digit()) {
            path.push_str(&format!("[{}]", segment));
        } else {
            path = join(&path, &segment);
        }
    }
    path
}

fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}.{}", parent, child)
    }
}

fn supported(options: &Value) -> String {
    match options {
        Value::Array(items) => items
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
