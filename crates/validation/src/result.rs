//! Validation findings and their per-object aggregation.

use opcheck_common::Error;
use opcheck_manifest_schema::ViolationType;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Severity of an [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Level {
    Error,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "Error"),
            Level::Warning => write!(f, "Warning"),
        }
    }
}

/// What kind of rule an [`Issue`] reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidCsv,
    FieldMissing,
    UnsupportedType,
    InvalidParse,
    Io,
    FailedValidation,
    InvalidOperation,
    InvalidManifestStructure,
    InvalidBundle,
    InvalidPackageManifest,
    /// A structural schema-definition violation.
    Schema(ViolationType),
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidCsv => "CSVFileNotValid",
            ErrorKind::FieldMissing => "FieldNotFound",
            ErrorKind::UnsupportedType => "UnsupportedType",
            ErrorKind::InvalidParse => "ParseError",
            ErrorKind::Io => "FileReadError",
            ErrorKind::FailedValidation => "ValidationFailed",
            ErrorKind::InvalidOperation => "OperationFailed",
            ErrorKind::InvalidManifestStructure => "ManifestStructureNotValid",
            ErrorKind::InvalidBundle => "BundleNotValid",
            ErrorKind::InvalidPackageManifest => "PackageManifestNotValid",
            ErrorKind::Schema(v) => v.code(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single finding. The level is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    level: Level,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub detail: String,
}

impl Issue {
    pub fn error(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::new(Level::Error, kind, detail)
    }

    pub fn warn(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::new(Level::Warning, kind, detail)
    }

    fn new(level: Level, kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            level,
            field: String::new(),
            value: None,
            detail: detail.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.level)?;
        let mut prefixed = false;
        if !self.field.is_empty() {
            write!(f, "Field {}", self.field)?;
            prefixed = true;
        }
        if let Some(value) = &self.value {
            if prefixed {
                write!(f, ", ")?;
            }
            match value {
                Value::String(s) => write!(f, "Value {}", s)?,
                other => write!(f, "Value {}", other)?,
            }
            prefixed = true;
        }
        if !self.detail.is_empty() {
            if prefixed {
                write!(f, ": ")?;
            }
            write!(f, "{}", self.detail)?;
        }
        Ok(())
    }
}

/// Every finding for one validated entity, split by level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ManifestResult {
    pub name: String,
    errors: Vec<Issue>,
    warnings: Vec<Issue>,
}

impl ManifestResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Record a finding under its own level, keeping insertion order.
    pub fn add(&mut self, issue: Issue) {
        match issue.level {
            Level::Error => self.errors.push(issue),
            Level::Warning => self.warnings.push(issue),
        }
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.add(issue);
        }
    }

    pub fn errors(&self) -> &[Issue] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Issue] {
        &self.warnings
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warn(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_error() && !self.has_warn()
    }

    /// Errors first, then warnings.
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// Report a load failure in the same shape as validation findings.
    pub fn from_load_error(name: impl Into<String>, err: &Error) -> Self {
        let mut result = Self::new(name);
        for leaf in err.leaves() {
            let kind = if leaf.is_io() {
                ErrorKind::Io
            } else {
                ErrorKind::InvalidParse
            };
            result.add(Issue::error(kind, leaf.to_string()));
        }
        result
    }
}

/// Order results by entity name. Concurrent runs give no ordering guarantee.
pub fn sort_results(results: &mut [ManifestResult]) {
    results.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_add_splits_by_level() {
        let mut result = ManifestResult::new("etcdoperator.v0.9.4");
        assert!(result.is_empty());

        result.add(Issue::warn(ErrorKind::FieldMissing, "optional"));
        result.add(Issue::error(ErrorKind::InvalidCsv, "first"));
        result.add(Issue::error(ErrorKind::InvalidCsv, "second"));

        assert!(result.has_error());
        assert!(result.has_warn());
        assert_eq!(result.errors().len(), 2);
        assert_eq!(result.errors()[0].detail, "first");
        assert_eq!(result.errors()[1].detail, "second");
        assert!(result.errors().iter().all(|e| e.level() == Level::Error));
        assert_eq!(result.warnings()[0].level(), Level::Warning);
        assert_eq!(result.issues().count(), 3);
    }

    #[test]
    fn test_issue_display() {
        let issue = Issue::error(ErrorKind::InvalidCsv, "install modes not found")
            .with_value("etcdoperator.v0.9.4");
        assert_eq!(
            issue.to_string(),
            "Error: Value etcdoperator.v0.9.4: install modes not found"
        );

        let issue = Issue::warn(ErrorKind::FieldMissing, "").with_field("Spec.Icon").with_value("field");
        assert_eq!(issue.to_string(), "Warning: Field Spec.Icon, Value field");

        let issue = Issue::error(ErrorKind::InvalidParse, "bad yaml");
        assert_eq!(issue.to_string(), "Error: bad yaml");
    }

    #[test]
    fn test_serialize_kind_as_code() {
        let issue = Issue::error(ErrorKind::Schema(ViolationType::Required), "missing")
            .with_field("spec.scope");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "FieldValueRequired");
        assert_eq!(json["level"], "Error");
        assert_eq!(json["field"], "spec.scope");
    }

    #[test]
    fn test_from_load_error() {
        let err = Error::Aggregate(vec![
            Error::File {
                path: PathBuf::from("manifests/a.yaml"),
                reason: "permission denied".into(),
            },
            Error::HiddenFile(PathBuf::from("manifests/.b")),
        ]);
        let result = ManifestResult::from_load_error("bundle", &err);
        assert_eq!(result.errors().len(), 2);
        assert_eq!(result.errors()[0].kind, ErrorKind::Io);
        assert_eq!(result.errors()[1].kind, ErrorKind::InvalidParse);
    }

    #[test]
    fn test_sort_results() {
        let mut results = vec![ManifestResult::new("b"), ManifestResult::new("a")];
        sort_results(&mut results);
        assert_eq!(results[0].name, "a");
    }
}
