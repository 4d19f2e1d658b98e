//! Rendering results and deciding the exit status.

use clap::ValueEnum;
use opcheck_validation::ManifestResult;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Which findings fail the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    /// Any error or warning
    Any,
    /// Errors only
    Errors,
}

impl FailOn {
    pub fn fails(self, results: &[ManifestResult]) -> bool {
        match self {
            FailOn::Any => results.iter().any(|r| !r.is_empty()),
            FailOn::Errors => results.iter().any(ManifestResult::has_error),
        }
    }
}

pub fn render(results: &[ManifestResult], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(results)),
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(results)?;
            out.push('\n');
            Ok(out)
        }
    }
}

fn render_text(results: &[ManifestResult]) -> String {
    let mut out = String::new();
    for result in results.iter().filter(|r| !r.is_empty()) {
        let _ = writeln!(
            out,
            "{} ({} errors, {} warnings)",
            result.name,
            result.errors().len(),
            result.warnings().len()
        );
        for issue in result.issues() {
            let _ = writeln!(out, "  {}", issue);
        }
    }
    if out.is_empty() {
        out.push_str("No issues found\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcheck_validation::{ErrorKind, Issue};
    use pretty_assertions::assert_eq;

    fn results() -> Vec<ManifestResult> {
        let mut csv = ManifestResult::new("etcdoperator.v0.9.4");
        csv.add(
            Issue::warn(ErrorKind::FieldMissing, "optional field is empty")
                .with_field("Spec.Icon")
                .with_value("field"),
        );
        let mut bundle = ManifestResult::new("etcd");
        bundle.add(Issue::error(
            ErrorKind::InvalidBundle,
            "owned crd (etcdclusters.etcd.database.coreos.com) not found in bundle etcd",
        ));
        vec![bundle, csv]
    }

    #[test]
    fn test_fail_policies() {
        let results = results();
        assert!(FailOn::Any.fails(&results));
        assert!(FailOn::Errors.fails(&results));

        let warnings_only = &results[1..];
        assert!(FailOn::Any.fails(warnings_only));
        assert!(!FailOn::Errors.fails(warnings_only));

        assert!(!FailOn::Any.fails(&[ManifestResult::new("clean")]));
    }

    #[test]
    fn test_render_text() {
        let text = render(&results(), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "etcd (1 errors, 0 warnings)\n  Error: owned crd (etcdclusters.etcd.database.coreos.com) not found in bundle etcd\n\
             etcdoperator.v0.9.4 (0 errors, 1 warnings)\n  Warning: Field Spec.Icon, Value field: optional field is empty\n"
        );
    }

    #[test]
    fn test_render_clean() {
        let text = render(&[], OutputFormat::Text).unwrap();
        assert_eq!(text, "No issues found\n");
    }

    #[test]
    fn test_render_json() {
        let json = render(&results(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "etcd");
        assert_eq!(value[0]["errors"][0]["type"], "BundleNotValid");
        assert_eq!(value[1]["warnings"][0]["field"], "Spec.Icon");
    }
}
