//! Load a directory and run the default validator set over it.

use opcheck_common::Error;
use opcheck_validation::{
    default_validators, sort_results, ManifestResult, Scheme, ValidatorConfig,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Validate everything under `dir`.
///
/// A directory that cannot be loaded at all yields a single result holding
/// the load failure. Per-file load errors are reported under the directory
/// name next to the validation results.
pub async fn validate_dir(dir: &Path, config: &ValidatorConfig) -> anyhow::Result<Vec<ManifestResult>> {
    let name = dir.display().to_string();
    let (loaded, load_errs) = match opcheck_loader::load_lenient(dir) {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!("Failed to load {}: {}", name, e);
            return Ok(vec![ManifestResult::from_load_error(name, &e)]);
        }
    };

    let validators = default_validators(Arc::new(Scheme::new()?), config);
    info!(
        "Running {} validators over {}",
        validators.len(),
        loaded.name()
    );
    let mut results = validators.apply(&loaded.into_objects()).await?;

    if let Err(e) = Error::aggregate(load_errs) {
        warn!("{} file(s) in {} could not be loaded", e.leaves().len(), name);
        results.push(ManifestResult::from_load_error(name, &e));
    }

    sort_results(&mut results);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcheck_validation::{DescriptorFailurePolicy, ErrorKind};
    use std::fs;
    use tempfile::tempdir;

    const ANNOTATIONS: &str = "annotations:\n  operators.operatorframework.io.bundle.mediatype.v1: registry+v1\n  operators.operatorframework.io.bundle.manifests.v1: manifests/\n  operators.operatorframework.io.bundle.metadata.v1: metadata/\n  operators.operatorframework.io.bundle.package.v1: etcd\n  operators.operatorframework.io.bundle.channels.v1: alpha\n  operators.operatorframework.io.bundle.channel.default.v1: alpha\n";

    const CSV: &str = r#"apiVersion: operators.coreos.com/v1alpha1
kind: ClusterServiceVersion
metadata:
  name: etcdoperator.v0.9.4
spec:
  displayName: etcd
  customresourcedefinitions:
    owned:
      - name: etcdclusters.etcd.database.coreos.com
        version: v1beta2
        kind: EtcdCluster
"#;

    #[tokio::test]
    async fn test_unloadable_dir_reports_load_error() {
        let dir = tempdir().unwrap();
        let results = validate_dir(dir.path(), &ValidatorConfig::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].has_error());
        assert_eq!(results[0].errors()[0].kind, ErrorKind::InvalidParse);
        assert!(results[0].errors()[0]
            .detail
            .starts_with("no annotations file found"));
    }

    #[tokio::test]
    async fn test_bundle_with_missing_crd() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("metadata")).unwrap();
        fs::create_dir_all(dir.path().join("manifests")).unwrap();
        fs::write(dir.path().join("metadata/annotations.yaml"), ANNOTATIONS).unwrap();
        fs::write(dir.path().join("manifests/csv.yaml"), CSV).unwrap();
        fs::write(dir.path().join("manifests/.hidden"), "").unwrap();

        let config = ValidatorConfig {
            on_missing_descriptor: DescriptorFailurePolicy::Report,
            ..Default::default()
        };
        let results = validate_dir(dir.path(), &config).await.unwrap();

        let bundle = results
            .iter()
            .find(|r| r.name == "etcdoperator.v0.9.4" && r.has_error() && r.errors()[0].kind == ErrorKind::InvalidBundle)
            .unwrap();
        assert!(bundle.errors()[0]
            .detail
            .starts_with("owned crd (etcdclusters.etcd.database.coreos.com) not found"));

        let load = results
            .iter()
            .find(|r| r.name == dir.path().display().to_string())
            .unwrap();
        assert_eq!(load.errors().len(), 1);
    }
}
