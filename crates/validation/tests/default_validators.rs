//! Runs the full default validator set over in-memory objects.

use opcheck_manifest_schema::{
    Bundle, ClusterServiceVersion, CustomResourceDefinition, Object, PackageChannel,
    PackageManifest,
};
use opcheck_validation::{
    default_validators, sort_results, DescriptorFailurePolicy, ErrorKind, Scheme, ValidatorConfig,
};
use serde_json::Value;
use std::sync::Arc;

const CSV: &str = r#"
apiVersion: operators.coreos.com/v1alpha1
kind: ClusterServiceVersion
metadata:
  name: etcdoperator.v0.9.4
  annotations:
    alm-examples: '[{"apiVersion": "etcd.database.coreos.com/v1beta2", "kind": "EtcdCluster"}]'
spec:
  displayName: etcd
  version: 0.9.4
  replaces: etcdoperator.v0.9.2
  installStrategy:
    strategy: deployment
    spec:
      deployments: []
  customresourcedefinitions:
    owned:
      - name: etcdclusters.etcd.database.coreos.com
        version: v1beta2
        kind: EtcdCluster
  installModes:
    - type: OwnNamespace
      supported: true
"#;

const CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1beta1
kind: CustomResourceDefinition
metadata:
  name: etcdclusters.etcd.database.coreos.com
spec:
  group: etcd.database.coreos.com
  version: v1beta2
  scope: Namespaced
  names:
    plural: etcdclusters
    singular: etcdcluster
    kind: EtcdCluster
    listKind: EtcdClusterList
"#;

fn bundle() -> Arc<Bundle> {
    let csv: ClusterServiceVersion = serde_yaml::from_str(CSV).unwrap();
    let doc: Value = serde_yaml::from_str(CRD).unwrap();
    let crd = CustomResourceDefinition::from_document(&doc).unwrap();
    Arc::new(Bundle::new("etcdoperator.v0.9.4").with_csv(csv).with_crd(crd))
}

fn package() -> PackageManifest {
    PackageManifest {
        package_name: "etcd".into(),
        channels: vec![PackageChannel::new("alpha", "etcdoperator.v0.9.4")],
        default_channel: "alpha".into(),
    }
}

#[tokio::test]
async fn test_bundle_and_package() {
    let scheme = Arc::new(Scheme::new().unwrap());
    let vals = default_validators(scheme, &ValidatorConfig::default());

    let mut objs = bundle().objects_to_validate();
    objs.push(Object::from(package()));

    let mut results = vals.apply(&objs).await.unwrap();
    sort_results(&mut results);

    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["etcd", "etcdoperator.v0.9.4"]);

    let manifests = &results[0];
    assert_eq!(manifests.errors().len(), 1);
    assert_eq!(manifests.errors()[0].kind, ErrorKind::InvalidCsv);
    assert!(manifests.errors()[0].detail.contains("etcdoperator.v0.9.2"));

    let csv = &results[1];
    assert!(!csv.has_error(), "{:?}", csv.errors());
    assert!(csv
        .warnings()
        .iter()
        .all(|w| w.kind == ErrorKind::FieldMissing));
}

#[tokio::test]
async fn test_name_format_is_opt_in() {
    let scheme = Arc::new(Scheme::new().unwrap());
    let config = ValidatorConfig {
        check_name_format: true,
        ..Default::default()
    };
    let vals = default_validators(scheme, &config);

    let mut csv: ClusterServiceVersion = serde_yaml::from_str(CSV).unwrap();
    csv.metadata.name = "etcdoperator".into();
    let results = vals.apply(&[Object::from(csv)]).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0]
        .errors()
        .iter()
        .any(|e| e.kind == ErrorKind::InvalidCsv));
}

#[tokio::test]
async fn test_missing_descriptor_policy() {
    let scheme = Arc::new(Scheme::new().unwrap());
    let objs = vec![Object::from(Bundle::new("broken")), Object::from(package())];

    let vals = default_validators(scheme.clone(), &ValidatorConfig::default());
    assert!(vals.apply(&objs).await.is_err());

    let config = ValidatorConfig {
        on_missing_descriptor: DescriptorFailurePolicy::Report,
        ..Default::default()
    };
    let vals = default_validators(scheme, &config);
    let results = vals.apply(&objs).await.unwrap();
    assert!(results.iter().any(|r| r.name == "broken"));
}
