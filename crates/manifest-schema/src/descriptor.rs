//! ClusterServiceVersion: the primary descriptor of an operator bundle.
//!
//! Field tables for the completeness check are declared next to each type.
//! Paths are built from the PascalCase names used in those tables, so the
//! whole status block is addressed as `Status`.

use crate::fields::{FieldMeta, FieldValue, Inspect};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of the primary descriptor object.
pub const CSV_KIND: &str = "ClusterServiceVersion";

/// Annotation carrying example custom resources.
pub const ALM_EXAMPLES_ANNOTATION: &str = "alm-examples";
/// Alternate spelling of [`ALM_EXAMPLES_ANNOTATION`].
pub const OLM_EXAMPLES_ANNOTATION: &str = "olm.examples";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub api_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub uid: Option<uuid::Uuid>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

/// The primary descriptor object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterServiceVersion {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: CsvSpec,
    #[serde(default)]
    pub status: CsvStatus,
}

impl ClusterServiceVersion {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn replaces(&self) -> &str {
        &self.spec.replaces
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.metadata.annotations
    }

    /// Names of the CustomResourceDefinitions this descriptor owns.
    pub fn owned_crd_names(&self) -> impl Iterator<Item = &str> {
        self.spec
            .custom_resource_definitions
            .owned
            .iter()
            .map(|crd| crd.name.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CsvSpec {
    pub install_strategy: NamedInstallStrategy,
    pub version: OperatorVersion,
    pub maturity: String,
    #[serde(rename = "customresourcedefinitions")]
    pub custom_resource_definitions: CustomResourceDefinitions,
    #[serde(rename = "apiservicedefinitions")]
    pub api_service_definitions: ApiServiceDefinitions,
    #[serde(rename = "nativeAPIs")]
    pub native_apis: Vec<GroupVersionKind>,
    pub min_kube_version: String,
    pub display_name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub maintainers: Vec<Maintainer>,
    pub provider: AppLink,
    pub links: Vec<AppLink>,
    pub icon: Vec<Icon>,
    pub install_modes: Vec<InstallMode>,
    pub replaces: String,
    pub skips: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub selector: Option<LabelSelector>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedInstallStrategy {
    #[serde(rename = "strategy")]
    pub strategy_name: String,
    /// Strategy payload, kept undecoded.
    #[serde(rename = "spec")]
    pub strategy_spec_raw: Value,
}

/// Semantic version of the operator, kept as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorVersion(pub String);

impl OperatorVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperatorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomResourceDefinitions {
    pub owned: Vec<CrdDescription>,
    pub required: Vec<CrdDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrdDescription {
    /// `<plural>.<group>`
    pub name: String,
    pub version: String,
    pub kind: String,
    pub display_name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiServiceDefinitions {
    pub owned: Vec<ApiServiceDescription>,
    pub required: Vec<ApiServiceDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiServiceDescription {
    pub name: String,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub deployment_name: String,
    pub container_port: i32,
    pub display_name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Maintainer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Icon {
    pub base64data: String,
    pub mediatype: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallMode {
    #[serde(rename = "type")]
    pub mode_type: String,
    #[serde(default)]
    pub supported: bool,
}

impl InstallMode {
    pub fn new(mode_type: impl Into<String>, supported: bool) -> Self {
        Self {
            mode_type: mode_type.into(),
            supported,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelSelector {
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CsvStatus {
    pub phase: String,
    pub message: String,
    pub reason: String,
    pub last_update_time: Option<DateTime<Utc>>,
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl Inspect for ClusterServiceVersion {
    fn fields(&self) -> Vec<FieldMeta<'_>> {
        vec![
            FieldMeta::required("TypeMeta", FieldValue::Struct(&self.type_meta)),
            FieldMeta::required("ObjectMeta", FieldValue::Struct(&self.metadata)),
            FieldMeta::required("Spec", FieldValue::Struct(&self.spec)),
            FieldMeta::required("Status", FieldValue::Struct(&self.status)),
        ]
    }
}

impl Inspect for TypeMeta {
    fn fields(&self) -> Vec<FieldMeta<'_>> {
        vec![
            FieldMeta::optional("Kind", FieldValue::text(&self.kind)),
            FieldMeta::optional("APIVersion", FieldValue::text(&self.api_version)),
        ]
    }
}

impl Inspect for ObjectMeta {
    fn fields(&self) -> Vec<FieldMeta<'_>> {
        vec![
            FieldMeta::optional("Name", FieldValue::text(&self.name)),
            FieldMeta::optional("Namespace", FieldValue::text(&self.namespace)),
            FieldMeta::optional("UID", FieldValue::opt(&self.uid)),
            FieldMeta::optional("Labels", FieldValue::map(&self.labels)),
            FieldMeta::optional("Annotations", FieldValue::map(&self.annotations)),
            FieldMeta::optional(
                "CreationTimestamp",
                FieldValue::opt(&self.creation_timestamp),
            ),
        ]
    }
}

impl Inspect for CsvSpec {
    fn fields(&self) -> Vec<FieldMeta<'_>> {
        vec![
            FieldMeta::required("InstallStrategy", FieldValue::Struct(&self.install_strategy)),
            FieldMeta::optional("Version", FieldValue::text(self.version.as_str())),
            FieldMeta::optional("Maturity", FieldValue::text(&self.maturity)),
            FieldMeta::optional(
                "CustomResourceDefinitions",
                FieldValue::Struct(&self.custom_resource_definitions),
            ),
            FieldMeta::optional(
                "APIServiceDefinitions",
                FieldValue::Struct(&self.api_service_definitions),
            ),
            FieldMeta::optional("NativeAPIs", FieldValue::seq(&self.native_apis)),
            FieldMeta::optional("MinKubeVersion", FieldValue::text(&self.min_kube_version)),
            FieldMeta::required("DisplayName", FieldValue::text(&self.display_name)),
            FieldMeta::optional("Description", FieldValue::text(&self.description)),
            FieldMeta::optional("Keywords", FieldValue::seq(&self.keywords)),
            FieldMeta::optional("Maintainers", FieldValue::seq(&self.maintainers)),
            FieldMeta::optional("Provider", FieldValue::Struct(&self.provider)),
            FieldMeta::optional("Links", FieldValue::seq(&self.links)),
            FieldMeta::optional("Icon", FieldValue::seq(&self.icon)),
            FieldMeta::optional("InstallModes", FieldValue::seq(&self.install_modes)),
            FieldMeta::optional("Replaces", FieldValue::text(&self.replaces)),
            FieldMeta::optional("Skips", FieldValue::seq(&self.skips)),
            FieldMeta::optional("Labels", FieldValue::map(&self.labels)),
            FieldMeta::optional("Annotations", FieldValue::map(&self.annotations)),
            FieldMeta::optional("Selector", FieldValue::opt(&self.selector)),
        ]
    }
}

impl Inspect for NamedInstallStrategy {
    fn fields(&self) -> Vec<FieldMeta<'_>> {
        vec![
            FieldMeta::required("StrategyName", FieldValue::text(&self.strategy_name)),
            FieldMeta::optional("StrategySpecRaw", FieldValue::Raw(&self.strategy_spec_raw)),
        ]
    }
}

impl Inspect for CustomResourceDefinitions {
    fn fields(&self) -> Vec<FieldMeta<'_>> {
        vec![
            FieldMeta::optional("Owned", FieldValue::seq(&self.owned)),
            FieldMeta::optional("Required", FieldValue::seq(&self.required)),
        ]
    }
}

impl Inspect for ApiServiceDefinitions {
    fn fields(&self) -> Vec<FieldMeta<'_>> {
        vec![
            FieldMeta::optional("Owned", FieldValue::seq(&self.owned)),
            FieldMeta::optional("Required", FieldValue::seq(&self.required)),
        ]
    }
}

impl Inspect for AppLink {
    fn fields(&self) -> Vec<FieldMeta<'_>> {
        vec![
            FieldMeta::optional("Name", FieldValue::text(&self.name)),
            FieldMeta::optional("URL", FieldValue::text(&self.url)),
        ]
    }
}

impl Inspect for CsvStatus {
    fn fields(&self) -> Vec<FieldMeta<'_>> {
        vec![
            FieldMeta::optional("Phase", FieldValue::text(&self.phase)),
            FieldMeta::optional("Message", FieldValue::text(&self.message)),
            FieldMeta::optional("Reason", FieldValue::text(&self.reason)),
            FieldMeta::optional("LastUpdateTime", FieldValue::opt(&self.last_update_time)),
            FieldMeta::optional(
                "LastTransitionTime",
                FieldValue::opt(&self.last_transition_time),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = r#"
apiVersion: operators.coreos.com/v1alpha1
kind: ClusterServiceVersion
metadata:
  name: etcdoperator.v0.9.4
  annotations:
    alm-examples: '[]'
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
    - type: AllNamespaces
      supported: false
"#;

    #[test]
    fn test_decode_csv() {
        let csv: ClusterServiceVersion = serde_yaml::from_str(CSV).unwrap();
        assert_eq!(csv.type_meta.kind, CSV_KIND);
        assert_eq!(csv.name(), "etcdoperator.v0.9.4");
        assert_eq!(csv.replaces(), "etcdoperator.v0.9.2");
        assert_eq!(csv.spec.version.as_str(), "0.9.4");
        assert_eq!(csv.spec.install_strategy.strategy_name, "deployment");
        assert_eq!(csv.spec.install_modes.len(), 2);
        assert!(!csv.spec.install_modes[1].supported);
        assert_eq!(
            csv.owned_crd_names().collect::<Vec<_>>(),
            vec!["etcdclusters.etcd.database.coreos.com"]
        );
    }

    #[test]
    fn test_unset_status_is_empty() {
        let csv: ClusterServiceVersion = serde_yaml::from_str(CSV).unwrap();
        assert!(FieldValue::Struct(&csv.status).is_empty());
        assert!(!FieldValue::Struct(&csv.spec).is_empty());
    }

    #[test]
    fn test_gvk_display() {
        let gvk = GroupVersionKind::new("etcd.database.coreos.com", "v1beta2", "EtcdCluster");
        assert_eq!(
            gvk.to_string(),
            "etcd.database.coreos.com/v1beta2, Kind=EtcdCluster"
        );
    }
}
