//! CustomResourceDefinition shapes and their version-independent form.
//!
//! Bundles may ship schema definitions in the legacy `v1beta1` shape or the
//! current `v1` shape. Structural checks run on [`CanonicalCrd`], which both
//! shapes convert into.

use crate::descriptor::{ObjectMeta, TypeMeta};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const CRD_KIND: &str = "CustomResourceDefinition";
pub const CRD_V1BETA1: &str = "apiextensions.k8s.io/v1beta1";
pub const CRD_V1: &str = "apiextensions.k8s.io/v1";

#[derive(Error, Debug)]
pub enum CrdError {
    #[error("unsupported CRD version {0}")]
    UnsupportedVersion(String),

    #[error("error parsing CRD: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("error converting versioned crd {0} to unversioned crd: neither spec.version nor spec.versions is set")]
    NoVersions(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrdNames {
    pub plural: String,
    pub singular: String,
    pub kind: String,
    pub list_kind: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomResourceValidation {
    #[serde(
        rename = "openAPIV3Schema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub open_api_v3_schema: Option<Value>,
}

pub mod v1beta1 {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct CustomResourceDefinition {
        #[serde(flatten)]
        pub type_meta: TypeMeta,
        #[serde(default)]
        pub metadata: ObjectMeta,
        #[serde(default)]
        pub spec: CrdSpec,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct CrdSpec {
        pub group: String,
        pub version: String,
        pub versions: Vec<CrdVersion>,
        pub names: CrdNames,
        pub scope: String,
        pub validation: Option<CustomResourceValidation>,
        pub subresources: Option<Value>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CrdVersion {
        pub name: String,
        pub served: bool,
        pub storage: bool,
        pub schema: Option<CustomResourceValidation>,
        pub subresources: Option<Value>,
    }
}

pub mod v1 {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct CustomResourceDefinition {
        #[serde(flatten)]
        pub type_meta: TypeMeta,
        #[serde(default)]
        pub metadata: ObjectMeta,
        #[serde(default)]
        pub spec: CrdSpec,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CrdSpec {
        pub group: String,
        pub names: CrdNames,
        pub scope: String,
        pub versions: Vec<CrdVersion>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CrdVersion {
        pub name: String,
        pub served: bool,
        pub storage: bool,
        pub schema: Option<CustomResourceValidation>,
        pub subresources: Option<Value>,
    }
}

/// A schema-definition object in either served shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomResourceDefinition {
    V1beta1(v1beta1::CustomResourceDefinition),
    V1(v1::CustomResourceDefinition),
}

impl CustomResourceDefinition {
    /// Type a decoded document by its `apiVersion`.
    pub fn from_document(doc: &Value) -> Result<Self, CrdError> {
        let api_version = doc
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or_default();
        match api_version {
            CRD_V1BETA1 => Ok(Self::V1beta1(serde_json::from_value(doc.clone())?)),
            CRD_V1 => Ok(Self::V1(serde_json::from_value(doc.clone())?)),
            other => Err(CrdError::UnsupportedVersion(other.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::V1beta1(crd) => &crd.metadata.name,
            Self::V1(crd) => &crd.metadata.name,
        }
    }

    pub fn api_version(&self) -> &'static str {
        match self {
            Self::V1beta1(_) => CRD_V1BETA1,
            Self::V1(_) => CRD_V1,
        }
    }

    /// The resource kind this definition introduces.
    pub fn resource_kind(&self) -> &str {
        match self {
            Self::V1beta1(crd) => &crd.spec.names.kind,
            Self::V1(crd) => &crd.spec.names.kind,
        }
    }

    /// Every version name the definition declares, including a lone legacy
    /// `spec.version`.
    pub fn version_names(&self) -> Vec<&str> {
        match self {
            Self::V1beta1(crd) => {
                let mut names: Vec<&str> =
                    crd.spec.versions.iter().map(|v| v.name.as_str()).collect();
                if !crd.spec.version.is_empty() && !names.contains(&crd.spec.version.as_str()) {
                    names.push(&crd.spec.version);
                }
                names
            }
            Self::V1(crd) => crd.spec.versions.iter().map(|v| v.name.as_str()).collect(),
        }
    }

    /// Convert into the version-independent form.
    pub fn to_canonical(&self) -> Result<CanonicalCrd, CrdError> {
        match self {
            Self::V1beta1(crd) => {
                let spec = &crd.spec;
                let versions = if spec.versions.is_empty() {
                    if spec.version.is_empty() {
                        return Err(CrdError::NoVersions(crd.metadata.name.clone()));
                    }
                    vec![CanonicalVersion {
                        name: spec.version.clone(),
                        served: true,
                        storage: true,
                        schema: None,
                        subresources: None,
                    }]
                } else {
                    spec.versions
                        .iter()
                        .map(|v| CanonicalVersion {
                            name: v.name.clone(),
                            served: v.served,
                            storage: v.storage,
                            schema: v.schema.clone(),
                            subresources: v.subresources.clone(),
                        })
                        .collect()
                };
                Ok(CanonicalCrd {
                    metadata: CanonicalMeta {
                        name: crd.metadata.name.clone(),
                    },
                    spec: CanonicalSpec {
                        group: spec.group.clone(),
                        version: (!spec.version.is_empty()).then(|| spec.version.clone()),
                        names: spec.names.clone(),
                        scope: spec.scope.clone(),
                        versions,
                        validation: spec.validation.clone(),
                        subresources: spec.subresources.clone(),
                    },
                })
            }
            Self::V1(crd) => Ok(CanonicalCrd {
                metadata: CanonicalMeta {
                    name: crd.metadata.name.clone(),
                },
                spec: CanonicalSpec {
                    group: crd.spec.group.clone(),
                    version: None,
                    names: crd.spec.names.clone(),
                    scope: crd.spec.scope.clone(),
                    versions: crd
                        .spec
                        .versions
                        .iter()
                        .map(|v| CanonicalVersion {
                            name: v.name.clone(),
                            served: v.served,
                            storage: v.storage,
                            schema: v.schema.clone(),
                            subresources: v.subresources.clone(),
                        })
                        .collect(),
                    validation: None,
                    subresources: None,
                },
            }),
        }
    }
}

/// Version-independent CustomResourceDefinition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalCrd {
    pub metadata: CanonicalMeta,
    pub spec: CanonicalSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalMeta {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSpec {
    pub group: String,
    /// Legacy top-level version, kept so it can be checked against `versions`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub names: CrdNames,
    pub scope: String,
    pub versions: Vec<CanonicalVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<CustomResourceValidation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subresources: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalVersion {
    pub name: String,
    pub served: bool,
    pub storage: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<CustomResourceValidation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subresources: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_legacy_single_version_converts() {
        let crd = CustomResourceDefinition::from_document(&doc(
            r#"
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
    kind: EtcdCluster
"#,
        ))
        .unwrap();

        assert_eq!(crd.api_version(), CRD_V1BETA1);
        assert_eq!(crd.version_names(), vec!["v1beta2"]);

        let canonical = crd.to_canonical().unwrap();
        assert_eq!(canonical.spec.versions.len(), 1);
        assert!(canonical.spec.versions[0].served);
        assert!(canonical.spec.versions[0].storage);
        assert_eq!(canonical.spec.version.as_deref(), Some("v1beta2"));
    }

    #[test]
    fn test_legacy_without_versions_fails_conversion() {
        let crd = CustomResourceDefinition::from_document(&doc(
            r#"
apiVersion: apiextensions.k8s.io/v1beta1
kind: CustomResourceDefinition
metadata:
  name: things.example.com
spec:
  group: example.com
"#,
        ))
        .unwrap();

        assert!(matches!(crd.to_canonical(), Err(CrdError::NoVersions(_))));
    }

    #[test]
    fn test_current_shape_converts() {
        let crd = CustomResourceDefinition::from_document(&doc(
            r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: memcacheds.cache.example.com
spec:
  group: cache.example.com
  scope: Namespaced
  names:
    plural: memcacheds
    kind: Memcached
  versions:
    - name: v1alpha1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
"#,
        ))
        .unwrap();

        assert_eq!(crd.name(), "memcacheds.cache.example.com");
        assert_eq!(crd.resource_kind(), "Memcached");
        let canonical = crd.to_canonical().unwrap();
        assert!(canonical.spec.version.is_none());
        assert!(canonical.spec.versions[0].schema.is_some());
    }

    #[test]
    fn test_unknown_api_version_rejected() {
        let err = CustomResourceDefinition::from_document(&doc(
            "apiVersion: apiextensions.k8s.io/v2\nkind: CustomResourceDefinition\n",
        ))
        .unwrap_err();
        assert!(matches!(err, CrdError::UnsupportedVersion(v) if v == "apiextensions.k8s.io/v2"));
    }
}
