//! Bundle metadata files: `annotations.yaml` and `dependencies.yaml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key telling which layout convention a bundle follows.
pub const MEDIA_TYPE_KEY: &str = "operators.operatorframework.io.bundle.mediatype.v1";
pub const MANIFESTS_KEY: &str = "operators.operatorframework.io.bundle.manifests.v1";
pub const METADATA_KEY: &str = "operators.operatorframework.io.bundle.metadata.v1";
pub const PACKAGE_KEY: &str = "operators.operatorframework.io.bundle.package.v1";
/// Comma-separated list of channels.
pub const CHANNELS_KEY: &str = "operators.operatorframework.io.bundle.channels.v1";
pub const DEFAULT_CHANNEL_KEY: &str = "operators.operatorframework.io.bundle.channel.default.v1";

/// Annotation key/value pairs read from a bundle's metadata directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationSet(BTreeMap<String, String>);

impl AnnotationSet {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// On-disk shape of `annotations.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationsFile {
    #[serde(default)]
    pub annotations: Option<AnnotationSet>,
}

impl AnnotationsFile {
    /// The annotation mapping; an absent or null mapping reads as empty.
    pub fn into_annotations(self) -> AnnotationSet {
        self.annotations.unwrap_or_default()
    }
}

/// On-disk shape of `dependencies.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependenciesFile {
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// `olm.package` or `olm.gvk`.
    #[serde(rename = "type")]
    pub dependency_type: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_annotations_file() {
        let file: AnnotationsFile = serde_yaml::from_str(
            r#"
annotations:
  operators.operatorframework.io.bundle.mediatype.v1: registry+v1
  operators.operatorframework.io.bundle.channels.v1: alpha,stable
"#,
        )
        .unwrap();

        let annotations = file.into_annotations();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations.get(MEDIA_TYPE_KEY), Some("registry+v1"));
        assert_eq!(annotations.get(CHANNELS_KEY), Some("alpha,stable"));
    }

    #[test]
    fn test_missing_annotations_key_is_empty() {
        let file: AnnotationsFile = serde_yaml::from_str("other: value\n").unwrap();
        assert!(file.into_annotations().is_empty());

        let file: AnnotationsFile = serde_yaml::from_str("annotations:\n").unwrap();
        assert!(file.into_annotations().is_empty());
    }
}
