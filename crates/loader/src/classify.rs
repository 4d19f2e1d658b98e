//! Bundle layout classification from annotations.

use opcheck_common::{Error, Result};
use opcheck_manifest_schema::annotations::{
    CHANNELS_KEY, DEFAULT_CHANNEL_KEY, MANIFESTS_KEY, MEDIA_TYPE_KEY, METADATA_KEY, PACKAGE_KEY,
};
use opcheck_manifest_schema::AnnotationSet;
use std::fmt;
use std::str::FromStr;

/// Supported bundle layout conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    RegistryV1,
    Plain,
    Helm,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [MediaType::RegistryV1, MediaType::Plain, MediaType::Helm];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::RegistryV1 => "registry+v1",
            MediaType::Plain => "plain",
            MediaType::Helm => "helm",
        }
    }

    /// Annotation keys a bundle of this type must carry.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            MediaType::RegistryV1 | MediaType::Plain | MediaType::Helm => &[
                MANIFESTS_KEY,
                METADATA_KEY,
                PACKAGE_KEY,
                CHANNELS_KEY,
                DEFAULT_CHANNEL_KEY,
            ],
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MediaType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or(Error::UnsupportedMediaType)
    }
}

/// Where a classified bundle keeps its files and which channels it joins.
#[derive(Debug, Clone)]
pub struct Classifier {
    media_type: MediaType,
    annotations: AnnotationSet,
}

impl Classifier {
    /// Resolve the media type and check that its required keys are present.
    pub fn new(annotations: AnnotationSet) -> Result<Self> {
        if annotations.is_empty() {
            return Err(Error::EmptyAnnotations);
        }
        let media_type: MediaType = annotations
            .get(MEDIA_TYPE_KEY)
            .ok_or(Error::UnsupportedMediaType)?
            .parse()?;

        for key in media_type.required_keys() {
            if !annotations.contains(key) {
                return Err(Error::MissingAnnotation {
                    key: key.to_string(),
                    media_type: media_type.to_string(),
                });
            }
        }

        Ok(Self {
            media_type,
            annotations,
        })
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    fn value(&self, key: &str) -> &str {
        self.annotations.get(key).unwrap_or_default()
    }

    pub fn manifests_dir(&self) -> &str {
        self.value(MANIFESTS_KEY)
    }

    pub fn metadata_dir(&self) -> &str {
        self.value(METADATA_KEY)
    }

    pub fn package(&self) -> &str {
        self.value(PACKAGE_KEY)
    }

    /// Declared channels, blank entries dropped.
    pub fn channels(&self) -> Vec<&str> {
        self.value(CHANNELS_KEY)
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    pub fn default_channel(&self) -> &str {
        self.value(DEFAULT_CHANNEL_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(media_type: &str) -> AnnotationSet {
        [
            (MEDIA_TYPE_KEY, media_type),
            (MANIFESTS_KEY, "manifests/"),
            (METADATA_KEY, "metadata/"),
            (PACKAGE_KEY, "etcd"),
            (CHANNELS_KEY, "alpha,stable"),
            (DEFAULT_CHANNEL_KEY, "stable"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_classify_registry_v1() {
        let c = Classifier::new(annotations("registry+v1")).unwrap();
        assert_eq!(c.media_type(), MediaType::RegistryV1);
        assert_eq!(c.manifests_dir(), "manifests/");
        assert_eq!(c.metadata_dir(), "metadata/");
        assert_eq!(c.package(), "etcd");
        assert_eq!(c.channels(), vec!["alpha", "stable"]);
        assert_eq!(c.default_channel(), "stable");
    }

    #[test]
    fn test_blank_channels_are_dropped() {
        let mut pairs: Vec<(&str, &str)> = vec![
            (MEDIA_TYPE_KEY, "registry+v1"),
            (MANIFESTS_KEY, "manifests/"),
            (METADATA_KEY, "metadata/"),
            (PACKAGE_KEY, "etcd"),
            (CHANNELS_KEY, ""),
            (DEFAULT_CHANNEL_KEY, "stable"),
        ];
        let c = Classifier::new(pairs.iter().copied().collect()).unwrap();
        assert!(c.channels().is_empty());

        pairs[4] = (CHANNELS_KEY, "alpha,, stable,");
        let c = Classifier::new(pairs.into_iter().collect()).unwrap();
        assert_eq!(c.channels(), vec!["alpha", "stable"]);
    }

    #[test]
    fn test_every_media_type_resolves() {
        for mt in MediaType::ALL {
            let c = Classifier::new(annotations(mt.as_str())).unwrap();
            assert_eq!(c.media_type(), mt);
        }
    }

    #[test]
    fn test_empty_annotations() {
        let err = Classifier::new(AnnotationSet::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyAnnotations));
    }

    #[test]
    fn test_unknown_media_type() {
        let err = Classifier::new(annotations("oci+v2")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType));

        let err = Classifier::new([("foo", "bar")].into_iter().collect()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType));
    }

    #[test]
    fn test_missing_required_key() {
        let annotations: AnnotationSet = [(MEDIA_TYPE_KEY, "helm"), (MANIFESTS_KEY, "manifests/")]
            .into_iter()
            .collect();
        let err = Classifier::new(annotations).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "required key {} for mediaType helm not present in annotations",
                METADATA_KEY
            )
        );
    }
}
