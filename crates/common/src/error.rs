//! Common error types for opcheck.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Common error type for opcheck operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to load file {path}: {reason}")]
    File { path: PathBuf, reason: String },

    #[error("unable to decode object in {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("no annotations file found in {0}")]
    AnnotationsNotFound(PathBuf),

    #[error("no annotations in annotations file")]
    EmptyAnnotations,

    #[error("no supported mediaType keys found in annotations file")]
    UnsupportedMediaType,

    #[error("required key {key} for mediaType {media_type} not present in annotations")]
    MissingAnnotation { key: String, media_type: String },

    #[error("unable to find a csv in bundle directory {0}")]
    DescriptorNotFound(PathBuf),

    #[error("invalid bundle: contains multiple CSVs ({0})")]
    MultipleDescriptors(PathBuf),

    #[error("unsupported CRD version {version} for {path}")]
    UnsupportedCrdVersion { version: String, path: PathBuf },

    #[error("bundle manifests dir contains directory: {0}")]
    UnexpectedDirectory(PathBuf),

    #[error("bundle manifests dir has hidden file: {0}")]
    HiddenFile(PathBuf),

    #[error("no package manifest found in {0}")]
    PackageNotFound(PathBuf),

    #[error("multiple package manifests found in {0}")]
    MultiplePackages(PathBuf),

    #[error("unable to retrieve CSV from bundle {0}")]
    MissingDescriptor(String),

    #[error("validation task failed: {0}")]
    Task(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{}", ErrorList(.0))]
    Aggregate(Vec<Error>),
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Collapse a list of errors: nothing for an empty list, the error itself
    /// for a single entry, an aggregate otherwise.
    pub fn aggregate(mut errs: Vec<Error>) -> Result<()> {
        match errs.len() {
            0 => Ok(()),
            1 => Err(errs.remove(0)),
            _ => Err(Error::Aggregate(errs)),
        }
    }

    /// Every non-aggregate error, depth first.
    pub fn leaves(&self) -> Vec<&Error> {
        match self {
            Error::Aggregate(errs) => errs.iter().flat_map(|e| e.leaves()).collect(),
            other => vec![other],
        }
    }

    /// Whether this error came from reading the file system.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::File { .. })
    }
}

struct ErrorList<'a>(&'a [Error]);

impl fmt::Display for ErrorList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_empty_is_ok() {
        assert!(Error::aggregate(vec![]).is_ok());
    }

    #[test]
    fn test_aggregate_single_is_unwrapped() {
        let err = Error::aggregate(vec![Error::EmptyAnnotations]).unwrap_err();
        assert!(matches!(err, Error::EmptyAnnotations));
    }

    #[test]
    fn test_aggregate_display_and_leaves() {
        let err = Error::aggregate(vec![
            Error::HiddenFile(PathBuf::from("m/.x")),
            Error::Aggregate(vec![Error::UnsupportedMediaType, Error::EmptyAnnotations]),
        ])
        .unwrap_err();

        assert_eq!(err.leaves().len(), 3);
        assert_eq!(
            err.to_string(),
            "[bundle manifests dir has hidden file: m/.x, [no supported mediaType keys found in annotations file, no annotations in annotations file]]"
        );
    }

    #[test]
    fn test_is_io() {
        let err = Error::File {
            path: PathBuf::from("a.yaml"),
            reason: "denied".into(),
        };
        assert!(err.is_io());
        assert!(!Error::EmptyAnnotations.is_io());

        let err = Error::Decode {
            path: PathBuf::from("a.yaml"),
            reason: "did not find expected key".into(),
        };
        assert!(!err.is_io());
    }
}
