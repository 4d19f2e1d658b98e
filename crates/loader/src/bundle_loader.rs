//! Loading an annotated bundle directory into a [`Bundle`].

use crate::classify::Classifier;
use crate::decode::{decode_first, is_hidden, is_hidden_name, kind_of, read_document};
use crate::metadata::{find_bundle_metadata, DEPENDENCIES_FILE_NAME};
use opcheck_common::{Error, Result};
use opcheck_manifest_schema::crd::CrdError;
use opcheck_manifest_schema::{
    Bundle, ClusterServiceVersion, CustomResourceDefinition, DependenciesFile, CRD_KIND, CSV_KIND,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Loads the bundle rooted at a directory holding `metadata/` and
/// `manifests/` (or wherever its annotations point).
#[derive(Debug, Clone)]
pub struct BundleLoader {
    root: PathBuf,
}

impl BundleLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load the bundle, failing if any file could not be loaded.
    pub fn load(&self) -> Result<Bundle> {
        let (bundle, errs) = self.load_lenient()?;
        Error::aggregate(errs)?;
        Ok(bundle)
    }

    /// Load the bundle and return per-file errors next to it.
    ///
    /// Missing annotations, an unclassifiable layout, no descriptor or more
    /// than one descriptor are fatal.
    pub fn load_lenient(&self) -> Result<(Bundle, Vec<Error>)> {
        let annotations = find_bundle_metadata(&self.root)?;
        let classifier = Classifier::new(annotations)?;
        info!(
            "Loading {} bundle from {}",
            classifier.media_type(),
            self.root.display()
        );

        let mut errs = Vec::new();
        let manifests_dir = self.root.join(classifier.manifests_dir());
        let mut bundle = load_manifests(&manifests_dir, &mut errs)?;

        let deps_path = self
            .root
            .join(classifier.metadata_dir())
            .join(DEPENDENCIES_FILE_NAME);
        if deps_path.is_file() {
            match read_document::<DependenciesFile>(&deps_path) {
                Ok(file) => bundle.dependencies = file.dependencies,
                Err(e) => errs.push(e),
            }
        }

        bundle.annotations = classifier.annotations().clone();
        Ok((bundle, errs))
    }
}

/// Find the first descriptor under `dir` and load every object next to it.
pub(crate) fn load_manifests(dir: &Path, errs: &mut Vec<Error>) -> Result<Bundle> {
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                errs.push(Error::File {
                    path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        // Undecodable files are reported by the second pass.
        let Ok(doc) = read_document::<Value>(entry.path()) else {
            continue;
        };
        if kind_of(&doc) != CSV_KIND {
            continue;
        }

        let name = doc
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let parent = entry.path().parent().unwrap_or(dir);
        debug!("Found descriptor {} in {}", name, parent.display());

        let mut bundle = Bundle::new(name);
        load_objects(&mut bundle, parent, errs)?;
        if bundle.csv.is_none() {
            return Err(Error::DescriptorNotFound(dir.to_path_buf()));
        }
        return Ok(bundle);
    }

    Err(Error::DescriptorNotFound(dir.to_path_buf()))
}

/// Second pass: every file in the descriptor's directory is a bundle object.
fn load_objects(bundle: &mut Bundle, dir: &Path, errs: &mut Vec<Error>) -> Result<()> {
    let io_err = |e: std::io::Error| Error::File {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };
    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(io_err)?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            errs.push(Error::UnexpectedDirectory(path));
            continue;
        }
        if is_hidden_name(&entry.file_name()) {
            errs.push(Error::HiddenFile(path));
            continue;
        }

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                errs.push(Error::File {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let doc: Value = match decode_first(&text) {
            Ok(Value::Null) => {
                errs.push(Error::Decode {
                    path,
                    reason: "empty document".into(),
                });
                continue;
            }
            Ok(doc) => doc,
            Err(e) => {
                errs.push(Error::Decode {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        debug!(kind = kind_of(&doc), "Decoded {}", path.display());

        match kind_of(&doc) {
            CSV_KIND => {
                if bundle.csv.is_some() {
                    return Err(Error::MultipleDescriptors(dir.to_path_buf()));
                }
                let csv: ClusterServiceVersion =
                    decode_first(&text).map_err(|e| Error::Decode {
                        path: path.clone(),
                        reason: format!("unable to parse CSV: {}", e),
                    })?;
                bundle.csv = Some(Arc::new(csv));
            }
            CRD_KIND => match CustomResourceDefinition::from_document(&doc) {
                Ok(crd) => bundle.crds.push(Arc::new(crd)),
                Err(CrdError::UnsupportedVersion(version)) => {
                    errs.push(Error::UnsupportedCrdVersion {
                        version,
                        path: path.clone(),
                    });
                }
                Err(e) => errs.push(Error::Decode {
                    path: path.clone(),
                    reason: e.to_string(),
                }),
            },
            _ => {}
        }
        bundle.objects.push(doc);
    }

    Ok(())
}
