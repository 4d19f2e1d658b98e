//! Locating a bundle's annotations.

use crate::decode::{is_hidden, read_document};
use opcheck_common::{Error, Result};
use opcheck_manifest_schema::{AnnotationSet, AnnotationsFile};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const MANIFESTS_DIR_NAME: &str = "manifests";
pub const METADATA_DIR_NAME: &str = "metadata";
pub const ANNOTATIONS_FILE_NAME: &str = "annotations.yaml";
pub const DEPENDENCIES_FILE_NAME: &str = "dependencies.yaml";

/// Find the annotations of the bundle rooted at `root`.
///
/// `metadata/annotations.yaml` is tried first. When it is missing or holds no
/// annotations, the tree is searched (hidden entries skipped) and the first
/// file with a non-empty annotation mapping wins.
pub fn find_bundle_metadata(root: &Path) -> Result<AnnotationSet> {
    let default_path = root.join(METADATA_DIR_NAME).join(ANNOTATIONS_FILE_NAME);
    if default_path.is_file() {
        let file: AnnotationsFile = read_document(&default_path)?;
        let annotations = file.into_annotations();
        if !annotations.is_empty() {
            debug!("Found annotations at {}", default_path.display());
            return Ok(annotations);
        }
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in walker {
        let entry = entry.map_err(|e| Error::File {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(file) = read_document::<AnnotationsFile>(entry.path()) {
            let annotations = file.into_annotations();
            if !annotations.is_empty() {
                debug!("Found annotations at {}", entry.path().display());
                return Ok(annotations);
            }
        }
    }

    Err(Error::AnnotationsNotFound(PathBuf::from(root)))
}
