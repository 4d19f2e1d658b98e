//! Legacy package directory layout: a package manifest at the root and one
//! bundle per subdirectory.

use crate::bundle_loader::load_manifests;
use crate::decode::{is_hidden_name, read_document};
use opcheck_common::{Error, Result};
use opcheck_manifest_schema::{Bundle, PackageManifest};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PACKAGE_NAME_FIELD: &str = "packageName";

fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>> {
    let io_err = |e: std::io::Error| Error::File {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };
    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(io_err)?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// Find the package manifest among the files directly under `root`.
///
/// Files that do not decode or carry no `packageName` are skipped.
pub fn find_package(root: &Path) -> Result<Option<(PathBuf, PackageManifest)>> {
    let mut found = Vec::new();
    for entry in sorted_entries(root)? {
        let path = entry.path();
        if !path.is_file() || is_hidden_name(&entry.file_name()) {
            continue;
        }
        let Ok(doc) = read_document::<Value>(&path) else {
            continue;
        };
        if doc.get(PACKAGE_NAME_FIELD).is_none() {
            continue;
        }
        let package = serde_json::from_value(doc).map_err(|e| Error::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        found.push((path, package));
    }

    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        _ => Err(Error::MultiplePackages(root.to_path_buf())),
    }
}

/// Loads a package directory.
#[derive(Debug, Clone)]
pub struct PackageDirLoader {
    root: PathBuf,
    package: PackageManifest,
}

impl PackageDirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        Self::detect(&root)?.ok_or(Error::PackageNotFound(root))
    }

    /// A loader for `root` if it holds a package manifest.
    pub fn detect(root: &Path) -> Result<Option<Self>> {
        Ok(find_package(root)?.map(|(path, package)| {
            debug!("Found package manifest at {}", path.display());
            Self {
                root: root.to_path_buf(),
                package,
            }
        }))
    }

    pub fn package(&self) -> &PackageManifest {
        &self.package
    }

    /// Load every bundle, failing if any could not be loaded.
    pub fn load(self) -> Result<(PackageManifest, Vec<Bundle>)> {
        let (package, bundles, errs) = self.load_lenient()?;
        Error::aggregate(errs)?;
        Ok((package, bundles))
    }

    /// Load every bundle subdirectory. A bundle that fails to load is
    /// reported next to the others instead of stopping the package.
    pub fn load_lenient(self) -> Result<(PackageManifest, Vec<Bundle>, Vec<Error>)> {
        info!(
            "Loading package {} from {}",
            self.package.package_name,
            self.root.display()
        );

        let mut bundles = Vec::new();
        let mut errs = Vec::new();
        for entry in sorted_entries(&self.root)? {
            let path = entry.path();
            if !path.is_dir() || is_hidden_name(&entry.file_name()) {
                continue;
            }
            match load_manifests(&path, &mut errs) {
                Ok(bundle) => {
                    debug!("Loaded bundle {} from {}", bundle.name, path.display());
                    bundles.push(bundle);
                }
                Err(e) => errs.push(e),
            }
        }

        Ok((self.package, bundles, errs))
    }
}
