//! Reading operator bundles from disk.
//!
//! Two layouts are understood: an annotated bundle directory
//! (`metadata/annotations.yaml` plus a manifests directory) and a legacy
//! package directory holding a package manifest and one bundle per
//! subdirectory.

pub mod bundle_loader;
pub mod classify;
pub mod decode;
pub mod metadata;
pub mod package_dir;

pub use bundle_loader::BundleLoader;
pub use classify::{Classifier, MediaType};
pub use metadata::find_bundle_metadata;
pub use package_dir::{find_package, PackageDirLoader};

use opcheck_common::{Error, Result};
use opcheck_manifest_schema::{Bundle, Object, PackageManifest};
use std::path::Path;
use std::sync::Arc;

/// What a directory turned out to hold.
#[derive(Debug, Clone)]
pub enum Loaded {
    Bundle(Bundle),
    Package {
        package: PackageManifest,
        bundles: Vec<Bundle>,
    },
}

impl Loaded {
    pub fn name(&self) -> &str {
        match self {
            Loaded::Bundle(bundle) => &bundle.name,
            Loaded::Package { package, .. } => &package.package_name,
        }
    }

    /// Everything the validators should see, package first.
    pub fn into_objects(self) -> Vec<Object> {
        match self {
            Loaded::Bundle(bundle) => Arc::new(bundle).objects_to_validate(),
            Loaded::Package { package, bundles } => {
                let mut objects = vec![Object::from(package)];
                for bundle in bundles {
                    objects.extend(Arc::new(bundle).objects_to_validate());
                }
                objects
            }
        }
    }
}

/// Load `dir`, failing if any file could not be loaded.
pub fn load(dir: &Path) -> Result<Loaded> {
    let (loaded, errs) = load_lenient(dir)?;
    Error::aggregate(errs)?;
    Ok(loaded)
}

/// Load `dir` and return per-file errors next to what did load.
pub fn load_lenient(dir: &Path) -> Result<(Loaded, Vec<Error>)> {
    if !dir.is_dir() {
        return Err(Error::File {
            path: dir.to_path_buf(),
            reason: "not a directory".into(),
        });
    }

    match PackageDirLoader::detect(dir)? {
        Some(loader) => {
            let (package, bundles, errs) = loader.load_lenient()?;
            Ok((Loaded::Package { package, bundles }, errs))
        }
        None => {
            let (bundle, errs) = BundleLoader::new(dir).load_lenient()?;
            Ok((Loaded::Bundle(bundle), errs))
        }
    }
}
