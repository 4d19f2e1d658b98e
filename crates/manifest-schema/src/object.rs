//! Tagged union over every object kind a validator can be handed.

use crate::bundle::Bundle;
use crate::crd::{CustomResourceDefinition, CRD_KIND};
use crate::descriptor::{ClusterServiceVersion, CSV_KIND};
use crate::package::PackageManifest;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Object {
    Descriptor(Arc<ClusterServiceVersion>),
    SchemaDefinition(Arc<CustomResourceDefinition>),
    Package(Arc<PackageManifest>),
    Bundle(Arc<Bundle>),
}

impl Object {
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Descriptor(_) => CSV_KIND,
            Object::SchemaDefinition(_) => CRD_KIND,
            Object::Package(_) => "PackageManifest",
            Object::Bundle(_) => "Bundle",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Object::Descriptor(csv) => csv.name(),
            Object::SchemaDefinition(crd) => crd.name(),
            Object::Package(pkg) => &pkg.package_name,
            Object::Bundle(bundle) => &bundle.name,
        }
    }
}

impl From<ClusterServiceVersion> for Object {
    fn from(csv: ClusterServiceVersion) -> Self {
        Object::Descriptor(Arc::new(csv))
    }
}

impl From<CustomResourceDefinition> for Object {
    fn from(crd: CustomResourceDefinition) -> Self {
        Object::SchemaDefinition(Arc::new(crd))
    }
}

impl From<PackageManifest> for Object {
    fn from(pkg: PackageManifest) -> Self {
        Object::Package(Arc::new(pkg))
    }
}

impl From<Bundle> for Object {
    fn from(bundle: Bundle) -> Self {
        Object::Bundle(Arc::new(bundle))
    }
}
