//! Manifest object definitions for opcheck.
//!
//! This crate defines the typed shapes of everything found in an operator
//! bundle: the ClusterServiceVersion descriptor, CustomResourceDefinitions
//! in both served schema versions, package manifests and bundle annotations.

pub mod annotations;
pub mod bundle;
pub mod crd;
pub mod descriptor;
pub mod fields;
pub mod object;
pub mod package;
pub mod schema;
pub mod structural;

pub use annotations::{AnnotationSet, AnnotationsFile, DependenciesFile, Dependency};
pub use bundle::Bundle;
pub use crd::{CanonicalCrd, CustomResourceDefinition, CRD_KIND, CRD_V1, CRD_V1BETA1};
pub use descriptor::{ClusterServiceVersion, InstallMode, CSV_KIND};
pub use fields::{FieldMeta, FieldValue, Inspect};
pub use object::Object;
pub use package::{PackageChannel, PackageManifest};
pub use structural::{StructuralValidator, Violation, ViolationType};
