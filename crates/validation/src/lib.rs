//! OpCheck validation engine.
//!
//! Rule sets implement [`Validator`]; a [`Validators`] set dispatches every
//! object to every rule set that understands its kind and collects the
//! non-empty [`ManifestResult`]s.

pub mod bundle;
pub mod config;
pub mod crd;
pub mod descriptor;
pub mod manifests;
pub mod package;
pub mod result;
pub mod scheme;
pub mod validator;

pub use bundle::BundleValidator;
pub use config::{DescriptorFailurePolicy, ValidatorConfig};
pub use crd::CrdValidator;
pub use descriptor::CsvValidator;
pub use manifests::ManifestsValidator;
pub use package::PackageValidator;
pub use result::{sort_results, ErrorKind, Issue, Level, ManifestResult};
pub use scheme::Scheme;
pub use validator::{Job, Validator, Validators};

use std::sync::Arc;

/// Descriptor and schema-definition rules.
pub fn object_validators(scheme: Arc<Scheme>, config: &ValidatorConfig) -> Validators {
    Validators::new()
        .with(CsvValidator::new(config.clone()))
        .with(CrdValidator::new(scheme))
}

/// Bundle, package and cross-bundle rules.
pub fn collection_validators(config: &ValidatorConfig) -> Validators {
    Validators::new()
        .with(BundleValidator::new(config.on_missing_descriptor))
        .with(PackageValidator)
        .with(ManifestsValidator::new(config.on_missing_descriptor))
}

/// Every rule set.
pub fn default_validators(scheme: Arc<Scheme>, config: &ValidatorConfig) -> Validators {
    let mut vals = object_validators(scheme, config);
    vals.extend(collection_validators(config));
    vals
}
