//! Validator configuration.

/// What to do when a bundle has no retrievable descriptor during
/// cross-object checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DescriptorFailurePolicy {
    /// Fail the whole batch with [`opcheck_common::Error::MissingDescriptor`].
    #[default]
    Abort,
    /// Record a parse error on the affected result and keep going.
    Report,
}

/// Configuration for the default validator set.
#[derive(Debug, Clone, Default)]
pub struct ValidatorConfig {
    /// Require descriptor names of the form `<base>.v<semver>`.
    pub check_name_format: bool,
    /// Behaviour when a bundle's descriptor cannot be retrieved.
    pub on_missing_descriptor: DescriptorFailurePolicy,
}
