//! Conversion and structural-check context for schema definitions.
//!
//! Built once at startup and shared as `Arc<Scheme>`.

use opcheck_common::{Error, Result};
use opcheck_manifest_schema::crd::CrdError;
use opcheck_manifest_schema::{CanonicalCrd, CustomResourceDefinition, StructuralValidator, Violation};

#[derive(Debug)]
pub struct Scheme {
    structural: StructuralValidator,
}

impl Scheme {
    pub fn new() -> Result<Self> {
        let structural = StructuralValidator::new().map_err(Error::Config)?;
        Ok(Self { structural })
    }

    pub fn convert(&self, crd: &CustomResourceDefinition) -> std::result::Result<CanonicalCrd, CrdError> {
        crd.to_canonical()
    }

    pub fn check(&self, crd: &CanonicalCrd) -> Vec<Violation> {
        self.structural.validate(crd)
    }
}
