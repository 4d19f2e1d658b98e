//! In-memory bundle: one descriptor, its schema definitions, and every
//! decoded document found next to them.

use crate::annotations::{AnnotationSet, Dependency};
use crate::crd::CustomResourceDefinition;
use crate::descriptor::ClusterServiceVersion;
use crate::object::Object;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Bundle {
    /// Name of the bundle's descriptor.
    pub name: String,
    pub csv: Option<Arc<ClusterServiceVersion>>,
    pub crds: Vec<Arc<CustomResourceDefinition>>,
    /// Every document decoded from the manifests directory, typed or not.
    pub objects: Vec<Value>,
    pub annotations: AnnotationSet,
    pub dependencies: Vec<Dependency>,
}

impl Bundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_csv(mut self, csv: ClusterServiceVersion) -> Self {
        self.csv = Some(Arc::new(csv));
        self
    }

    pub fn with_crd(mut self, crd: CustomResourceDefinition) -> Self {
        self.crds.push(Arc::new(crd));
        self
    }

    pub fn csv(&self) -> Option<&ClusterServiceVersion> {
        self.csv.as_deref()
    }

    /// Names of the schema definitions physically present in the bundle.
    pub fn crd_names(&self) -> BTreeSet<&str> {
        self.crds.iter().map(|crd| crd.name()).collect()
    }

    pub fn crd(&self, name: &str) -> Option<&CustomResourceDefinition> {
        self.crds.iter().map(|c| c.as_ref()).find(|c| c.name() == name)
    }

    /// Every object the default validators look at: the schema definitions,
    /// the descriptor and the bundle itself.
    pub fn objects_to_validate(self: Arc<Self>) -> Vec<Object> {
        let mut objs: Vec<Object> = self
            .crds
            .iter()
            .cloned()
            .map(Object::SchemaDefinition)
            .collect();
        if let Some(csv) = &self.csv {
            objs.push(Object::Descriptor(csv.clone()));
        }
        objs.push(Object::Bundle(self));
        objs
    }
}
