use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, free-form piece of metadata attached to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    name: String,
    value: serde_json::Value,
}

impl Annotation {
    pub fn new(name: impl Into<String>, value: serde_json::Value) -> Self {
        Annotation {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }
}

/// Annotations keyed by name, iterated in ordinal order
#[derive(Debug, Default, Clone)]
pub struct Annotations {
    annotations: BTreeMap<String, Annotation>,
}

impl Annotations {
    /// Store `annotation`, returning the one it replaced
    pub fn set(&mut self, annotation: Annotation) -> Option<Annotation> {
        self.annotations
            .insert(annotation.name().to_string(), annotation)
    }

    pub fn remove(&mut self, name: &str) -> Option<Annotation> {
        self.annotations.remove(name)
    }

    pub fn find(&self, name: &str) -> Option<&Annotation> {
        self.annotations.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.annotations.values()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
