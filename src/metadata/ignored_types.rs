use std::collections::HashMap;

use super::configuration_source::ConfigurationSource;

/// Type names explicitly excluded from the model, with the provenance of
/// each exclusion.
#[derive(Debug, Default, Clone)]
pub struct IgnoredTypes {
    names: HashMap<String, ConfigurationSource>,
}

impl IgnoredTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` as ignored.
    ///
    /// Returns `true` when the name was not ignored before. A repeated ignore
    /// keeps the most authoritative of the two sources.
    pub fn ignore(&mut self, name: &str, configuration_source: ConfigurationSource) -> bool {
        match self.names.get_mut(name) {
            Some(existing) => {
                *existing = configuration_source.max(*existing);
                false
            }
            None => {
                self.names.insert(name.to_string(), configuration_source);
                true
            }
        }
    }

    /// Remove `name` from the ignore list. No-op when it is not ignored.
    pub fn unignore(&mut self, name: &str) -> Option<ConfigurationSource> {
        self.names.remove(name)
    }

    pub fn find(&self, name: &str) -> Option<ConfigurationSource> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Ignored names in ordinal order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
