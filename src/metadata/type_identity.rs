//! Type identity resolution
//!
//! Registry operations accept either a class ([`ClrType`]) or a bare name.
//! Both are normalized into a [`TypeIdentity`] whose `name` is the canonical
//! lookup key. Class names are memoized in a [`DisplayNameCache`].

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::clr_type::ClrType;

/// Class-or-name input accepted by registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Name(String),
    Clr(ClrType),
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::Name(name.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        TypeRef::Name(name)
    }
}

impl From<&String> for TypeRef {
    fn from(name: &String) -> Self {
        TypeRef::Name(name.clone())
    }
}

impl From<ClrType> for TypeRef {
    fn from(clr_type: ClrType) -> Self {
        TypeRef::Clr(clr_type)
    }
}

impl From<&ClrType> for TypeRef {
    fn from(clr_type: &ClrType) -> Self {
        TypeRef::Clr(clr_type.clone())
    }
}

/// Canonical name of a type plus the class it came from, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeIdentity {
    name: String,
    clr_type: Option<ClrType>,
}

impl TypeIdentity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clr_type(&self) -> Option<&ClrType> {
        self.clr_type.as_ref()
    }

    /// Name shown in diagnostics: the short class name, or the name itself
    pub fn short_display_name(&self) -> String {
        match &self.clr_type {
            Some(clr_type) => clr_type.short_display_name(),
            None => self.name.clone(),
        }
    }

    pub(crate) fn into_parts(self) -> (String, Option<ClrType>) {
        (self.name, self.clr_type)
    }
}

/// Thread-safe memo of class → canonical display name.
///
/// Entries are never invalidated. Two threads racing on the same class may
/// both compute the name; the first insert wins and both observe it.
#[derive(Debug, Default)]
pub struct DisplayNameCache {
    names: RwLock<HashMap<ClrType, Arc<str>>>,
}

impl DisplayNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_add(&self, clr_type: &ClrType) -> Arc<str> {
        {
            let names = self.names.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(name) = names.get(clr_type) {
                return Arc::clone(name);
            }
        }

        let computed: Arc<str> = Arc::from(clr_type.display_name());
        let mut names = self.names.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(names.entry(clr_type.clone()).or_insert(computed))
    }

    pub fn resolve(&self, type_ref: &TypeRef) -> TypeIdentity {
        match type_ref {
            TypeRef::Name(name) => TypeIdentity {
                name: name.clone(),
                clr_type: None,
            },
            TypeRef::Clr(clr_type) => TypeIdentity {
                name: self.get_or_add(clr_type).to_string(),
                clr_type: Some(clr_type.clone()),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_name_and_class() {
        let cache = DisplayNameCache::new();
        let order = ClrType::new("Shop", "Order");

        let by_name = cache.resolve(&TypeRef::from("Order"));
        assert_eq!(by_name.name(), "Order");
        assert!(by_name.clr_type().is_none());

        let by_class = cache.resolve(&TypeRef::from(&order));
        assert_eq!(by_class.name(), "Shop.Order");
        assert_eq!(by_class.short_display_name(), "Order");
        assert_eq!(by_class.clr_type(), Some(&order));
    }

    #[test]
    fn test_cache_is_memoized() {
        let cache = DisplayNameCache::new();
        let order = ClrType::new("Shop", "Order");

        let first = cache.get_or_add(&order);
        let second = cache.get_or_add(&order);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_population() {
        let cache = DisplayNameCache::new();
        let types: Vec<ClrType> = (0..4)
            .map(|i| ClrType::new("Shop", &format!("Entity{i}")))
            .collect();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for clr_type in &types {
                        assert_eq!(&*cache.get_or_add(clr_type), clr_type.display_name());
                    }
                });
            }
        });

        assert_eq!(cache.len(), types.len());
    }
}
