//! Entity type registry
//!
//! [`Model`] owns every entity type node in an arena and indexes the attached
//! ones in two tables:
//!
//! - non-weak types, keyed by name
//! - weak types, grouped by name and keyed by their full [`EntityTypePath`]
//!
//! Removed nodes stay in the arena in the `Detached` state so that stale ids
//! can still be resolved with [`Model::find_actual_entity_type`]. Removing a
//! weak type also leaves a residue record (name, navigation, parent name) that
//! is purged when a matching weak type is added again.
//!
//! The model is single-writer: every mutation takes `&mut self` and there is
//! no internal locking apart from the display name cache. Each mutation
//! validates first, commits its table changes, and only then runs the
//! conventions, which may call back into the model.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use log::{debug, info};

use super::annotations::{Annotation, Annotations};
use super::clr_type::ClrType;
use super::configuration_source::ConfigurationSource;
use super::conventions::{ConventionDispatcher, ConventionSet, ModelResult};
use super::entity_type::{
    DefiningNavigation, EntityType, EntityTypeId, EntityTypePath, EntityTypeState, ForeignKey,
    ForeignKeyId, Navigation, PathSegment, Property,
};
use super::errors::ModelError;
use super::ignored_types::IgnoredTypes;
use super::model_view::FinalizedModel;
use super::type_identity::{DisplayNameCache, TypeIdentity, TypeRef};

#[derive(Debug)]
pub struct Model {
    nodes: Vec<EntityType>,
    foreign_keys: Vec<Option<ForeignKey>>,
    entity_types: BTreeMap<String, EntityTypeId>,
    weak_entity_types: BTreeMap<String, BTreeMap<EntityTypePath, EntityTypeId>>,
    detached_weak_entity_types: BTreeMap<String, Vec<(String, String)>>,
    ignored_types: IgnoredTypes,
    annotations: Annotations,
    display_names: DisplayNameCache,
    conventions: Arc<ConventionDispatcher>,
}

impl Default for Model {
    fn default() -> Self {
        Model::new()
    }
}

impl Model {
    /// Empty model without conventions
    pub fn new() -> Self {
        Model {
            nodes: Vec::new(),
            foreign_keys: Vec::new(),
            entity_types: BTreeMap::new(),
            weak_entity_types: BTreeMap::new(),
            detached_weak_entity_types: BTreeMap::new(),
            ignored_types: IgnoredTypes::new(),
            annotations: Annotations::default(),
            display_names: DisplayNameCache::new(),
            conventions: Arc::new(ConventionDispatcher::default()),
        }
    }

    /// Empty model that runs `conventions` on every change.
    /// `on_model_initialized` has already run when this returns.
    pub fn with_conventions(conventions: ConventionSet) -> ModelResult<Self> {
        let mut model = Model {
            conventions: Arc::new(ConventionDispatcher::new(conventions)),
            ..Model::new()
        };
        let dispatcher = Arc::clone(&model.conventions);
        dispatcher.on_model_initialized(&mut model)?;
        Ok(model)
    }

    pub fn conventions(&self) -> &ConventionSet {
        self.conventions.conventions()
    }

    pub fn display_name_cache(&self) -> &DisplayNameCache {
        &self.display_names
    }

    fn resolve(&self, type_ref: impl Into<TypeRef>) -> TypeIdentity {
        self.display_names.resolve(&type_ref.into())
    }

    // ------------------------------------------------------------------
    // Adding entity types
    // ------------------------------------------------------------------

    /// Add a non-weak entity type.
    ///
    /// Returns the entity type the conventions settled on, or `None` when a
    /// convention rejected it.
    pub fn add_entity_type(
        &mut self,
        entity_type: impl Into<TypeRef>,
        configuration_source: ConfigurationSource,
    ) -> ModelResult<Option<EntityTypeId>> {
        let identity = self.resolve(entity_type);
        self.add_non_weak_entity_type(identity, false, configuration_source)
    }

    /// Add a read-only query type. Shares the name space of entity types.
    pub fn add_query_type(
        &mut self,
        query_type: impl Into<TypeRef>,
        configuration_source: ConfigurationSource,
    ) -> ModelResult<Option<EntityTypeId>> {
        let identity = self.resolve(query_type);
        self.add_non_weak_entity_type(identity, true, configuration_source)
    }

    fn add_non_weak_entity_type(
        &mut self,
        identity: TypeIdentity,
        is_query_type: bool,
        configuration_source: ConfigurationSource,
    ) -> ModelResult<Option<EntityTypeId>> {
        let display_name = identity.short_display_name();
        let name = identity.name();

        if self.ignored_types.contains(name) {
            return Err(ModelError::EntityTypeIgnored {
                entity_type: display_name,
            });
        }
        if self.weak_entity_types.contains_key(name) {
            return Err(ModelError::ClashingWeakEntityType {
                entity_type: display_name,
            });
        }
        if let Some(clashing) = self.entity_types.get(name) {
            let clashing_is_query_type = self.nodes[clashing.0].is_query_type;
            return Err(match (clashing_is_query_type, is_query_type) {
                (true, true) => ModelError::DuplicateQueryType {
                    query_type: display_name,
                },
                (true, false) => ModelError::CannotAccessQueryAsEntity {
                    entity_type: display_name,
                },
                (false, true) => ModelError::CannotAccessEntityAsQuery {
                    query_type: display_name,
                },
                (false, false) => ModelError::DuplicateEntityType {
                    entity_type: display_name,
                },
            });
        }

        // A non-weak type takes over the name; weak residue is no longer reachable
        self.detached_weak_entity_types.remove(name);

        let (name, clr_type) = identity.into_parts();
        let id = self.push_node(name.clone(), clr_type, None, is_query_type, configuration_source);
        self.entity_types.insert(name, id);
        debug!(
            "Added {} '{}' ({})",
            if is_query_type { "query type" } else { "entity type" },
            display_name,
            configuration_source
        );

        self.dispatch_entity_type_added(id)
    }

    /// Add a weak entity type owned by `defining_entity_type` through the
    /// navigation `defining_navigation_name`.
    ///
    /// A matching detached residue record is consumed.
    pub fn add_weak_entity_type(
        &mut self,
        entity_type: impl Into<TypeRef>,
        defining_navigation_name: &str,
        defining_entity_type: EntityTypeId,
        configuration_source: ConfigurationSource,
    ) -> ModelResult<Option<EntityTypeId>> {
        let identity = self.resolve(entity_type);
        self.ensure_attached(defining_entity_type)?;

        let display_name = format!(
            "{}.{}#{}",
            self.display_name(defining_entity_type),
            defining_navigation_name,
            identity.short_display_name()
        );
        let name = identity.name();

        if self.ignored_types.contains(name) {
            return Err(ModelError::EntityTypeIgnored {
                entity_type: display_name,
            });
        }
        if self.entity_types.contains_key(name) {
            return Err(ModelError::ClashingNonWeakEntityType {
                entity_type: display_name,
            });
        }
        let path = self.weak_path(name, defining_navigation_name, defining_entity_type);
        if self
            .weak_entity_types
            .get(name)
            .is_some_and(|group| group.contains_key(&path))
        {
            return Err(ModelError::DuplicateEntityType {
                entity_type: display_name,
            });
        }

        let defining_name = self.nodes[defining_entity_type.0].name.clone();
        if let Some(residue) = self.detached_weak_entity_types.get_mut(name) {
            if let Some(index) = residue.iter().position(|(navigation, parent)| {
                navigation == defining_navigation_name && *parent == defining_name
            }) {
                residue.remove(index);
            }
            if residue.is_empty() {
                self.detached_weak_entity_types.remove(name);
            }
        }

        let (name, clr_type) = identity.into_parts();
        let defining = DefiningNavigation {
            navigation_name: defining_navigation_name.to_string(),
            entity_type: defining_entity_type,
        };
        let id = self.push_node(name.clone(), clr_type, Some(defining), false, configuration_source);
        self.weak_entity_types
            .entry(name)
            .or_default()
            .insert(path, id);
        debug!("Added weak entity type '{}' ({})", display_name, configuration_source);

        self.dispatch_entity_type_added(id)
    }

    /// Find the non-weak entity type, or add it with `Explicit` source
    pub fn get_or_add_entity_type(
        &mut self,
        entity_type: impl Into<TypeRef>,
    ) -> ModelResult<Option<EntityTypeId>> {
        let identity = self.resolve(entity_type);
        if let Some(&id) = self.entity_types.get(identity.name()) {
            return Ok(Some(id));
        }
        self.add_non_weak_entity_type(identity, false, ConfigurationSource::Explicit)
    }

    /// Record weak type residue without removing anything
    pub fn add_detached_entity_type(
        &mut self,
        name: &str,
        defining_navigation_name: &str,
        defining_entity_type_name: &str,
    ) {
        self.detached_weak_entity_types
            .entry(name.to_string())
            .or_default()
            .push((
                defining_navigation_name.to_string(),
                defining_entity_type_name.to_string(),
            ));
    }

    fn push_node(
        &mut self,
        name: String,
        clr_type: Option<ClrType>,
        defining: Option<DefiningNavigation>,
        is_query_type: bool,
        configuration_source: ConfigurationSource,
    ) -> EntityTypeId {
        let id = EntityTypeId(self.nodes.len());
        self.nodes.push(EntityType::new(
            id,
            name,
            clr_type,
            defining,
            is_query_type,
            configuration_source,
        ));
        id
    }

    fn dispatch_entity_type_added(&mut self, id: EntityTypeId) -> ModelResult<Option<EntityTypeId>> {
        let dispatcher = Arc::clone(&self.conventions);
        dispatcher.on_entity_type_added(self, id)
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// Node for `id`, attached or not.
    ///
    /// # Panics
    /// If `id` was issued by another model.
    pub fn entity_type(&self, id: EntityTypeId) -> &EntityType {
        &self.nodes[id.0]
    }

    pub fn foreign_key(&self, id: ForeignKeyId) -> Option<&ForeignKey> {
        self.foreign_keys.get(id.0).and_then(Option::as_ref)
    }

    pub fn find_entity_type(&self, entity_type: impl Into<TypeRef>) -> Option<EntityTypeId> {
        let identity = self.resolve(entity_type);
        self.entity_types.get(identity.name()).copied()
    }

    pub fn find_weak_entity_type(
        &self,
        entity_type: impl Into<TypeRef>,
        defining_navigation_name: &str,
        defining_entity_type: EntityTypeId,
    ) -> Option<EntityTypeId> {
        let identity = self.resolve(entity_type);
        let path = self.weak_path(identity.name(), defining_navigation_name, defining_entity_type);
        self.weak_entity_types
            .get(identity.name())
            .and_then(|group| group.get(&path))
            .copied()
    }

    /// Weak lookup by the defining entity type's name rather than its node
    pub fn find_weak_entity_type_by_name(
        &self,
        name: &str,
        defining_navigation_name: &str,
        defining_entity_type_name: &str,
    ) -> Option<EntityTypeId> {
        self.weak_entity_types.get(name)?.values().copied().find(|id| {
            let node = &self.nodes[id.0];
            node.defining.as_ref().is_some_and(|defining| {
                defining.navigation_name == defining_navigation_name
                    && self.nodes[defining.entity_type.0].name == defining_entity_type_name
            })
        })
    }

    /// All attached entity types.
    ///
    /// Non-weak types come first in ordinal name order, then weak types
    /// grouped by name and ordered by path inside each group.
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> + '_ {
        self.entity_types
            .values()
            .chain(self.weak_entity_types.values().flat_map(|group| group.values()))
            .map(move |id| &self.nodes[id.0])
    }

    /// Every weak type with that name, else the non-weak one, else nothing
    pub fn entity_types_named(&self, entity_type: impl Into<TypeRef>) -> Vec<EntityTypeId> {
        let identity = self.resolve(entity_type);
        if let Some(group) = self.weak_entity_types.get(identity.name()) {
            return group.values().copied().collect();
        }
        self.entity_types
            .get(identity.name())
            .copied()
            .into_iter()
            .collect()
    }

    pub fn find_clr_type(&self, name: &str) -> Option<&ClrType> {
        match self.entity_types.get(name) {
            Some(id) => self.nodes[id.0].clr_type(),
            None => self
                .weak_entity_types
                .get(name)
                .and_then(|group| group.values().next())
                .and_then(|id| self.nodes[id.0].clr_type()),
        }
    }

    pub fn has_entity_type_with_defining_navigation(&self, entity_type: impl Into<TypeRef>) -> bool {
        let identity = self.resolve(entity_type);
        self.weak_entity_types.contains_key(identity.name())
    }

    /// Whether weak types, attached or residue, other than `entity_type`
    /// share its name
    pub fn has_other_entity_types_with_defining_navigation(&self, entity_type: EntityTypeId) -> bool {
        let node = &self.nodes[entity_type.0];
        let Some(defining) = &node.defining else {
            return false;
        };

        let path = self.path_of(entity_type);
        if self
            .weak_entity_types
            .get(&node.name)
            .is_some_and(|group| group.keys().any(|other| *other != path))
        {
            return true;
        }

        let defining_name = &self.nodes[defining.entity_type.0].name;
        self.detached_weak_entity_types
            .get(&node.name)
            .is_some_and(|residue| {
                residue.iter().any(|(navigation, parent)| {
                    *navigation != defining.navigation_name || parent != defining_name
                })
            })
    }

    /// True when weak types with this name are attached, or when more than
    /// one residue record exists for it. A single residue record does not
    /// force the type to stay weak.
    pub fn entity_type_should_have_defining_navigation(&self, entity_type: impl Into<TypeRef>) -> bool {
        let identity = self.resolve(entity_type);
        self.weak_entity_types.contains_key(identity.name())
            || self
                .detached_weak_entity_types
                .get(identity.name())
                .is_some_and(|residue| residue.len() > 1)
    }

    /// Map a possibly detached node to its currently attached counterpart.
    ///
    /// Weak types are resolved through the current navigation target of their
    /// (resolved) defining entity type, so re-parenting is followed.
    pub fn find_actual_entity_type(&self, entity_type: EntityTypeId) -> Option<EntityTypeId> {
        let node = &self.nodes[entity_type.0];
        if node.is_attached() {
            return Some(entity_type);
        }
        match &node.defining {
            Some(defining) => {
                let parent = self.find_actual_entity_type(defining.entity_type)?;
                self.find_navigation(parent, &defining.navigation_name)
                    .map(|navigation| navigation.target)
            }
            None => self.entity_types.get(&node.name).copied(),
        }
    }

    /// Navigation named `name` on the entity type or its base types
    pub fn find_navigation(&self, entity_type: EntityTypeId, name: &str) -> Option<Navigation> {
        let mut current = Some(entity_type);
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            for fk in node.declared_foreign_keys.iter().filter_map(|fk| self.foreign_key(*fk)) {
                if fk.dependent_to_principal.as_deref() == Some(name) {
                    return Some(Navigation {
                        name: name.to_string(),
                        foreign_key: fk.id,
                        target: fk.principal_entity_type,
                        is_on_dependent: true,
                    });
                }
            }
            for fk in node.referencing_foreign_keys.iter().filter_map(|fk| self.foreign_key(*fk)) {
                if fk.principal_to_dependent.as_deref() == Some(name) {
                    return Some(Navigation {
                        name: name.to_string(),
                        foreign_key: fk.id,
                        target: fk.declaring_entity_type,
                        is_on_dependent: false,
                    });
                }
            }
            current = node.base_type;
        }
        None
    }

    /// Property on the entity type or its base types
    pub fn find_property(&self, entity_type: EntityTypeId, name: &str) -> Option<&Property> {
        let mut current = Some(entity_type);
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            if let Some(property) = node.find_declared_property(name) {
                return Some(property);
            }
            current = node.base_type;
        }
        None
    }

    /// Name used in diagnostics: the short name for non-weak types and
    /// `{parent}.{navigation}#{name}` for weak ones
    pub fn display_name(&self, entity_type: EntityTypeId) -> String {
        let node = &self.nodes[entity_type.0];
        match &node.defining {
            Some(defining) => format!(
                "{}.{}#{}",
                self.display_name(defining.entity_type),
                defining.navigation_name,
                node.short_name()
            ),
            None => node.short_name(),
        }
    }

    fn path_of(&self, entity_type: EntityTypeId) -> EntityTypePath {
        let mut segments = Vec::new();
        let mut current = Some(entity_type);
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            segments.push(PathSegment {
                name: node.name.clone(),
                defining_navigation_name: node.defining_navigation_name().map(str::to_string),
            });
            current = node.defining_entity_type();
        }
        EntityTypePath(segments)
    }

    fn weak_path(
        &self,
        name: &str,
        defining_navigation_name: &str,
        defining_entity_type: EntityTypeId,
    ) -> EntityTypePath {
        let mut segments = vec![PathSegment {
            name: name.to_string(),
            defining_navigation_name: Some(defining_navigation_name.to_string()),
        }];
        segments.extend(self.path_of(defining_entity_type).0);
        EntityTypePath(segments)
    }

    fn ensure_attached(&self, entity_type: EntityTypeId) -> ModelResult<()> {
        if self.nodes[entity_type.0].is_attached() {
            Ok(())
        } else {
            Err(ModelError::EntityTypeNotAttached {
                entity_type: self.display_name(entity_type),
            })
        }
    }

    // ------------------------------------------------------------------
    // Removing entity types
    // ------------------------------------------------------------------

    /// Detach an entity type.
    ///
    /// Returns `Ok(None)` when it is not attached. Fails when another type
    /// still depends on it through a foreign key or inheritance; only the
    /// relationships declared on this exact node are checked.
    pub fn remove_entity_type(&mut self, entity_type: EntityTypeId) -> ModelResult<Option<EntityTypeId>> {
        if !self.nodes[entity_type.0].is_attached() {
            return Ok(None);
        }
        self.assert_can_remove(entity_type, &[])?;
        self.detach(entity_type);
        Ok(Some(entity_type))
    }

    pub fn remove_entity_type_by_name(
        &mut self,
        entity_type: impl Into<TypeRef>,
    ) -> ModelResult<Option<EntityTypeId>> {
        match self.find_entity_type(entity_type) {
            Some(id) => self.remove_entity_type(id),
            None => Ok(None),
        }
    }

    pub fn remove_weak_entity_type(
        &mut self,
        entity_type: impl Into<TypeRef>,
        defining_navigation_name: &str,
        defining_entity_type: EntityTypeId,
    ) -> ModelResult<Option<EntityTypeId>> {
        match self.find_weak_entity_type(entity_type, defining_navigation_name, defining_entity_type) {
            Some(id) => self.remove_entity_type(id),
            None => Ok(None),
        }
    }

    /// Detach an entity type together with the weak types it defines,
    /// recursively.
    ///
    /// Foreign keys between members of that set are removed first. Any
    /// relationship leaving the set blocks the whole removal.
    pub fn remove_entity_type_with_owned(
        &mut self,
        entity_type: EntityTypeId,
    ) -> ModelResult<Option<EntityTypeId>> {
        if !self.nodes[entity_type.0].is_attached() {
            return Ok(None);
        }

        let mut owned = vec![entity_type];
        let mut next = 0;
        while next < owned.len() {
            let parent = owned[next];
            owned.extend(
                self.weak_entity_types
                    .values()
                    .flat_map(|group| group.values())
                    .copied()
                    .filter(|id| self.nodes[id.0].defining_entity_type() == Some(parent)),
            );
            next += 1;
        }

        for id in &owned {
            self.assert_can_remove(*id, &owned)?;
        }

        let internal: Vec<ForeignKeyId> = owned
            .iter()
            .flat_map(|id| self.nodes[id.0].declared_foreign_keys.iter().copied())
            .collect();
        for fk in internal {
            self.remove_foreign_key(fk);
        }

        // Children before parents so residue records name an attached parent
        for id in owned.iter().rev() {
            self.detach(*id);
        }
        Ok(Some(entity_type))
    }

    /// Shallow removal check over the relationships declared on `entity_type`.
    /// Relationships whose other end is in `allowed` are skipped.
    fn assert_can_remove(&self, entity_type: EntityTypeId, allowed: &[EntityTypeId]) -> ModelResult<()> {
        let node = &self.nodes[entity_type.0];

        let foreign_key = node
            .declared_foreign_keys
            .iter()
            .filter_map(|fk| self.foreign_key(*fk))
            .find(|fk| {
                fk.principal_entity_type != entity_type
                    && !allowed.contains(&fk.principal_entity_type)
            });
        if let Some(fk) = foreign_key {
            return Err(ModelError::EntityTypeInUseByForeignKey {
                entity_type: self.display_name(entity_type),
                referenced_entity_type: self.display_name(fk.principal_entity_type),
                foreign_key: fk.format_properties(),
            });
        }

        let referencing = node
            .referencing_foreign_keys
            .iter()
            .filter_map(|fk| self.foreign_key(*fk))
            .find(|fk| !allowed.contains(&fk.declaring_entity_type));
        if let Some(fk) = referencing {
            return Err(ModelError::EntityTypeInUseByReferencingForeignKey {
                entity_type: self.display_name(entity_type),
                foreign_key: fk.format_properties(),
                referencing_entity_type: self.display_name(fk.declaring_entity_type),
            });
        }

        if let Some(derived) = node
            .directly_derived_types
            .iter()
            .find(|derived| !allowed.contains(derived))
        {
            return Err(ModelError::EntityTypeInUseByDerived {
                entity_type: self.display_name(entity_type),
                derived_entity_type: self.display_name(*derived),
            });
        }

        Ok(())
    }

    fn detach(&mut self, entity_type: EntityTypeId) {
        let display_name = self.display_name(entity_type);
        let node = &self.nodes[entity_type.0];
        let name = node.name.clone();
        let base_type = node.base_type;

        match node.defining.clone() {
            Some(defining) => {
                let path = self.path_of(entity_type);
                if let Some(group) = self.weak_entity_types.get_mut(&name) {
                    group.remove(&path);
                    if group.is_empty() {
                        self.weak_entity_types.remove(&name);
                    }
                }
                let defining_name = self.nodes[defining.entity_type.0].name.clone();
                self.add_detached_entity_type(&name, &defining.navigation_name, &defining_name);
            }
            None => {
                self.entity_types.remove(&name);
            }
        }

        if let Some(base) = base_type {
            self.nodes[base.0]
                .directly_derived_types
                .retain(|derived| *derived != entity_type);
        }
        self.nodes[entity_type.0].state = EntityTypeState::Detached;
        debug!("Removed entity type '{}'", display_name);
    }

    // ------------------------------------------------------------------
    // Ignore list
    // ------------------------------------------------------------------

    /// Exclude a type name from the model.
    ///
    /// Conventions are notified only the first time a name is ignored; a
    /// repeated ignore keeps the most authoritative source.
    pub fn ignore(
        &mut self,
        entity_type: impl Into<TypeRef>,
        configuration_source: ConfigurationSource,
    ) -> ModelResult<()> {
        let identity = self.resolve(entity_type);
        let name = identity.name();
        if self.entity_types.contains_key(name) || self.weak_entity_types.contains_key(name) {
            return Err(ModelError::CannotIgnoreAttachedEntityType {
                entity_type: identity.short_display_name(),
            });
        }

        if !self.ignored_types.ignore(name, configuration_source) {
            return Ok(());
        }
        debug!("Ignored type '{}' ({})", name, configuration_source);

        let dispatcher = Arc::clone(&self.conventions);
        dispatcher.on_entity_type_ignored(self, identity.name(), identity.clr_type())
    }

    pub fn unignore(&mut self, entity_type: impl Into<TypeRef>) {
        let identity = self.resolve(entity_type);
        self.ignored_types.unignore(identity.name());
    }

    pub fn find_ignored_type_configuration_source(
        &self,
        entity_type: impl Into<TypeRef>,
    ) -> Option<ConfigurationSource> {
        let identity = self.resolve(entity_type);
        self.ignored_types.find(identity.name())
    }

    pub fn ignored_types(&self) -> &IgnoredTypes {
        &self.ignored_types
    }

    // ------------------------------------------------------------------
    // Annotations
    // ------------------------------------------------------------------

    /// Set a model annotation and notify conventions.
    ///
    /// Returns the annotation the conventions settled on.
    pub fn set_annotation(
        &mut self,
        name: &str,
        value: serde_json::Value,
    ) -> ModelResult<Option<Annotation>> {
        let annotation = Annotation::new(name, value);
        let old_annotation = self.annotations.set(annotation.clone());

        let dispatcher = Arc::clone(&self.conventions);
        dispatcher.on_model_annotation_changed(self, name, Some(annotation), old_annotation.as_ref())
    }

    /// Remove a model annotation, returning it. Conventions are only notified
    /// when something was removed.
    pub fn remove_annotation(&mut self, name: &str) -> ModelResult<Option<Annotation>> {
        let Some(removed) = self.annotations.remove(name) else {
            return Ok(None);
        };

        let dispatcher = Arc::clone(&self.conventions);
        dispatcher.on_model_annotation_changed(self, name, None, Some(&removed))?;
        Ok(Some(removed))
    }

    pub fn find_annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.find(name)
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.annotations.iter()
    }

    // ------------------------------------------------------------------
    // Structure: properties, keys, inheritance, foreign keys
    // ------------------------------------------------------------------

    pub fn add_property(&mut self, entity_type: EntityTypeId, property: Property) -> ModelResult<()> {
        self.ensure_attached(entity_type)?;
        if self.find_property(entity_type, property.name()).is_some() {
            return Err(ModelError::DuplicateProperty {
                property: property.name().to_string(),
                entity_type: self.display_name(entity_type),
            });
        }
        self.nodes[entity_type.0].properties.push(property);
        Ok(())
    }

    pub fn set_primary_key(&mut self, entity_type: EntityTypeId, properties: &[&str]) -> ModelResult<()> {
        self.ensure_attached(entity_type)?;
        if let Some(missing) = properties
            .iter()
            .find(|name| self.find_property(entity_type, name).is_none())
        {
            return Err(ModelError::PropertyNotFound {
                property: missing.to_string(),
                entity_type: self.display_name(entity_type),
            });
        }
        self.nodes[entity_type.0].primary_key =
            Some(properties.iter().map(|p| p.to_string()).collect());
        Ok(())
    }

    /// Set or clear the base type
    pub fn set_base_type(
        &mut self,
        entity_type: EntityTypeId,
        base_type: Option<EntityTypeId>,
    ) -> ModelResult<()> {
        self.ensure_attached(entity_type)?;
        if let Some(base) = base_type {
            self.ensure_attached(base)?;
            let invalid = |reason: &str| ModelError::InvalidBaseType {
                entity_type: self.display_name(entity_type),
                base_type: self.display_name(base),
                reason: reason.to_string(),
            };

            let mut ancestor = Some(base);
            while let Some(id) = ancestor {
                if id == entity_type {
                    return Err(invalid("circular inheritance"));
                }
                ancestor = self.nodes[id.0].base_type;
            }
            if self.nodes[base.0].is_query_type != self.nodes[entity_type.0].is_query_type {
                return Err(invalid("query types and entity types cannot be mixed"));
            }
            if self.nodes[base.0].has_defining_navigation()
                || self.nodes[entity_type.0].has_defining_navigation()
            {
                return Err(invalid("weak entity types cannot take part in inheritance"));
            }
        }

        if let Some(old) = self.nodes[entity_type.0].base_type.take() {
            self.nodes[old.0]
                .directly_derived_types
                .retain(|derived| *derived != entity_type);
        }
        if let Some(base) = base_type {
            self.nodes[base.0].directly_derived_types.push(entity_type);
        }
        self.nodes[entity_type.0].base_type = base_type;
        Ok(())
    }

    /// Add a foreign key declared on `declaring_entity_type` over
    /// `properties`, pointing at `principal_entity_type`
    pub fn add_foreign_key(
        &mut self,
        declaring_entity_type: EntityTypeId,
        properties: &[&str],
        principal_entity_type: EntityTypeId,
    ) -> ModelResult<ForeignKeyId> {
        self.ensure_attached(declaring_entity_type)?;
        self.ensure_attached(principal_entity_type)?;
        if let Some(missing) = properties
            .iter()
            .find(|name| self.find_property(declaring_entity_type, name).is_none())
        {
            return Err(ModelError::PropertyNotFound {
                property: missing.to_string(),
                entity_type: self.display_name(declaring_entity_type),
            });
        }

        let id = ForeignKeyId(self.foreign_keys.len());
        self.foreign_keys.push(Some(ForeignKey {
            id,
            properties: properties.iter().map(|p| p.to_string()).collect(),
            declaring_entity_type,
            principal_entity_type,
            dependent_to_principal: None,
            principal_to_dependent: None,
            is_ownership: false,
        }));
        self.nodes[declaring_entity_type.0].declared_foreign_keys.push(id);
        self.nodes[principal_entity_type.0].referencing_foreign_keys.push(id);
        Ok(id)
    }

    /// Name the navigations of a foreign key. `None` leaves a side unnamed.
    pub fn set_navigations(
        &mut self,
        foreign_key: ForeignKeyId,
        dependent_to_principal: Option<&str>,
        principal_to_dependent: Option<&str>,
    ) {
        if let Some(fk) = self.foreign_keys.get_mut(foreign_key.0).and_then(Option::as_mut) {
            fk.dependent_to_principal = dependent_to_principal.map(str::to_string);
            fk.principal_to_dependent = principal_to_dependent.map(str::to_string);
        }
    }

    pub fn set_is_ownership(&mut self, foreign_key: ForeignKeyId, is_ownership: bool) {
        if let Some(fk) = self.foreign_keys.get_mut(foreign_key.0).and_then(Option::as_mut) {
            fk.is_ownership = is_ownership;
        }
    }

    pub fn remove_foreign_key(&mut self, foreign_key: ForeignKeyId) -> Option<ForeignKey> {
        let removed = self.foreign_keys.get_mut(foreign_key.0)?.take()?;
        self.nodes[removed.declaring_entity_type.0]
            .declared_foreign_keys
            .retain(|fk| *fk != foreign_key);
        self.nodes[removed.principal_entity_type.0]
            .referencing_foreign_keys
            .retain(|fk| *fk != foreign_key);
        Some(removed)
    }

    // ------------------------------------------------------------------
    // Finalization and diagnostics
    // ------------------------------------------------------------------

    /// Run the `on_model_built` conventions and freeze the model.
    ///
    /// Returns `Ok(None)` when a convention rejected the model.
    pub fn finalize_model(mut self) -> ModelResult<Option<FinalizedModel>> {
        let dispatcher = Arc::clone(&self.conventions);
        if !dispatcher.on_model_built(&mut self)? {
            return Ok(None);
        }
        info!(
            "Model finalized with {} entity types",
            self.entity_types().count()
        );
        Ok(Some(FinalizedModel::new(self)))
    }

    /// Deterministic multi-line dump of the model
    pub fn to_debug_string(&self) -> String {
        let mut out = String::from("Model:\n");
        for entity_type in self.entity_types() {
            self.write_entity_type(&mut out, entity_type);
        }

        if !self.annotations.is_empty() {
            out.push_str("  Annotations:\n");
            for annotation in self.annotations.iter() {
                let _ = writeln!(out, "    {}: {}", annotation.name(), annotation.value());
            }
        }

        if !self.ignored_types.is_empty() {
            out.push_str("  Ignored types:\n");
            for name in self.ignored_types.names() {
                if let Some(source) = self.ignored_types.find(name) {
                    let _ = writeln!(out, "    {} ({})", name, source);
                }
            }
        }
        out
    }

    fn write_entity_type(&self, out: &mut String, entity_type: &EntityType) {
        let kind = if entity_type.is_query_type() {
            "QueryType"
        } else {
            "EntityType"
        };
        let _ = write!(out, "  {}: {}", kind, self.display_name(entity_type.id()));
        if let Some(base) = entity_type.base_type() {
            let _ = write!(out, " Base: {}", self.display_name(base));
        }
        out.push('\n');

        if !entity_type.declared_properties().is_empty() {
            out.push_str("    Properties:\n");
            for property in entity_type.declared_properties() {
                let _ = write!(out, "      {}", property.name());
                if let Some(clr_type) = property.clr_type() {
                    let _ = write!(out, " ({})", clr_type.short_display_name());
                }
                if let Some(store_type) = property.store_type() {
                    let _ = write!(out, " [{}]", store_type);
                }
                if property.is_nullable() {
                    out.push_str(" nullable");
                }
                out.push('\n');
            }
        }

        if let Some(key) = entity_type.primary_key() {
            let quoted: Vec<String> = key.iter().map(|p| format!("'{}'", p)).collect();
            let _ = writeln!(out, "    Key: {{{}}}", quoted.join(", "));
        }

        let foreign_keys: Vec<&ForeignKey> = entity_type
            .declared_foreign_keys()
            .iter()
            .filter_map(|fk| self.foreign_key(*fk))
            .collect();
        if !foreign_keys.is_empty() {
            out.push_str("    Foreign keys:\n");
            for fk in foreign_keys {
                let _ = write!(
                    out,
                    "      {} -> {}",
                    fk.format_properties(),
                    self.display_name(fk.principal_entity_type)
                );
                if let Some(navigation) = fk.dependent_to_principal() {
                    let _ = write!(out, " ToPrincipal: {}", navigation);
                }
                if let Some(navigation) = fk.principal_to_dependent() {
                    let _ = write!(out, " ToDependent: {}", navigation);
                }
                if fk.is_ownership() {
                    out.push_str(" Ownership");
                }
                out.push('\n');
            }
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_debug_string())
    }
}
