use std::fmt;

use super::clr_type::ClrType;
use super::configuration_source::ConfigurationSource;

/// Index of an entity type node in its model.
///
/// Ids are only meaningful for the model that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityTypeId(pub(crate) usize);

/// Index of a foreign key in its model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignKeyId(pub(crate) usize);

/// Lifecycle of an entity type node.
///
/// Nodes only become observable once added, so there is no unattached state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTypeState {
    /// Present in one of the model's entity type tables
    Attached,
    /// Removed from the model; kept so detached references can be resolved
    Detached,
}

/// Parent navigation that scopes a weak entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefiningNavigation {
    pub navigation_name: String,
    pub entity_type: EntityTypeId,
}

/// Scalar property of an entity type
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    clr_type: Option<ClrType>,
    store_type: Option<String>,
    is_nullable: bool,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Property {
            name: name.into(),
            clr_type: None,
            store_type: None,
            is_nullable: false,
        }
    }

    pub fn with_clr_type(mut self, clr_type: &ClrType) -> Self {
        self.clr_type = Some(clr_type.clone());
        self
    }

    /// Backend column type, e.g. `geography` or `nvarchar(50)`
    pub fn with_store_type(mut self, store_type: impl Into<String>) -> Self {
        self.store_type = Some(store_type.into());
        self
    }

    pub fn nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clr_type(&self) -> Option<&ClrType> {
        self.clr_type.as_ref()
    }

    pub fn store_type(&self) -> Option<&str> {
        self.store_type.as_deref()
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }
}

/// Relationship from a dependent (declaring) entity type to a principal one
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub(crate) id: ForeignKeyId,
    pub(crate) properties: Vec<String>,
    pub(crate) declaring_entity_type: EntityTypeId,
    pub(crate) principal_entity_type: EntityTypeId,
    pub(crate) dependent_to_principal: Option<String>,
    pub(crate) principal_to_dependent: Option<String>,
    pub(crate) is_ownership: bool,
}

impl ForeignKey {
    pub fn id(&self) -> ForeignKeyId {
        self.id
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn declaring_entity_type(&self) -> EntityTypeId {
        self.declaring_entity_type
    }

    pub fn principal_entity_type(&self) -> EntityTypeId {
        self.principal_entity_type
    }

    /// Navigation on the dependent that points at the principal
    pub fn dependent_to_principal(&self) -> Option<&str> {
        self.dependent_to_principal.as_deref()
    }

    /// Navigation on the principal that points at the dependent
    pub fn principal_to_dependent(&self) -> Option<&str> {
        self.principal_to_dependent.as_deref()
    }

    pub fn is_ownership(&self) -> bool {
        self.is_ownership
    }

    /// Property list as shown in diagnostics: `{'A', 'B'}`
    pub fn format_properties(&self) -> String {
        let quoted: Vec<String> = self.properties.iter().map(|p| format!("'{}'", p)).collect();
        format!("{{{}}}", quoted.join(", "))
    }
}

/// A navigation resolved from a foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub name: String,
    pub foreign_key: ForeignKeyId,
    /// The entity type the navigation leads to
    pub target: EntityTypeId,
    /// True when the navigation is declared on the dependent side
    pub is_on_dependent: bool,
}

/// One step of an entity type's identity path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PathSegment {
    pub name: String,
    pub defining_navigation_name: Option<String>,
}

/// Full identity of an entity type: its name and defining navigation, then
/// those of its defining entity type, up to the first non-weak type.
///
/// The derived ordering compares name, then navigation (a missing
/// navigation sorts first), then the parent's path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntityTypePath(pub(crate) Vec<PathSegment>);

impl EntityTypePath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for EntityTypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().rev().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match &segment.defining_navigation_name {
                Some(navigation) => write!(f, "{}#{}", navigation, segment.name)?,
                None => f.write_str(&segment.name)?,
            }
        }
        Ok(())
    }
}

/// Entity type node. Owned by the [`Model`](super::model::Model) and
/// mutated only through it.
#[derive(Debug, Clone)]
pub struct EntityType {
    pub(crate) id: EntityTypeId,
    pub(crate) name: String,
    pub(crate) clr_type: Option<ClrType>,
    pub(crate) defining: Option<DefiningNavigation>,
    pub(crate) is_query_type: bool,
    pub(crate) configuration_source: ConfigurationSource,
    pub(crate) state: EntityTypeState,
    pub(crate) base_type: Option<EntityTypeId>,
    pub(crate) directly_derived_types: Vec<EntityTypeId>,
    pub(crate) properties: Vec<Property>,
    pub(crate) primary_key: Option<Vec<String>>,
    pub(crate) declared_foreign_keys: Vec<ForeignKeyId>,
    pub(crate) referencing_foreign_keys: Vec<ForeignKeyId>,
}

impl EntityType {
    pub(crate) fn new(
        id: EntityTypeId,
        name: String,
        clr_type: Option<ClrType>,
        defining: Option<DefiningNavigation>,
        is_query_type: bool,
        configuration_source: ConfigurationSource,
    ) -> Self {
        EntityType {
            id,
            name,
            clr_type,
            defining,
            is_query_type,
            configuration_source,
            state: EntityTypeState::Attached,
            base_type: None,
            directly_derived_types: Vec::new(),
            properties: Vec::new(),
            primary_key: None,
            declared_foreign_keys: Vec::new(),
            referencing_foreign_keys: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clr_type(&self) -> Option<&ClrType> {
        self.clr_type.as_ref()
    }

    /// Name without namespace, as used in diagnostics
    pub fn short_name(&self) -> String {
        match &self.clr_type {
            Some(clr_type) => clr_type.short_display_name(),
            None => self.name.clone(),
        }
    }

    pub fn has_defining_navigation(&self) -> bool {
        self.defining.is_some()
    }

    pub fn defining(&self) -> Option<&DefiningNavigation> {
        self.defining.as_ref()
    }

    pub fn defining_navigation_name(&self) -> Option<&str> {
        self.defining.as_ref().map(|d| d.navigation_name.as_str())
    }

    pub fn defining_entity_type(&self) -> Option<EntityTypeId> {
        self.defining.as_ref().map(|d| d.entity_type)
    }

    pub fn is_query_type(&self) -> bool {
        self.is_query_type
    }

    pub fn configuration_source(&self) -> ConfigurationSource {
        self.configuration_source
    }

    pub fn state(&self) -> EntityTypeState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == EntityTypeState::Attached
    }

    pub fn base_type(&self) -> Option<EntityTypeId> {
        self.base_type
    }

    pub fn directly_derived_types(&self) -> &[EntityTypeId] {
        &self.directly_derived_types
    }

    /// Properties declared on this type (not inherited ones)
    pub fn declared_properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn find_declared_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn primary_key(&self) -> Option<&[String]> {
        self.primary_key.as_deref()
    }

    pub fn declared_foreign_keys(&self) -> &[ForeignKeyId] {
        &self.declared_foreign_keys
    }

    pub fn referencing_foreign_keys(&self) -> &[ForeignKeyId] {
        &self.referencing_foreign_keys
    }
}
