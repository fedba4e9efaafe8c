//! YAML model definitions
//!
//! A [`ModelDefinition`] describes entity types, owned (weak) types, foreign
//! keys, ignored names and annotations. [`ModelDefinition::build`] replays it
//! against a fresh [`Model`] in dependency order, so every registry rule and
//! convention applies exactly as it would to hand-written configuration.
//!
//! ```yaml
//! entities:
//!   - name: Customer
//!     primary_key: [Id]
//!     properties:
//!       - { name: Id, type: int }
//!       - { name: Region, type: polygon, store_type: geography }
//!     owned:
//!       - navigation: ShippingAddress
//!         name: Address
//!         properties:
//!           - { name: Location, type: point }
//! foreign_keys:
//!   - { dependent: Order, principal: Customer, properties: [CustomerId], navigation: Customer, inverse_navigation: Orders }
//! ignored: [AuditLog]
//! annotations:
//!   ProductVersion: "2.2"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::clr_type::primitives::{BOOLEAN, DECIMAL, DOUBLE, INT32, INT64, STRING};
use super::clr_type::ClrType;
use super::conventions::{ConventionSet, KeyValidationConvention, ModelResult};
use super::entity_type::{EntityTypeId, Property};
use super::errors::ModelError;
use super::model::Model;
use crate::config::ModelBuildConfig;
use crate::query::spatial_types;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    #[serde(default)]
    pub ignored: Vec<String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(default)]
    pub query_type: bool,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default)]
    pub owned: Vec<OwnedEntityDefinition>,
}

/// Weak entity type reached from its owner through `navigation`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnedEntityDefinition {
    pub navigation: String,
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default)]
    pub owned: Vec<OwnedEntityDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub store_type: Option<String>,
    #[serde(default)]
    pub nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    pub dependent: String,
    pub principal: String,
    pub properties: Vec<String>,
    /// Navigation on the dependent pointing at the principal
    #[serde(default)]
    pub navigation: Option<String>,
    /// Navigation on the principal pointing back at the dependent
    #[serde(default)]
    pub inverse_navigation: Option<String>,
}

impl ModelDefinition {
    /// Load a model definition from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| ModelError::ConfigReadError {
            error: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a model definition from a YAML string
    pub fn from_yaml_str(yaml: &str) -> ModelResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ModelError::ConfigParseError {
            error: e.to_string(),
        })
    }

    /// Structural checks that do not need a model
    pub fn validate(&self) -> ModelResult<()> {
        if let Some(entity) = self.entities.iter().find(|e| e.name.trim().is_empty()) {
            return Err(ModelError::config_error_with_context(
                format!("entities (base type {:?})", entity.base_type),
                "Entity names cannot be empty",
            ));
        }
        if let Some(fk) = self.foreign_keys.iter().find(|fk| fk.properties.is_empty()) {
            return Err(ModelError::config_error_with_context(
                format!("foreign key {} -> {}", fk.dependent, fk.principal),
                "Foreign keys need at least one property",
            ));
        }
        Ok(())
    }

    /// Build a model with the conventions implied by `config`
    pub fn build(&self, config: &ModelBuildConfig) -> ModelResult<Model> {
        self.build_with_conventions(config, ConventionSet::new())
    }

    /// Build a model running `conventions`, plus key validation when
    /// `config.validate_on_finalize` is set
    pub fn build_with_conventions(
        &self,
        config: &ModelBuildConfig,
        mut conventions: ConventionSet,
    ) -> ModelResult<Model> {
        self.validate()?;
        if config.validate_on_finalize {
            conventions = conventions.with(KeyValidationConvention);
        }

        let mut model = Model::with_conventions(conventions)?;
        let source = config.default_configuration_source;

        for name in &self.ignored {
            model.ignore(name.as_str(), source)?;
        }

        let mut added: HashMap<&str, EntityTypeId> = HashMap::new();
        for entity in &self.entities {
            let id = if entity.query_type {
                model.add_query_type(entity.name.as_str(), source)?
            } else {
                model.add_entity_type(entity.name.as_str(), source)?
            };
            let Some(id) = id else {
                warn!("Entity type '{}' was rejected by a convention", entity.name);
                continue;
            };
            for property in &entity.properties {
                model.add_property(id, build_property(property, config)?)?;
            }
            added.insert(entity.name.as_str(), id);
        }

        for entity in &self.entities {
            let (Some(&id), Some(base_name)) = (added.get(entity.name.as_str()), &entity.base_type)
            else {
                continue;
            };
            let base = added.get(base_name.as_str()).copied().ok_or_else(|| {
                ModelError::config_error_with_context(
                    entity.name.clone(),
                    format!("Unknown base type '{}'", base_name),
                )
            })?;
            model.set_base_type(id, Some(base))?;
        }

        for entity in &self.entities {
            let Some(&id) = added.get(entity.name.as_str()) else {
                continue;
            };
            if !entity.primary_key.is_empty() {
                let key: Vec<&str> = entity.primary_key.iter().map(String::as_str).collect();
                model.set_primary_key(id, &key)?;
            }
            for owned in &entity.owned {
                add_owned(&mut model, id, owned, 1, config)?;
            }
        }

        for fk in &self.foreign_keys {
            let resolve = |name: &str| {
                added.get(name).copied().ok_or_else(|| {
                    ModelError::config_error_with_context(
                        format!("foreign key {} -> {}", fk.dependent, fk.principal),
                        format!("Unknown entity type '{}'", name),
                    )
                })
            };
            let dependent = resolve(&fk.dependent)?;
            let principal = resolve(&fk.principal)?;
            let properties: Vec<&str> = fk.properties.iter().map(String::as_str).collect();
            let id = model.add_foreign_key(dependent, &properties, principal)?;
            model.set_navigations(
                id,
                fk.navigation.as_deref(),
                fk.inverse_navigation.as_deref(),
            );
        }

        for (name, value) in &self.annotations {
            model.set_annotation(name, value.clone())?;
        }

        info!(
            "Built model with {} entity types from definition",
            model.entity_types().count()
        );
        Ok(model)
    }
}

/// Add an owned type below `owner`, keyed by a copy of the owner's primary
/// key and linked to it by an ownership foreign key
fn add_owned(
    model: &mut Model,
    owner: EntityTypeId,
    owned: &OwnedEntityDefinition,
    depth: u32,
    config: &ModelBuildConfig,
) -> ModelResult<()> {
    let location = format!("{}.{}", model.display_name(owner), owned.navigation);
    if depth > config.max_ownership_depth {
        return Err(ModelError::config_error_with_context(
            location,
            format!(
                "Owned types nested deeper than {} levels",
                config.max_ownership_depth
            ),
        ));
    }

    let key_properties = owner_key_properties(model, owner).ok_or_else(|| {
        ModelError::config_error_with_context(
            location.clone(),
            "The owner of an owned type needs a primary key",
        )
    })?;

    let Some(id) = model.add_weak_entity_type(
        owned.name.as_str(),
        &owned.navigation,
        owner,
        config.default_configuration_source,
    )?
    else {
        warn!("Owned type '{}' was rejected by a convention", location);
        return Ok(());
    };

    let mut key = Vec::with_capacity(key_properties.len());
    for property in key_properties {
        key.push(property.name().to_string());
        model.add_property(id, property)?;
    }
    let key: Vec<&str> = key.iter().map(String::as_str).collect();
    model.set_primary_key(id, &key)?;

    let ownership = model.add_foreign_key(id, &key, owner)?;
    model.set_navigations(ownership, None, Some(owned.navigation.as_str()));
    model.set_is_ownership(ownership, true);

    for property in &owned.properties {
        model.add_property(id, build_property(property, config)?)?;
    }
    for nested in &owned.owned {
        add_owned(model, id, nested, depth + 1, config)?;
    }
    Ok(())
}

/// Primary key properties of `entity_type`, inherited keys included
fn owner_key_properties(model: &Model, entity_type: EntityTypeId) -> Option<Vec<Property>> {
    let mut current = Some(entity_type);
    while let Some(id) = current {
        let node = model.entity_type(id);
        if let Some(key) = node.primary_key() {
            return key
                .iter()
                .map(|name| model.find_property(id, name).cloned())
                .collect();
        }
        current = node.base_type();
    }
    None
}

fn build_property(definition: &PropertyDefinition, config: &ModelBuildConfig) -> ModelResult<Property> {
    let clr_type = resolve_property_type(&definition.type_name).ok_or_else(|| {
        ModelError::config_error_with_context(
            definition.name.clone(),
            format!("Unknown property type '{}'", definition.type_name),
        )
    })?;

    let store_type = match &definition.store_type {
        Some(store_type) => Some(store_type.clone()),
        None if spatial_types::is_geometry(&clr_type) => Some(config.default_spatial_store_type.clone()),
        None => None,
    };

    let mut property = Property::new(definition.name.clone())
        .with_clr_type(&clr_type)
        .nullable(definition.nullable);
    if let Some(store_type) = store_type {
        property = property.with_store_type(store_type);
    }
    Ok(property)
}

fn resolve_property_type(type_name: &str) -> Option<ClrType> {
    let scalar = match type_name.to_ascii_lowercase().as_str() {
        "int" | "int32" => Some(&*INT32),
        "long" | "int64" => Some(&*INT64),
        "double" | "float" => Some(&*DOUBLE),
        "decimal" => Some(&*DECIMAL),
        "bool" | "boolean" => Some(&*BOOLEAN),
        "string" => Some(&*STRING),
        _ => None,
    };
    scalar
        .or_else(|| spatial_types::find_by_name(type_name))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::configuration_source::ConfigurationSource;
    use crate::metadata::model_view::ReadOnlyModel;
    use crate::query::spatial_types::POLYGON;

    const SHOP: &str = r#"
entities:
  - name: Customer
    primary_key: [Id]
    properties:
      - { name: Id, type: int }
      - { name: Name, type: string, nullable: true }
    owned:
      - navigation: ShippingAddress
        name: Address
        properties:
          - { name: Street, type: string }
          - { name: Location, type: point, store_type: geography }
        owned:
          - navigation: Zone
            name: DeliveryZone
            properties:
              - { name: Boundary, type: polygon }
  - name: Order
    primary_key: [Id]
    properties:
      - { name: Id, type: int }
      - { name: CustomerId, type: int }
  - name: PriorityOrder
    base_type: Order
    properties:
      - { name: Deadline, type: long }
  - name: OrderSummary
    query_type: true
    properties:
      - { name: Total, type: decimal }
foreign_keys:
  - dependent: Order
    principal: Customer
    properties: [CustomerId]
    navigation: Customer
    inverse_navigation: Orders
ignored: [AuditLog]
annotations:
  ProductVersion: "2.2"
"#;

    #[test]
    fn test_build_shop_model() {
        let definition = ModelDefinition::from_yaml_str(SHOP).unwrap();
        let model = definition.build(&ModelBuildConfig::default()).unwrap();

        let customer = model.find_entity_type("Customer").unwrap();
        let address = model
            .find_weak_entity_type("Address", "ShippingAddress", customer)
            .unwrap();
        let zone = model
            .find_weak_entity_type("DeliveryZone", "Zone", address)
            .unwrap();

        // Owned types are keyed by a copy of the owner's key
        assert_eq!(model.entity_type(address).primary_key(), Some(&["Id".to_string()][..]));
        assert_eq!(model.entity_type(zone).primary_key(), Some(&["Id".to_string()][..]));

        let navigation = model.find_navigation(customer, "ShippingAddress").unwrap();
        assert_eq!(navigation.target, address);
        assert!(model.foreign_key(navigation.foreign_key).unwrap().is_ownership());

        let boundary = model.find_property(zone, "Boundary").unwrap();
        assert_eq!(boundary.clr_type(), Some(&*POLYGON));
        assert_eq!(boundary.store_type(), Some("geometry"));
        let location = model.find_property(address, "Location").unwrap();
        assert_eq!(location.store_type(), Some("geography"));

        let priority = model.find_entity_type("PriorityOrder").unwrap();
        let order = model.find_entity_type("Order").unwrap();
        assert_eq!(model.entity_type(priority).base_type(), Some(order));
        assert!(model.find_navigation(priority, "Customer").is_some());

        let summary = model.find_entity_type("OrderSummary").unwrap();
        assert!(model.entity_type(summary).is_query_type());

        assert_eq!(
            model.find_ignored_type_configuration_source("AuditLog"),
            Some(ConfigurationSource::Explicit)
        );
        assert_eq!(
            model.find_annotation("ProductVersion").unwrap().value(),
            &serde_json::json!("2.2")
        );

        let finalized = model.finalize_model().unwrap().unwrap();
        assert_eq!(finalized.entity_types().count(), 6);
    }

    #[test]
    fn test_ownership_depth_limit() {
        let definition = ModelDefinition::from_yaml_str(SHOP).unwrap();
        let config = ModelBuildConfig {
            max_ownership_depth: 1,
            ..Default::default()
        };

        let error = definition.build(&config).unwrap_err();
        assert!(matches!(error, ModelError::InvalidConfig { .. }));
        assert!(error.to_string().contains("Customer.ShippingAddress#Address.Zone"));
    }

    #[test]
    fn test_missing_key_fails_finalization() {
        let yaml = r#"
entities:
  - name: Tag
    properties:
      - { name: Label, type: string }
"#;
        let model = ModelDefinition::from_yaml_str(yaml)
            .unwrap()
            .build(&ModelBuildConfig::default())
            .unwrap();
        assert_eq!(
            model.finalize_model().unwrap_err(),
            ModelError::MissingPrimaryKey {
                entity_type: "Tag".to_string()
            }
        );

        let lenient = ModelBuildConfig {
            validate_on_finalize: false,
            ..Default::default()
        };
        let model = ModelDefinition::from_yaml_str(yaml)
            .unwrap()
            .build(&lenient)
            .unwrap();
        assert!(model.finalize_model().unwrap().is_some());
    }

    #[test]
    fn test_unknown_references() {
        let unknown_type = r#"
entities:
  - name: Tag
    properties:
      - { name: Label, type: text }
"#;
        let error = ModelDefinition::from_yaml_str(unknown_type)
            .unwrap()
            .build(&ModelBuildConfig::default())
            .unwrap_err();
        assert!(error.to_string().contains("Unknown property type 'text'"));

        let unknown_principal = r#"
entities:
  - name: Post
    primary_key: [Id]
    properties:
      - { name: Id, type: int }
      - { name: BlogId, type: int }
foreign_keys:
  - { dependent: Post, principal: Blog, properties: [BlogId] }
"#;
        let error = ModelDefinition::from_yaml_str(unknown_principal)
            .unwrap()
            .build(&ModelBuildConfig::default())
            .unwrap_err();
        assert!(error.to_string().contains("Unknown entity type 'Blog'"));
    }

    #[test]
    fn test_ignored_entity_in_definition() {
        let yaml = r#"
entities:
  - name: AuditLog
ignored: [AuditLog]
"#;
        let error = ModelDefinition::from_yaml_str(yaml)
            .unwrap()
            .build(&ModelBuildConfig::default())
            .unwrap_err();
        assert_eq!(
            error,
            ModelError::EntityTypeIgnored {
                entity_type: "AuditLog".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ModelDefinition::from_yaml_str("entities: {"),
            Err(ModelError::ConfigParseError { .. })
        ));
        assert!(matches!(
            ModelDefinition::from_yaml_file("/nonexistent/model.yaml"),
            Err(ModelError::ConfigReadError { .. })
        ));
    }
}
