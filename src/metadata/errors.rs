//! # Model Error Types
//!
//! Errors raised while building the metadata model.
//!
//! ## Error Categories
//!
//! - **Registry Errors**: name clashes between entity, query and weak entity
//!   types, and removals blocked by relationships that still point at a type
//! - **Structure Errors**: properties, keys, base types and foreign keys that
//!   reference missing or detached metadata
//! - **Convention Errors**: failures raised by conventions, propagated as-is
//! - **Configuration Errors**: reading and parsing model definition files
//!
//! All of these are misconfiguration errors. Each check runs before the
//! registry is mutated, so a failed call leaves the model unchanged.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("The entity type '{entity_type}' cannot be added to the model because a weak entity type with the same name already exists.")]
    ClashingWeakEntityType { entity_type: String },
    #[error("The weak entity type '{entity_type}' cannot be added to the model because an entity type with the same name already exists.")]
    ClashingNonWeakEntityType { entity_type: String },
    #[error("The entity type '{entity_type}' cannot be added to the model because an entity type with the same name already exists.")]
    DuplicateEntityType { entity_type: String },
    #[error("The query type '{query_type}' cannot be added to the model because a query type with the same name already exists.")]
    DuplicateQueryType { query_type: String },
    #[error("Cannot use '{entity_type}' as an entity type because it is configured as a query type.")]
    CannotAccessQueryAsEntity { entity_type: String },
    #[error("Cannot use '{query_type}' as a query type because it is configured as an entity type.")]
    CannotAccessEntityAsQuery { query_type: String },
    #[error("The entity type '{entity_type}' cannot be removed because it is referencing '{referenced_entity_type}' by foreign key {foreign_key}. All foreign keys must be removed before the entity type can be removed.")]
    EntityTypeInUseByForeignKey {
        entity_type: String,
        referenced_entity_type: String,
        foreign_key: String,
    },
    #[error("The entity type '{entity_type}' cannot be removed because it is being referenced by foreign key {foreign_key} on '{referencing_entity_type}'. All referencing foreign keys must be removed or redefined before the entity type can be removed.")]
    EntityTypeInUseByReferencingForeignKey {
        entity_type: String,
        foreign_key: String,
        referencing_entity_type: String,
    },
    #[error("The entity type '{entity_type}' cannot be removed because '{derived_entity_type}' is derived from it. All derived entity types must be removed or redefined before the entity type can be removed.")]
    EntityTypeInUseByDerived {
        entity_type: String,
        derived_entity_type: String,
    },
    #[error("The type '{entity_type}' cannot be added to the model because it is ignored. Call unignore first.")]
    EntityTypeIgnored { entity_type: String },
    #[error("The type '{entity_type}' cannot be ignored because it is part of the model. Remove the entity type first.")]
    CannotIgnoreAttachedEntityType { entity_type: String },
    #[error("The entity type '{entity_type}' is not part of the model.")]
    EntityTypeNotAttached { entity_type: String },
    #[error("The property '{property}' cannot be added to '{entity_type}' because a property with the same name already exists.")]
    DuplicateProperty { property: String, entity_type: String },
    #[error("The property '{property}' was not found on '{entity_type}'.")]
    PropertyNotFound { property: String, entity_type: String },
    #[error("'{base_type}' cannot be the base type of '{entity_type}' ({reason}).")]
    InvalidBaseType {
        entity_type: String,
        base_type: String,
        reason: String,
    },
    #[error("The entity type '{entity_type}' requires a primary key to be defined.")]
    MissingPrimaryKey { entity_type: String },
    #[error("Convention '{convention}' failed: {message}")]
    Convention { convention: String, message: String },
    #[error("Failed to read model definition: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse model definition: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid model definition: {message}")]
    InvalidConfig { message: String },
}

/// Helper methods for creating errors with context information
impl ModelError {
    /// Create a convention failure
    ///
    /// # Example
    /// ```ignore
    /// ModelError::convention("TableNameConvention", "table name 'x' is reserved")
    /// ```
    pub fn convention(convention: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::Convention {
            convention: convention.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error with context information
    ///
    /// # Example
    /// ```ignore
    /// ModelError::config_error_with_context(
    ///     "Order.Lines",
    ///     "Owned types nested deeper than 8 levels"
    /// )
    /// ```
    pub fn config_error_with_context(
        location: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        ModelError::InvalidConfig {
            message: format!("{}\n  Context: {}", location.into(), context.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_relationship() {
        let error = ModelError::EntityTypeInUseByForeignKey {
            entity_type: "Post".to_string(),
            referenced_entity_type: "Blog".to_string(),
            foreign_key: "{'BlogId'}".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("'Post'"));
        assert!(message.contains("'Blog'"));
        assert!(message.contains("{'BlogId'}"));
    }

    #[test]
    fn test_config_error_with_context() {
        let error = ModelError::config_error_with_context("Order", "while adding owned types");
        assert!(error.to_string().contains("Context: while adding owned types"));
    }
}
