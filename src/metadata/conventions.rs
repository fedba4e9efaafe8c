//! Convention hooks
//!
//! The [`Model`] notifies a [`ConventionDispatcher`] after every structural
//! change. Conventions run in registration order and receive the model
//! mutably, so they may call back into the registry. The registry always
//! commits its own tables before dispatching.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use super::annotations::Annotation;
use super::clr_type::ClrType;
use super::entity_type::EntityTypeId;
use super::errors::ModelError;
use super::model::Model;

pub type ModelResult<T> = Result<T, ModelError>;

/// A schema rule invoked by the model as it is built.
///
/// Every hook has a pass-through default, so a convention only implements
/// the events it cares about.
pub trait Convention: Send + Sync {
    fn name(&self) -> &str;

    fn on_model_initialized(&self, _model: &mut Model) -> ModelResult<()> {
        Ok(())
    }

    /// Returns the entity type that should stand for the added one, or
    /// `None` to reject it.
    fn on_entity_type_added(
        &self,
        _model: &mut Model,
        entity_type: EntityTypeId,
    ) -> ModelResult<Option<EntityTypeId>> {
        Ok(Some(entity_type))
    }

    /// Returns `false` to stop later conventions from seeing the event.
    fn on_entity_type_ignored(
        &self,
        _model: &mut Model,
        _name: &str,
        _clr_type: Option<&ClrType>,
    ) -> ModelResult<bool> {
        Ok(true)
    }

    /// Returns the annotation to keep. `annotation` is `None` on removal.
    fn on_model_annotation_changed(
        &self,
        _model: &mut Model,
        _name: &str,
        annotation: Option<Annotation>,
        _old_annotation: Option<&Annotation>,
    ) -> ModelResult<Option<Annotation>> {
        Ok(annotation)
    }

    /// Returns `false` to reject the model.
    fn on_model_built(&self, _model: &mut Model) -> ModelResult<bool> {
        Ok(true)
    }
}

/// Ordered list of conventions
#[derive(Clone, Default)]
pub struct ConventionSet {
    conventions: Vec<Arc<dyn Convention>>,
}

impl ConventionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, convention: impl Convention + 'static) -> Self {
        self.conventions.push(Arc::new(convention));
        self
    }

    pub fn add(&mut self, convention: Arc<dyn Convention>) {
        self.conventions.push(convention);
    }

    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.conventions.iter().map(|c| c.name()).collect()
    }
}

impl fmt::Debug for ConventionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Runs a [`ConventionSet`] against a model
#[derive(Debug, Default)]
pub struct ConventionDispatcher {
    conventions: ConventionSet,
}

impl ConventionDispatcher {
    pub fn new(conventions: ConventionSet) -> Self {
        ConventionDispatcher { conventions }
    }

    pub fn conventions(&self) -> &ConventionSet {
        &self.conventions
    }

    pub fn on_model_initialized(&self, model: &mut Model) -> ModelResult<()> {
        for convention in &self.conventions.conventions {
            convention.on_model_initialized(model)?;
        }
        Ok(())
    }

    pub fn on_entity_type_added(
        &self,
        model: &mut Model,
        entity_type: EntityTypeId,
    ) -> ModelResult<Option<EntityTypeId>> {
        let mut current = entity_type;
        for convention in &self.conventions.conventions {
            match convention.on_entity_type_added(model, current)? {
                Some(next) if model.entity_type(next).is_attached() => current = next,
                _ => {
                    debug!(
                        "Convention '{}' rejected entity type '{}'",
                        convention.name(),
                        model.display_name(entity_type)
                    );
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    pub fn on_entity_type_ignored(
        &self,
        model: &mut Model,
        name: &str,
        clr_type: Option<&ClrType>,
    ) -> ModelResult<()> {
        for convention in &self.conventions.conventions {
            if !convention.on_entity_type_ignored(model, name, clr_type)? {
                break;
            }
        }
        Ok(())
    }

    pub fn on_model_annotation_changed(
        &self,
        model: &mut Model,
        name: &str,
        annotation: Option<Annotation>,
        old_annotation: Option<&Annotation>,
    ) -> ModelResult<Option<Annotation>> {
        for convention in &self.conventions.conventions {
            let changed = convention.on_model_annotation_changed(
                model,
                name,
                annotation.clone(),
                old_annotation,
            )?;
            if changed != annotation {
                return Ok(changed);
            }
        }
        Ok(annotation)
    }

    pub fn on_model_built(&self, model: &mut Model) -> ModelResult<bool> {
        for convention in &self.conventions.conventions {
            if !convention.on_model_built(model)? {
                warn!("Convention '{}' rejected the model", convention.name());
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Requires a primary key on every root entity type that is neither a query
/// type nor owned.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyValidationConvention;

impl Convention for KeyValidationConvention {
    fn name(&self) -> &str {
        "KeyValidationConvention"
    }

    fn on_model_built(&self, model: &mut Model) -> ModelResult<bool> {
        let missing = model.entity_types().find(|entity_type| {
            !entity_type.is_query_type()
                && !entity_type.has_defining_navigation()
                && entity_type.base_type().is_none()
                && entity_type.primary_key().is_none()
        });

        match missing {
            Some(entity_type) => Err(ModelError::MissingPrimaryKey {
                entity_type: model.display_name(entity_type.id()),
            }),
            None => Ok(true),
        }
    }
}
