//! Read-only access to a model
//!
//! [`ReadOnlyModel`] restricts a [`Model`] to its lookup operations. It is
//! implemented by the mutable model itself and by [`FinalizedModel`], the
//! frozen result of [`Model::finalize_model`]. Both share the same storage.

use super::annotations::Annotation;
use super::entity_type::{EntityType, EntityTypeId, ForeignKey, ForeignKeyId, Navigation, Property};
use super::model::Model;

pub trait ReadOnlyModel {
    fn entity_type(&self, id: EntityTypeId) -> &EntityType;

    fn foreign_key(&self, id: ForeignKeyId) -> Option<&ForeignKey>;

    fn find_entity_type(&self, name: &str) -> Option<EntityTypeId>;

    fn find_weak_entity_type(
        &self,
        name: &str,
        defining_navigation_name: &str,
        defining_entity_type: EntityTypeId,
    ) -> Option<EntityTypeId>;

    fn entity_types(&self) -> Box<dyn Iterator<Item = &EntityType> + '_>;

    fn find_navigation(&self, entity_type: EntityTypeId, name: &str) -> Option<Navigation>;

    fn find_property(&self, entity_type: EntityTypeId, name: &str) -> Option<&Property>;

    fn find_annotation(&self, name: &str) -> Option<&Annotation>;

    fn display_name(&self, entity_type: EntityTypeId) -> String;
}

impl ReadOnlyModel for Model {
    fn entity_type(&self, id: EntityTypeId) -> &EntityType {
        Model::entity_type(self, id)
    }

    fn foreign_key(&self, id: ForeignKeyId) -> Option<&ForeignKey> {
        Model::foreign_key(self, id)
    }

    fn find_entity_type(&self, name: &str) -> Option<EntityTypeId> {
        Model::find_entity_type(self, name)
    }

    fn find_weak_entity_type(
        &self,
        name: &str,
        defining_navigation_name: &str,
        defining_entity_type: EntityTypeId,
    ) -> Option<EntityTypeId> {
        Model::find_weak_entity_type(self, name, defining_navigation_name, defining_entity_type)
    }

    fn entity_types(&self) -> Box<dyn Iterator<Item = &EntityType> + '_> {
        Box::new(Model::entity_types(self))
    }

    fn find_navigation(&self, entity_type: EntityTypeId, name: &str) -> Option<Navigation> {
        Model::find_navigation(self, entity_type, name)
    }

    fn find_property(&self, entity_type: EntityTypeId, name: &str) -> Option<&Property> {
        Model::find_property(self, entity_type, name)
    }

    fn find_annotation(&self, name: &str) -> Option<&Annotation> {
        Model::find_annotation(self, name)
    }

    fn display_name(&self, entity_type: EntityTypeId) -> String {
        Model::display_name(self, entity_type)
    }
}

/// A model that passed its `on_model_built` conventions. Immutable, so it
/// can be shared across threads.
#[derive(Debug)]
pub struct FinalizedModel {
    model: Model,
}

impl FinalizedModel {
    pub(crate) fn new(model: Model) -> Self {
        FinalizedModel { model }
    }

    /// Full dump, same format as [`Model::to_debug_string`]
    pub fn to_debug_string(&self) -> String {
        self.model.to_debug_string()
    }
}

impl ReadOnlyModel for FinalizedModel {
    fn entity_type(&self, id: EntityTypeId) -> &EntityType {
        self.model.entity_type(id)
    }

    fn foreign_key(&self, id: ForeignKeyId) -> Option<&ForeignKey> {
        self.model.foreign_key(id)
    }

    fn find_entity_type(&self, name: &str) -> Option<EntityTypeId> {
        self.model.find_entity_type(name)
    }

    fn find_weak_entity_type(
        &self,
        name: &str,
        defining_navigation_name: &str,
        defining_entity_type: EntityTypeId,
    ) -> Option<EntityTypeId> {
        self.model
            .find_weak_entity_type(name, defining_navigation_name, defining_entity_type)
    }

    fn entity_types(&self) -> Box<dyn Iterator<Item = &EntityType> + '_> {
        Box::new(self.model.entity_types())
    }

    fn find_navigation(&self, entity_type: EntityTypeId, name: &str) -> Option<Navigation> {
        self.model.find_navigation(entity_type, name)
    }

    fn find_property(&self, entity_type: EntityTypeId, name: &str) -> Option<&Property> {
        self.model.find_property(entity_type, name)
    }

    fn find_annotation(&self, name: &str) -> Option<&Annotation> {
        self.model.find_annotation(name)
    }

    fn display_name(&self, entity_type: EntityTypeId) -> String {
        self.model.display_name(entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::configuration_source::ConfigurationSource;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_finalized_model_is_shareable() {
        assert_send_sync::<FinalizedModel>();
    }

    #[test]
    fn test_view_over_mutable_and_finalized_model() {
        let mut model = Model::new();
        let blog = model
            .add_entity_type("Blog", ConfigurationSource::Explicit)
            .unwrap()
            .unwrap();

        let view: &dyn ReadOnlyModel = &model;
        assert_eq!(view.find_entity_type("Blog"), Some(blog));
        assert_eq!(view.entity_types().count(), 1);

        let finalized = model.finalize_model().unwrap().unwrap();
        assert_eq!(finalized.find_entity_type("Blog"), Some(blog));
        assert_eq!(finalized.display_name(blog), "Blog");
    }
}
