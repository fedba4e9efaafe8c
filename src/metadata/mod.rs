pub mod annotations;
pub mod clr_type;
pub mod configuration_source;
pub mod conventions;
pub mod definition;
pub mod entity_type;
pub mod errors;
pub mod ignored_types;
pub mod model;
pub mod model_view;
pub mod type_identity;


// Re-export commonly used types
pub use annotations::Annotation;
pub use clr_type::{ClrType, MemberInfo};
pub use configuration_source::ConfigurationSource;
pub use conventions::{Convention, ConventionSet, KeyValidationConvention, ModelResult};
pub use definition::ModelDefinition;
pub use entity_type::{EntityType, EntityTypeId, ForeignKey, ForeignKeyId, Navigation, Property};
pub use errors::ModelError;
pub use model::Model;
pub use model_view::{FinalizedModel, ReadOnlyModel};
pub use type_identity::TypeRef;
