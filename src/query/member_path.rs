//! Dotted member paths over a model
//!
//! A path such as `Customer.ShippingAddress.Location.X` starts at an entity
//! type, follows navigations until it reaches a property, and then applies
//! member accesses to that property's column. Every member access goes
//! through the translator chain.

use log::debug;

use crate::metadata::model_view::ReadOnlyModel;

use super::errors::QueryTranslationError;
use super::expression::{ColumnExpression, MemberExpression, SqlExpression};
use super::member_translators::MemberTranslatorChain;
use super::type_mapping::TypeMappingSource;

/// Translate `path` against `model`.
///
/// The column is aliased by the lower-cased first letter of the root entity
/// type, e.g. `[c].[Location]` for `Customer`.
pub fn translate_member_path(
    model: &dyn ReadOnlyModel,
    path: &str,
    type_mapping_source: &dyn TypeMappingSource,
    translators: &MemberTranslatorChain,
) -> Result<SqlExpression, QueryTranslationError> {
    let invalid = |reason: &str| QueryTranslationError::InvalidMemberPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = path.split('.');
    let root_name = segments.next().unwrap_or_default();
    if root_name.is_empty() || path.split('.').any(str::is_empty) {
        return Err(invalid("empty segment"));
    }

    let mut entity_type = model.find_entity_type(root_name).ok_or_else(|| {
        QueryTranslationError::EntityTypeNotFound {
            entity_type: root_name.to_string(),
        }
    })?;
    let table_alias = root_name
        .chars()
        .next()
        .map(|c| c.to_lowercase().to_string())
        .unwrap_or_default();

    let mut current = None;
    for segment in segments.by_ref() {
        if let Some(property) = model.find_property(entity_type, segment) {
            current = Some(SqlExpression::Column(ColumnExpression::for_property(
                table_alias.clone(),
                property,
                type_mapping_source,
            )));
            break;
        }
        match model.find_navigation(entity_type, segment) {
            Some(navigation) => entity_type = navigation.target,
            None => {
                return Err(QueryTranslationError::UnknownPathSegment {
                    segment: segment.to_string(),
                    entity_type: model.display_name(entity_type),
                })
            }
        }
    }

    let mut current = current.ok_or_else(|| invalid("the path does not reach a property"))?;
    for member in segments {
        let member_expression = MemberExpression::access(current, member)?;
        current = translators.translate_required(&member_expression)?;
    }

    debug!("Translated member path '{}'", path);
    Ok(current)
}
