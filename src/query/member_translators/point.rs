use log::trace;

use crate::query::expression::{MemberExpression, SqlExpression, SqlFunctionExpression};
use crate::query::function_registry;
use crate::query::spatial_types::IPOINT;

use super::MemberTranslator;

/// Translates `IPoint` coordinates to SQL Server property accessors
/// (`STX`/`STY` on `geometry`, `Long`/`Lat` on `geography`).
///
/// Coordinates are scalars, so results carry no type mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct PointMemberTranslator;

impl MemberTranslator for PointMemberTranslator {
    fn translate(&self, member_expression: &MemberExpression) -> Option<SqlExpression> {
        if !IPOINT.is_assignable_from(member_expression.member().declaring_type()) {
            return None;
        }

        let is_geography = member_expression
            .find_spatial_store_type()
            .is_some_and(|s| s.eq_ignore_ascii_case("geography"));
        let member = member_expression.member().on_interface(&IPOINT);
        let property = function_registry::point_property(&member, is_geography)?;
        trace!("Point member '{}' -> {}", member, property);

        Some(SqlExpression::Function(SqlFunctionExpression::instance_property(
            member_expression.expression().clone(),
            property,
            member_expression.clr_type(),
        )))
    }
}
