use std::sync::Arc;

use crate::query::expression::{Literal, MemberExpression, SqlExpression, SqlFunctionExpression};
use crate::query::function_registry::{
    self, POLYGON_EXTERIOR_RING, POLYGON_NUM_INTERIOR_RINGS,
};
use crate::query::spatial_types::{self, ILINESTRING, IPOLYGON};
use crate::query::type_mapping::{self, TypeMappingSource};

use super::MemberTranslator;

/// Translates `IPolygon` members to SQL Server spatial calls.
///
/// `geography` counts the exterior ring as ring 1, so the ring accessors
/// differ from the planar `geometry` ones.
pub struct PolygonMemberTranslator {
    type_mapping_source: Arc<dyn TypeMappingSource>,
}

impl PolygonMemberTranslator {
    pub fn new(type_mapping_source: Arc<dyn TypeMappingSource>) -> Self {
        PolygonMemberTranslator {
            type_mapping_source,
        }
    }
}

impl MemberTranslator for PolygonMemberTranslator {
    fn translate(&self, member_expression: &MemberExpression) -> Option<SqlExpression> {
        if !IPOLYGON.is_assignable_from(member_expression.member().declaring_type()) {
            return None;
        }

        let store_type = member_expression.find_spatial_store_type();
        let is_geography = store_type.is_some_and(|s| s.eq_ignore_ascii_case("geography"));
        let member = member_expression.member().on_interface(&IPOLYGON);
        let instance = member_expression.expression().clone();

        if is_geography {
            if member == *POLYGON_EXTERIOR_RING {
                return Some(SqlExpression::Function(SqlFunctionExpression::instance_call(
                    instance,
                    "RingN",
                    member_expression.clr_type(),
                    vec![SqlExpression::constant(Literal::Int32(1))],
                    type_mapping::find_mapping(
                        self.type_mapping_source.as_ref(),
                        &ILINESTRING,
                        store_type,
                    ),
                )));
            }

            if member == *POLYGON_NUM_INTERIOR_RINGS {
                let ring_count = SqlExpression::Function(SqlFunctionExpression::instance_call(
                    instance,
                    "NumRings",
                    member_expression.clr_type(),
                    Vec::new(),
                    None,
                ));
                return Some(SqlExpression::subtract(
                    ring_count,
                    SqlExpression::constant(Literal::Int32(1)),
                ));
            }

            return None;
        }

        let function_name = function_registry::polygon_geometry_function(&member)?;
        let result_type_mapping = if spatial_types::is_geometry(member_expression.clr_type()) {
            type_mapping::find_mapping(
                self.type_mapping_source.as_ref(),
                member_expression.clr_type(),
                store_type,
            )
        } else {
            None
        };

        Some(SqlExpression::Function(SqlFunctionExpression::instance_call(
            instance,
            function_name,
            member_expression.clr_type(),
            Vec::new(),
            result_type_mapping,
        )))
    }
}
