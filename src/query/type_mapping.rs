//! Type mappings
//!
//! A [`RelationalTypeMapping`] pairs a CLR type with the backend column type
//! used to read and write it. Translators attach one to function calls whose
//! result must be materialized as a geometry.

use std::fmt;

use crate::metadata::clr_type::primitives::{BOOLEAN, DECIMAL, DOUBLE, INT32, INT64, STRING};
use crate::metadata::ClrType;

use super::spatial_types;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalTypeMapping {
    clr_type: ClrType,
    store_type: String,
}

impl RelationalTypeMapping {
    pub fn new(clr_type: &ClrType, store_type: impl Into<String>) -> Self {
        RelationalTypeMapping {
            clr_type: clr_type.clone(),
            store_type: store_type.into(),
        }
    }

    pub fn clr_type(&self) -> &ClrType {
        &self.clr_type
    }

    pub fn store_type(&self) -> &str {
        &self.store_type
    }
}

impl fmt::Display for RelationalTypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.clr_type.short_display_name(), self.store_type)
    }
}

/// Resolves type mappings for the backend
pub trait TypeMappingSource: Send + Sync {
    /// Mapping for `clr_type` stored as `store_type_name`
    fn find_mapping(&self, clr_type: &ClrType, store_type_name: &str) -> Option<RelationalTypeMapping>;

    /// Mapping used when no store type is known
    fn find_default_mapping(&self, clr_type: &ClrType) -> Option<RelationalTypeMapping>;
}

/// Dispatch to [`TypeMappingSource::find_mapping`] or
/// [`TypeMappingSource::find_default_mapping`] depending on `store_type_name`
pub fn find_mapping(
    source: &dyn TypeMappingSource,
    clr_type: &ClrType,
    store_type_name: Option<&str>,
) -> Option<RelationalTypeMapping> {
    match store_type_name {
        Some(store_type_name) => source.find_mapping(clr_type, store_type_name),
        None => source.find_default_mapping(clr_type),
    }
}

/// SQL Server mappings for spatial types and common scalars
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerTypeMappingSource;

impl SqlServerTypeMappingSource {
    pub fn new() -> Self {
        SqlServerTypeMappingSource
    }

    fn scalar_store_type(clr_type: &ClrType) -> Option<&'static str> {
        let scalars: [(&ClrType, &'static str); 6] = [
            (&*INT32, "int"),
            (&*INT64, "bigint"),
            (&*DOUBLE, "float"),
            (&*DECIMAL, "decimal(18,2)"),
            (&*BOOLEAN, "bit"),
            (&*STRING, "nvarchar(max)"),
        ];
        scalars
            .into_iter()
            .find(|(scalar, _)| *scalar == clr_type)
            .map(|(_, store_type)| store_type)
    }
}

impl TypeMappingSource for SqlServerTypeMappingSource {
    fn find_mapping(&self, clr_type: &ClrType, store_type_name: &str) -> Option<RelationalTypeMapping> {
        if spatial_types::is_geometry(clr_type) {
            let store_type = ["geometry", "geography"]
                .into_iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(store_type_name))?;
            return Some(RelationalTypeMapping::new(clr_type, store_type));
        }
        Self::scalar_store_type(clr_type)
            .map(|_| RelationalTypeMapping::new(clr_type, store_type_name))
    }

    fn find_default_mapping(&self, clr_type: &ClrType) -> Option<RelationalTypeMapping> {
        if spatial_types::is_geometry(clr_type) {
            return Some(RelationalTypeMapping::new(clr_type, "geometry"));
        }
        Self::scalar_store_type(clr_type).map(|store_type| RelationalTypeMapping::new(clr_type, store_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::spatial_types::{ILINESTRING, POLYGON};
    use test_case::test_case;

    #[test_case("geography", "geography" ; "lower case")]
    #[test_case("GEOGRAPHY", "geography" ; "upper case")]
    #[test_case("Geometry", "geometry" ; "mixed case")]
    fn test_spatial_store_types(requested: &str, expected: &str) {
        let mapping = SqlServerTypeMappingSource
            .find_mapping(&ILINESTRING, requested)
            .unwrap();
        assert_eq!(mapping.store_type(), expected);
        assert_eq!(mapping.clr_type(), &*ILINESTRING);
    }

    #[test]
    fn test_unknown_spatial_store_type() {
        assert!(SqlServerTypeMappingSource
            .find_mapping(&POLYGON, "varbinary(max)")
            .is_none());
    }

    #[test]
    fn test_default_mappings() {
        let source = SqlServerTypeMappingSource;
        assert_eq!(
            find_mapping(&source, &POLYGON, None).unwrap().store_type(),
            "geometry"
        );
        assert_eq!(source.find_default_mapping(&INT32).unwrap().store_type(), "int");
        assert!(source
            .find_default_mapping(&ClrType::new("Shop", "Order"))
            .is_none());
    }
}
