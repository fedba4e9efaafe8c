//! Well-known spatial CLR types
//!
//! The capability interfaces (`IGeometry`, `IPolygon`, ...) and the concrete
//! geometry classes implementing them. Translators match members against the
//! interfaces, so a member read through a concrete class is mapped back with
//! [`MemberInfo::on_interface`](crate::metadata::MemberInfo::on_interface).

use lazy_static::lazy_static;

use crate::metadata::clr_type::primitives::{DOUBLE, INT32};
use crate::metadata::ClrType;

const INTERFACE_NAMESPACE: &str = "GeoAPI.Geometries";
const CLASS_NAMESPACE: &str = "NetTopologySuite.Geometries";

lazy_static! {
    pub static ref IGEOMETRY: ClrType = ClrType::builder(INTERFACE_NAMESPACE, "IGeometry")
        .interface()
        .build();
    pub static ref IPOINT: ClrType = ClrType::builder(INTERFACE_NAMESPACE, "IPoint")
        .interface()
        .implements(&IGEOMETRY)
        .property("X", &DOUBLE)
        .property("Y", &DOUBLE)
        .property("Z", &DOUBLE)
        .property("M", &DOUBLE)
        .build();
    pub static ref ICURVE: ClrType = ClrType::builder(INTERFACE_NAMESPACE, "ICurve")
        .interface()
        .implements(&IGEOMETRY)
        .build();
    pub static ref ILINESTRING: ClrType = ClrType::builder(INTERFACE_NAMESPACE, "ILineString")
        .interface()
        .implements(&ICURVE)
        .property("Count", &INT32)
        .build();
    pub static ref ILINEARRING: ClrType = ClrType::builder(INTERFACE_NAMESPACE, "ILinearRing")
        .interface()
        .implements(&ILINESTRING)
        .build();
    pub static ref ISURFACE: ClrType = ClrType::builder(INTERFACE_NAMESPACE, "ISurface")
        .interface()
        .implements(&IGEOMETRY)
        .build();
    pub static ref IPOLYGON: ClrType = ClrType::builder(INTERFACE_NAMESPACE, "IPolygon")
        .interface()
        .implements(&ISURFACE)
        .property("ExteriorRing", &ILINESTRING)
        .property("NumInteriorRings", &INT32)
        .build();

    pub static ref GEOMETRY: ClrType = ClrType::builder(CLASS_NAMESPACE, "Geometry")
        .implements(&IGEOMETRY)
        .build();
    pub static ref POINT: ClrType = ClrType::builder(CLASS_NAMESPACE, "Point")
        .base_type(&GEOMETRY)
        .implements(&IPOINT)
        .property("X", &DOUBLE)
        .property("Y", &DOUBLE)
        .property("Z", &DOUBLE)
        .property("M", &DOUBLE)
        .build();
    pub static ref LINE_STRING: ClrType = ClrType::builder(CLASS_NAMESPACE, "LineString")
        .base_type(&GEOMETRY)
        .implements(&ILINESTRING)
        .property("Count", &INT32)
        .build();
    pub static ref POLYGON: ClrType = ClrType::builder(CLASS_NAMESPACE, "Polygon")
        .base_type(&GEOMETRY)
        .implements(&IPOLYGON)
        .property("ExteriorRing", &ILINESTRING)
        .property("NumInteriorRings", &INT32)
        .build();
}

/// Look up a spatial type by its short name, ignoring case
/// (`polygon`, `IPolygon`, `LineString`, ...)
pub fn find_by_name(name: &str) -> Option<&'static ClrType> {
    let all: [&'static ClrType; 11] = [
        &*IGEOMETRY,
        &*IPOINT,
        &*ICURVE,
        &*ILINESTRING,
        &*ILINEARRING,
        &*ISURFACE,
        &*IPOLYGON,
        &*GEOMETRY,
        &*POINT,
        &*LINE_STRING,
        &*POLYGON,
    ];
    all.into_iter().find(|t| t.name().eq_ignore_ascii_case(name))
}

/// Whether values of `clr_type` are geometries
pub fn is_geometry(clr_type: &ClrType) -> bool {
    IGEOMETRY.is_assignable_from(clr_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_hierarchy() {
        assert!(IPOLYGON.is_assignable_from(&POLYGON));
        assert!(IGEOMETRY.is_assignable_from(&POLYGON));
        assert!(!IPOLYGON.is_assignable_from(&POINT));
        assert!(is_geometry(&ILINEARRING));
        assert!(!is_geometry(&INT32));
    }

    #[test]
    fn test_find_by_name() {
        assert_eq!(find_by_name("polygon"), Some(&*POLYGON));
        assert_eq!(find_by_name("IPoint"), Some(&*IPOINT));
        assert_eq!(find_by_name("circle"), None);
    }
}
