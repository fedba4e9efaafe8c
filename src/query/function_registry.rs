//! Spatial member to SQL Server function tables
//!
//! Keys are members of the capability interfaces; translators map a member
//! onto its interface before looking it up.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::metadata::clr_type::primitives::{DOUBLE, INT32};
use crate::metadata::MemberInfo;

use super::spatial_types::{ILINESTRING, IPOINT, IPOLYGON};

lazy_static! {
    pub static ref POLYGON_EXTERIOR_RING: MemberInfo =
        MemberInfo::new(&IPOLYGON, "ExteriorRing", &ILINESTRING);
    pub static ref POLYGON_NUM_INTERIOR_RINGS: MemberInfo =
        MemberInfo::new(&IPOLYGON, "NumInteriorRings", &INT32);

    pub static ref POINT_X: MemberInfo = MemberInfo::new(&IPOINT, "X", &DOUBLE);
    pub static ref POINT_Y: MemberInfo = MemberInfo::new(&IPOINT, "Y", &DOUBLE);
    pub static ref POINT_Z: MemberInfo = MemberInfo::new(&IPOINT, "Z", &DOUBLE);
    pub static ref POINT_M: MemberInfo = MemberInfo::new(&IPOINT, "M", &DOUBLE);

    // Planar polygon members; the geography variants need arithmetic and are
    // handled by the translator itself
    static ref POLYGON_GEOMETRY_FUNCTIONS: HashMap<MemberInfo, &'static str> = {
        let mut m = HashMap::new();
        m.insert(POLYGON_EXTERIOR_RING.clone(), "STExteriorRing");
        m.insert(POLYGON_NUM_INTERIOR_RINGS.clone(), "STNumInteriorRing");
        m
    };

    static ref POINT_GEOMETRY_PROPERTIES: HashMap<MemberInfo, &'static str> = {
        let mut m = HashMap::new();
        m.insert(POINT_X.clone(), "STX");
        m.insert(POINT_Y.clone(), "STY");
        m.insert(POINT_Z.clone(), "Z");
        m.insert(POINT_M.clone(), "M");
        m
    };

    // geography points expose longitude and latitude instead of X and Y
    static ref POINT_GEOGRAPHY_PROPERTIES: HashMap<MemberInfo, &'static str> = {
        let mut m = HashMap::new();
        m.insert(POINT_X.clone(), "Long");
        m.insert(POINT_Y.clone(), "Lat");
        m.insert(POINT_Z.clone(), "Z");
        m.insert(POINT_M.clone(), "M");
        m
    };
}

/// Function for a polygon member on a `geometry` column
pub fn polygon_geometry_function(member: &MemberInfo) -> Option<&'static str> {
    POLYGON_GEOMETRY_FUNCTIONS.get(member).copied()
}

/// Property accessor for a point member, by store type
pub fn point_property(member: &MemberInfo, is_geography: bool) -> Option<&'static str> {
    let table = if is_geography {
        &*POINT_GEOGRAPHY_PROPERTIES
    } else {
        &*POINT_GEOMETRY_PROPERTIES
    };
    table.get(member).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::spatial_types::POLYGON;

    #[test]
    fn test_polygon_lookup_requires_interface_member() {
        assert_eq!(
            polygon_geometry_function(&POLYGON_EXTERIOR_RING),
            Some("STExteriorRing")
        );

        let on_class = POLYGON.member("ExteriorRing").unwrap();
        assert_eq!(polygon_geometry_function(&on_class), None);
        assert_eq!(
            polygon_geometry_function(&on_class.on_interface(&IPOLYGON)),
            Some("STExteriorRing")
        );
    }

    #[test]
    fn test_point_properties_by_store_type() {
        assert_eq!(point_property(&POINT_X, false), Some("STX"));
        assert_eq!(point_property(&POINT_X, true), Some("Long"));
        assert_eq!(point_property(&POINT_Y, true), Some("Lat"));
        assert_eq!(point_property(&POINT_M, true), Some("M"));
    }
}
