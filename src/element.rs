//! Elements handed to the feature pass

use geo::{LineString, Point, Polygon};
use railway_common::{TagMap, Tags};

use crate::relations::MemberRef;

/// A tagged node, way or area as the host hands it to the feature pass.
///
/// The capability flags decide which emission rules apply; a geometry
/// accessor is only called for a capability the element claims.
pub trait Element: Tags {
    /// Identity used to look up the element's route memberships
    fn member_ref(&self) -> MemberRef;

    fn is_point(&self) -> bool;
    fn can_be_line(&self) -> bool;
    fn can_be_polygon(&self) -> bool;

    fn point(&self) -> Option<Point<f64>>;
    fn line(&self) -> Option<LineString<f64>>;
    fn polygon(&self) -> Option<Polygon<f64>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceGeometry {
    Point(Point<f64>),
    /// Node sequence of a way; closed when first and last coincide
    Way(LineString<f64>),
}

/// Owned element for hosts without their own record type.
///
/// Open ways are lines only. Closed ways are both lines and polygons unless
/// `area=yes` (polygon only) or `area=no` (line only).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceElement {
    pub member: MemberRef,
    pub tags: TagMap,
    pub geometry: SourceGeometry,
}

impl SourceElement {
    pub fn node(id: i64, tags: TagMap, point: Point<f64>) -> Self {
        Self {
            member: MemberRef::node(id),
            tags,
            geometry: SourceGeometry::Point(point),
        }
    }

    pub fn way(id: i64, tags: TagMap, line: LineString<f64>) -> Self {
        Self {
            member: MemberRef::way(id),
            tags,
            geometry: SourceGeometry::Way(line),
        }
    }

    fn way_line(&self) -> Option<&LineString<f64>> {
        match &self.geometry {
            SourceGeometry::Way(line) if line.0.len() >= 2 => Some(line),
            _ => None,
        }
    }

    fn is_closed_ring(&self) -> bool {
        self.way_line()
            .is_some_and(|line| line.0.len() >= 4 && line.is_closed())
    }
}

impl Tags for SourceElement {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.tags.get_str(key)
    }
}

impl Element for SourceElement {
    fn member_ref(&self) -> MemberRef {
        self.member
    }

    fn is_point(&self) -> bool {
        matches!(self.geometry, SourceGeometry::Point(_))
    }

    fn can_be_line(&self) -> bool {
        if self.way_line().is_none() {
            return false;
        }
        !self.is_closed_ring() || !self.tags.has_tag("area", &["yes"])
    }

    fn can_be_polygon(&self) -> bool {
        self.is_closed_ring() && !self.tags.has_tag("area", &["no"])
    }

    fn point(&self) -> Option<Point<f64>> {
        match self.geometry {
            SourceGeometry::Point(point) => Some(point),
            SourceGeometry::Way(_) => None,
        }
    }

    fn line(&self) -> Option<LineString<f64>> {
        self.way_line().cloned()
    }

    fn polygon(&self) -> Option<Polygon<f64>> {
        if !self.is_closed_ring() {
            return None;
        }
        self.way_line()
            .map(|ring| Polygon::new(ring.clone(), Vec::new()))
    }
}
