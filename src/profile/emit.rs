//! Feature emission
//!
//! Maps one classified element to the features it contributes. The rules
//! are independent of each other: a node tagged both as a railway stop and
//! as a public transport station yields two points.

use railway_common::Tags;
use tracing::warn;

use crate::config::ProfileConfig;
use crate::element::Element;
use crate::feature::{Attributes, Feature, Geometry};
use crate::profile::classify::{classify, line_attributes};
use crate::relations::RouteInfo;
use crate::resolve::resolve;

/// `railway=*` values emitted as line layers
pub const LINE_CATEGORIES: &[&str] = &[
    "rail",
    "subway",
    "light_rail",
    "construction",
    "funicular",
    "abandoned",
    "disused",
    "narrow_gauge",
    "monorail",
    "tram",
];

/// `railway=*` values emitted as point layers named after the value
pub const POINT_CATEGORIES: &[&str] = &[
    "signal",
    "switch",
    "crossing",
    "level_crossing",
    "railway_crossing",
    "tram_level_crossing",
    "tram_stop",
    "subway_entrance",
    "stop",
];

pub const STATION_LAYER: &str = "station";
pub const PLATFORM_LINE_LAYER: &str = "platforms_line";
pub const PLATFORM_POLYGON_LAYER: &str = "platforms";

/// Emit every feature `element` contributes, given its routes in membership order
pub fn emit<'a, E, I>(element: &E, routes: I, config: &ProfileConfig) -> Vec<Feature>
where
    E: Element + ?Sized,
    I: IntoIterator<Item = &'a RouteInfo>,
{
    let mut features = Vec::new();

    if element.can_be_line() && element.has_tag("railway", LINE_CATEGORIES) {
        let resolved = resolve(routes);
        let derived = classify(element, &config.construction_cutoff);
        if let Some(line) = geometry_or_warn(element, "line", element.line()) {
            features.push(
                Feature::new(
                    derived.railway_category.clone(),
                    Geometry::LineString(line),
                    config.line_min_pixel_size,
                )
                .with_attrs(line_attributes(&resolved, &derived)),
            );
        }
    }

    if element.is_point() {
        if let Some(railway) = element.get_str("railway") {
            if POINT_CATEGORIES.contains(&railway) {
                push_named_point(&mut features, element, railway, config);
            }
        }
        if element.has_tag("public_transport", &["station"]) {
            push_named_point(&mut features, element, STATION_LAYER, config);
        }
    }

    if element.has_tag("railway", &["platform"]) {
        let attrs = Attributes::new().with("subway", element.get_string("subway"));
        let geometry = if element.can_be_line() && !element.can_be_polygon() {
            geometry_or_warn(element, "line", element.line())
                .map(|line| (PLATFORM_LINE_LAYER, Geometry::LineString(line)))
        } else if element.can_be_polygon() {
            geometry_or_warn(element, "polygon", element.polygon())
                .map(|polygon| (PLATFORM_POLYGON_LAYER, Geometry::Polygon(polygon)))
        } else {
            None
        };
        if let Some((layer, geometry)) = geometry {
            features.push(
                Feature::new(layer, geometry, config.default_min_pixel_size).with_attrs(attrs),
            );
        }
    }

    features
}

fn push_named_point<E: Element + ?Sized>(
    features: &mut Vec<Feature>,
    element: &E,
    layer: &str,
    config: &ProfileConfig,
) {
    if let Some(point) = geometry_or_warn(element, "point", element.point()) {
        features.push(
            Feature::new(layer, Geometry::Point(point), config.default_min_pixel_size)
                .with_attrs(Attributes::new().with("name", element.get_string("name"))),
        );
    }
}

/// The element claimed a capability but the host could not build it; the
/// feature is skipped and the rest of the element still emits
fn geometry_or_warn<E: Element + ?Sized, G>(
    element: &E,
    kind: &str,
    geometry: Option<G>,
) -> Option<G> {
    if geometry.is_none() {
        let member = element.member_ref();
        warn!(
            kind = ?member.kind,
            id = member.id,
            geometry = kind,
            "element has no usable geometry, skipping feature"
        );
    }
    geometry
}
