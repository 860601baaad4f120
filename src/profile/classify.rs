//! Derived railway attributes
//!
//! Turns raw way tags into the categorical and boolean attributes the line
//! layers are styled by. Every function here is total: a missing tag gives
//! an absent or false attribute, never an error.

use railway_common::Tags;

use crate::feature::Attributes;
use crate::resolve::ResolvedAttributes;

/// `service=*` values marking secondary track
pub const SERVICE_VALUES: &[&str] = &["yard", "spur", "siding", "crossover"];

/// Tags copied verbatim onto line features
pub const PASS_THROUGH_TAGS: &[&str] = &[
    "electrified",
    "tunnel",
    "bridge",
    "voltage",
    "frequency",
    "maxspeed",
    "highspeed",
    "subway",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedAttributes {
    pub construction: bool,
    /// Layer the line is emitted into
    pub railway_category: String,
    pub service: bool,
    pub branch: bool,
    pub mainline: bool,
    pub electrified: Option<String>,
    pub tunnel: Option<String>,
    pub bridge: Option<String>,
    pub voltage: Option<String>,
    pub frequency: Option<String>,
    pub maxspeed: Option<String>,
    pub highspeed: Option<String>,
    pub subway: Option<String>,
}

/// `railway=construction`, or an `opening_date` sorting after `cutoff`.
///
/// Plain string comparison: only correct for zero-padded `YYYY-MM` and
/// `YYYY-MM-DD` dates, which is what the data carries.
pub fn is_construction<T: Tags + ?Sized>(tags: &T, cutoff: &str) -> bool {
    tags.has_tag("railway", &["construction"])
        || tags.get_str("opening_date").unwrap_or("") > cutoff
}

pub fn classify<T: Tags + ?Sized>(tags: &T, cutoff: &str) -> DerivedAttributes {
    let construction = is_construction(tags, cutoff);

    // Lines under construction are filed under what they will become
    let category_key = if construction { "construction" } else { "railway" };

    DerivedAttributes {
        construction,
        railway_category: tags.get_str(category_key).unwrap_or("").to_string(),
        service: tags.has_tag("service", SERVICE_VALUES),
        branch: tags.has_tag("usage", &["branch"]),
        mainline: tags.has_tag("usage", &["main"]),
        electrified: tags.get_string("electrified"),
        tunnel: tags.get_string("tunnel"),
        bridge: tags.get_string("bridge"),
        voltage: tags.get_string("voltage"),
        frequency: tags.get_string("frequency"),
        maxspeed: tags.get_string("maxspeed"),
        highspeed: tags.get_string("highspeed"),
        subway: tags.get_string("subway"),
    }
}

/// Full attribute map of a railway line feature
pub fn line_attributes(resolved: &ResolvedAttributes, derived: &DerivedAttributes) -> Attributes {
    let mut attrs = Attributes::new();
    attrs
        .set("relation_name", resolved.name.clone())
        .set("relation_ref", resolved.route_ref.clone())
        .set("relation_colour", resolved.colour.clone())
        .set("relation_network", resolved.network.clone())
        .set("construction", Some(derived.construction))
        .set("service", Some(derived.service))
        .set("electrified", derived.electrified.clone())
        .set("tunnel", derived.tunnel.clone())
        .set("bridge", derived.bridge.clone())
        .set("voltage", derived.voltage.clone())
        .set("frequency", derived.frequency.clone())
        .set("maxspeed", derived.maxspeed.clone())
        .set("branch", Some(derived.branch))
        .set("mainline", Some(derived.mainline))
        .set("highspeed", derived.highspeed.clone())
        .set("subway", derived.subway.clone());
    attrs
}
