//! Output features: a layer name, a geometry and an attribute map

use std::collections::BTreeMap;

use geo::{LineString, MultiLineString, Point, Polygon};
use serde::Serialize;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Str(String),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

/// Attribute map of a feature.
///
/// Setting an absent value leaves the key out entirely, so two features only
/// compare equal when they carry exactly the same keys and values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<V: Into<AttrValue>>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        match value {
            Some(v) => {
                self.0.insert(key.to_string(), v.into());
            }
            None => {
                self.0.remove(key);
            }
        }
        self
    }

    /// Builder-style [`Attributes::set`]
    pub fn with<V: Into<AttrValue>>(mut self, key: &str, value: Option<V>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            AttrValue::Str(s) => Some(s),
            AttrValue::Bool(_) => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            AttrValue::Bool(b) => Some(*b),
            AttrValue::Str(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Geometry carried by a feature, in whatever coordinate space the host
/// works in at that stage (world coordinates after emission, tile pixels
/// during the merge pass)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    MultiLineString(MultiLineString<f64>),
    Polygon(Polygon<f64>),
}

impl Geometry {
    pub fn is_line(&self) -> bool {
        matches!(self, Geometry::LineString(_) | Geometry::MultiLineString(_))
    }

    /// Wrap merged pieces: one piece stays a plain linestring
    pub fn from_lines(mut lines: Vec<LineString<f64>>) -> Option<Geometry> {
        match lines.len() {
            0 => None,
            1 => lines.pop().map(Geometry::LineString),
            _ => Some(Geometry::MultiLineString(MultiLineString::new(lines))),
        }
    }

    /// Split into individual linestrings; empty for non-line geometry
    pub fn into_lines(self) -> Vec<LineString<f64>> {
        match self {
            Geometry::LineString(line) => vec![line],
            Geometry::MultiLineString(multi) => multi.0,
            Geometry::Point(_) | Geometry::Polygon(_) => Vec::new(),
        }
    }
}

/// A classified map feature destined for one output layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub layer: String,
    pub geometry: Geometry,
    pub attrs: Attributes,
    /// Features smaller than this many pixels may be dropped by the tiler;
    /// 0 asks it to keep everything
    pub min_pixel_size: f64,
}

impl Feature {
    pub fn new(layer: impl Into<String>, geometry: Geometry, min_pixel_size: f64) -> Self {
        Self {
            layer: layer.into(),
            geometry,
            attrs: Attributes::new(),
            min_pixel_size,
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Same layer and attributes on a new geometry
    pub fn with_geometry(&self, geometry: Geometry) -> Self {
        Self {
            layer: self.layer.clone(),
            geometry,
            attrs: self.attrs.clone(),
            min_pixel_size: self.min_pixel_size,
        }
    }
}
