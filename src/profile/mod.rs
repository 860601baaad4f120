//! Railway profile
//!
//! Relation preprocessing, per-element classification and emission, and the
//! parallel feature pass over a finished route cache.

pub mod classify;
pub mod emit;

use railway_common::Result;
use rayon::prelude::*;
use tracing::debug;

use crate::config::ProfileConfig;
use crate::element::Element;
use crate::feature::Feature;
use crate::merge::LineMerger;
use crate::relations::{RelationSource, RouteCache, RouteInfo};

pub use classify::{classify, DerivedAttributes};
pub use emit::emit;

/// Tag semantics for railway tiles
#[derive(Debug, Clone, Default)]
pub struct RailwayProfile {
    config: ProfileConfig,
}

impl RailwayProfile {
    pub fn new(config: ProfileConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Relation pass entry point: the route record to cache, if any
    pub fn preprocess_relation<R: RelationSource + ?Sized>(
        &self,
        relation: &R,
    ) -> Option<RouteInfo> {
        RouteInfo::from_relation(relation)
    }

    /// Feature pass entry point for one element
    pub fn process_feature<E: Element + ?Sized>(
        &self,
        element: &E,
        cache: &RouteCache,
    ) -> Vec<Feature> {
        emit(element, cache.routes_for(element.member_ref()), &self.config)
    }

    /// Merger configured for this profile's tile post-processing
    pub fn line_merger(&self) -> LineMerger {
        LineMerger::new(self.config.merge.clone())
    }
}

/// Feature pass over a completed route cache.
///
/// Borrowing the cache is what orders the passes: it can only exist once the
/// relation pass has been built into it, and nothing here can write to it.
#[derive(Debug, Clone, Copy)]
pub struct FeaturePass<'a> {
    profile: &'a RailwayProfile,
    cache: &'a RouteCache,
}

impl<'a> FeaturePass<'a> {
    pub fn new(profile: &'a RailwayProfile, cache: &'a RouteCache) -> Self {
        Self { profile, cache }
    }

    pub fn process<E: Element + ?Sized>(&self, element: &E) -> Vec<Feature> {
        self.profile.process_feature(element, self.cache)
    }

    /// Classify elements in parallel; output keeps input order
    pub fn process_all<E: Element + Sync>(&self, elements: &[E]) -> Vec<Feature> {
        let features: Vec<Feature> = elements
            .par_iter()
            .flat_map_iter(|element| self.process(element))
            .collect();

        debug!(
            elements = elements.len(),
            features = features.len(),
            "feature pass batch complete"
        );
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::SourceElement;
    use crate::feature::Geometry;
    use crate::relations::{Member, MemberKind, Relation, RouteCacheBuilder};
    use geo::line_string;
    use railway_common::TagMap;

    fn route(id: i64, route_ref: &str, ways: &[i64]) -> Relation {
        Relation {
            id,
            members: ways
                .iter()
                .map(|&ref_id| Member {
                    role: String::new(),
                    kind: MemberKind::Way,
                    ref_id,
                })
                .collect(),
            tags: TagMap::new()
                .with("type", "route")
                .with("route", "train")
                .with("ref", route_ref),
        }
    }

    fn rail(id: i64) -> SourceElement {
        SourceElement::way(
            id,
            TagMap::new().with("railway", "rail"),
            line_string![(x: 0.0, y: 0.0), (x: id as f64, y: 1.0)],
        )
    }

    #[test]
    fn test_process_uses_membership_order() {
        let profile = RailwayProfile::default();
        let mut builder = RouteCacheBuilder::new();
        builder.register(&route(1, "RE1", &[10, 11]));
        builder.register(&route(2, "RE2", &[11]));
        let cache = builder.build();
        let pass = FeaturePass::new(&profile, &cache);

        let only_first = pass.process(&rail(10));
        assert_eq!(only_first[0].attrs.get_str("relation_ref"), Some("RE1"));

        let both = pass.process(&rail(11));
        assert_eq!(both[0].attrs.get_str("relation_ref"), Some("RE2"));

        let none = pass.process(&rail(12));
        assert!(none[0].attrs.get("relation_ref").is_none());
    }

    #[test]
    fn test_process_all_keeps_order() {
        let profile = RailwayProfile::default();
        let cache = RouteCacheBuilder::new().build();
        let pass = FeaturePass::new(&profile, &cache);

        let elements: Vec<SourceElement> = (1..=100).map(rail).collect();
        let features = pass.process_all(&elements);

        assert_eq!(features.len(), 100);
        for (element, feature) in elements.iter().zip(&features) {
            assert_eq!(Some(feature.geometry.clone()), element.line().map(Geometry::LineString));
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ProfileConfig::default();
        config.merge.tolerance = f64::NAN;
        assert!(RailwayProfile::new(config).is_err());
    }

    #[test]
    fn test_custom_cutoff() {
        let mut config = ProfileConfig::default();
        config.construction_cutoff = "2031-01".to_string();
        let profile = RailwayProfile::new(config).unwrap();
        let cache = RouteCacheBuilder::new().build();

        let way = SourceElement::way(
            1,
            TagMap::new()
                .with("railway", "rail")
                .with("opening_date", "2030-12"),
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)],
        );
        let features = profile.process_feature(&way, &cache);
        assert_eq!(features[0].attrs.get_bool("construction"), Some(false));
        assert!(profile.preprocess_relation(&route(1, "S1", &[1])).is_some());
    }
}
