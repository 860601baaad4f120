//! Pass orchestration
//!
//! Drives the three passes in order over in-memory inputs: relations into
//! the route cache, elements into features, then the host's tile groups
//! through the line merger. Hosts with their own driver can use
//! [`RouteCacheBuilder`], [`FeaturePass`] and [`merge_tiles`] directly.

use std::fmt;

use railway_common::{Error, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ProfileConfig;
use crate::element::Element;
use crate::feature::Feature;
use crate::merge::{merge_tiles, LineMerger, TileGroup, TileKey, TileResult};
use crate::profile::{FeaturePass, RailwayProfile};
use crate::relations::{RelationSource, RouteCache, RouteCacheBuilder};

/// Last pass the pipeline has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    RelationPass,
    FeaturePass,
    MergePass,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::RelationPass => "relation pass",
            Stage::FeaturePass => "feature pass",
            Stage::MergePass => "merge pass",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub relations: usize,
    pub routes: usize,
    pub elements: usize,
    pub features: usize,
    pub tile_groups: usize,
    pub failed_groups: usize,
    pub merged_features: usize,
}

/// Everything a full run produced
#[derive(Debug)]
pub struct PipelineOutput {
    /// Merged features per tile group, in the order the tiler produced them
    pub tiles: Vec<(TileKey, Vec<Feature>)>,
    pub failures: Vec<(TileKey, Error)>,
    pub stats: PipelineStats,
}

#[derive(Debug)]
pub struct Pipeline {
    profile: RailwayProfile,
    merger: LineMerger,
    stage: Stage,
    cache: Option<RouteCache>,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(profile: RailwayProfile) -> Self {
        let merger = profile.line_merger();
        Self {
            profile,
            merger,
            stage: Stage::Init,
            cache: None,
            stats: PipelineStats::default(),
        }
    }

    pub fn from_config(config: ProfileConfig) -> Result<Self> {
        Ok(Self::new(RailwayProfile::new(config)?))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// The route cache, once the relation pass has run
    pub fn cache(&self) -> Option<&RouteCache> {
        self.cache.as_ref()
    }

    fn require(&self, operation: &'static str, allowed: &[Stage]) -> Result<()> {
        if allowed.contains(&self.stage) {
            return Ok(());
        }
        Err(Error::StageOrder {
            operation,
            expected: allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or "),
            found: self.stage.to_string(),
        })
    }

    fn advance(&mut self, next: Stage) {
        if self.stage != next {
            info!(from = %self.stage, to = %next, "pipeline stage");
            self.stage = next;
        }
    }

    /// Build the route cache from every relation. Runs exactly once.
    pub fn run_relation_pass<R: RelationSource + Sync>(
        &mut self,
        relations: &[R],
    ) -> Result<usize> {
        self.require("relation pass", &[Stage::Init])?;

        let mut builder = RouteCacheBuilder::new();
        let routes = builder.register_all(relations);
        let cache = builder.build();

        self.stats.relations = relations.len();
        self.stats.routes = cache.len();
        self.cache = Some(cache);
        self.advance(Stage::RelationPass);

        info!(relations = relations.len(), routes, "relation pass complete");
        Ok(routes)
    }

    /// Classify a batch of elements; may be called once per batch
    pub fn run_feature_pass<E: Element + Sync>(&mut self, elements: &[E]) -> Result<Vec<Feature>> {
        self.require("feature pass", &[Stage::RelationPass, Stage::FeaturePass])?;
        let cache = self.cache.as_ref().ok_or_else(|| Error::StageOrder {
            operation: "feature pass",
            expected: Stage::RelationPass.to_string(),
            found: "no route cache".to_string(),
        })?;

        let features = FeaturePass::new(&self.profile, cache).process_all(elements);

        self.stats.elements += elements.len();
        self.stats.features += features.len();
        self.advance(Stage::FeaturePass);
        Ok(features)
    }

    /// Merge tile groups; may be called once per batch of groups
    pub fn run_merge_pass(&mut self, groups: Vec<TileGroup>) -> Result<Vec<TileResult>> {
        self.require("merge pass", &[Stage::FeaturePass, Stage::MergePass])?;
        self.advance(Stage::MergePass);

        let results = merge_tiles(&self.merger, groups);

        self.stats.tile_groups += results.len();
        for tile in &results {
            match &tile.result {
                Ok(features) => self.stats.merged_features += features.len(),
                Err(_) => self.stats.failed_groups += 1,
            }
        }
        debug!(groups = results.len(), "merge batch complete");
        Ok(results)
    }

    pub fn finish(&mut self) -> Result<PipelineStats> {
        self.require("finish", &[Stage::FeaturePass, Stage::MergePass])?;
        self.advance(Stage::Done);

        let stats = &self.stats;
        info!(
            routes = stats.routes,
            elements = stats.elements,
            features = stats.features,
            tile_groups = stats.tile_groups,
            failed_groups = stats.failed_groups,
            merged_features = stats.merged_features,
            "pipeline complete"
        );
        Ok(self.stats.clone())
    }

    /// Run all three passes; `tiler` stands in for the host's projection
    /// and tile assignment between the feature and merge passes
    pub fn run<R, E, F>(
        mut self,
        relations: &[R],
        elements: &[E],
        tiler: F,
    ) -> Result<PipelineOutput>
    where
        R: RelationSource + Sync,
        E: Element + Sync,
        F: FnOnce(Vec<Feature>) -> Vec<TileGroup>,
    {
        self.run_relation_pass(relations)?;
        let features = self.run_feature_pass(elements)?;
        let results = self.run_merge_pass(tiler(features))?;
        let stats = self.finish()?;

        let mut tiles = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for TileResult { key, result } in results {
            match result {
                Ok(features) => tiles.push((key, features)),
                Err(e) => failures.push((key, e)),
            }
        }

        Ok(PipelineOutput {
            tiles,
            failures,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::SourceElement;
    use crate::relations::{Member, MemberKind, Relation};
    use geo::line_string;
    use railway_common::TagMap;

    fn relations() -> Vec<Relation> {
        vec![Relation {
            id: 1,
            members: vec![Member {
                role: String::new(),
                kind: MemberKind::Way,
                ref_id: 10,
            }],
            tags: TagMap::new()
                .with("type", "route")
                .with("route", "subway")
                .with("ref", "U8"),
        }]
    }

    fn elements() -> Vec<SourceElement> {
        vec![SourceElement::way(
            10,
            TagMap::new().with("railway", "subway"),
            line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 3.0)],
        )]
    }

    fn one_tile(features: Vec<Feature>) -> Vec<TileGroup> {
        vec![TileGroup {
            key: TileKey {
                layer: "subway".to_string(),
                zoom: 12,
                x: 0,
                y: 0,
            },
            features,
        }]
    }

    #[test]
    fn test_feature_pass_before_relation_pass() {
        let mut pipeline = Pipeline::new(RailwayProfile::default());
        let err = pipeline.run_feature_pass(&elements()).unwrap_err();
        assert!(matches!(err, Error::StageOrder { operation: "feature pass", .. }));
        assert_eq!(pipeline.stage(), Stage::Init);
    }

    #[test]
    fn test_relation_pass_runs_once() {
        let mut pipeline = Pipeline::new(RailwayProfile::default());
        assert_eq!(pipeline.run_relation_pass(&relations()).unwrap(), 1);
        assert!(pipeline.run_relation_pass(&relations()).is_err());
        assert_eq!(pipeline.cache().map(RouteCache::len), Some(1));
    }

    #[test]
    fn test_merge_needs_features() {
        let mut pipeline = Pipeline::new(RailwayProfile::default());
        pipeline.run_relation_pass(&relations()).unwrap();
        let err = pipeline.run_merge_pass(Vec::new()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("merge pass requires feature pass or merge pass"));
        assert!(message.ends_with("pipeline is at relation pass"));
    }

    #[test]
    fn test_feature_pass_in_batches() {
        let mut pipeline = Pipeline::new(RailwayProfile::default());
        pipeline.run_relation_pass(&relations()).unwrap();
        pipeline.run_feature_pass(&elements()).unwrap();
        let features = pipeline.run_feature_pass(&elements()).unwrap();

        assert_eq!(features[0].attrs.get_str("relation_ref"), Some("U8"));
        assert_eq!(pipeline.stats().elements, 2);

        pipeline.run_merge_pass(one_tile(features)).unwrap();
        assert!(pipeline.run_feature_pass(&elements()).is_err());
    }

    #[test]
    fn test_finish_closes_pipeline() {
        let mut pipeline = Pipeline::new(RailwayProfile::default());
        pipeline.run_relation_pass(&relations()).unwrap();
        pipeline.run_feature_pass(&elements()).unwrap();
        let stats = pipeline.finish().unwrap();

        assert_eq!(stats.features, 1);
        assert_eq!(pipeline.stage(), Stage::Done);
        assert!(pipeline.run_merge_pass(Vec::new()).is_err());
    }

    #[test]
    fn test_run() {
        let output = Pipeline::new(RailwayProfile::default())
            .run(&relations(), &elements(), one_tile)
            .unwrap();

        assert!(output.failures.is_empty());
        assert_eq!(output.tiles.len(), 1);
        assert_eq!(output.tiles[0].1.len(), 1);
        assert_eq!(output.stats.routes, 1);
        assert_eq!(output.stats.merged_features, 1);
    }
}
