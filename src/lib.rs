//! # railway-tiles
//!
//! Railway profile for OpenStreetMap vector tiles.
//!
//! A tiling host reads the planet, projects and clips geometry, and writes
//! tiles. This crate supplies the railway semantics in between, as three
//! passes:
//!
//! 1. **Relation pass**: route relations are collected into a [`RouteCache`].
//! 2. **Feature pass**: each node, way or area is classified against its
//!    tags and the routes it belongs to, and emitted as [`Feature`]s.
//! 3. **Merge pass**: per tile group, touching lines with identical
//!    attributes are joined, filtered, simplified and trimmed.
//!
//! ```no_run
//! use railway_tiles::{Pipeline, ProfileConfig};
//!
//! # fn main() -> railway_tiles::Result<()> {
//! let config: ProfileConfig = "[merge]\nbuffer = 8.0".parse()?;
//! let pipeline = Pipeline::from_config(config)?;
//! # let _ = pipeline;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod element;
pub mod feature;
pub mod merge;
pub mod pipeline;
pub mod profile;
pub mod relations;
pub mod resolve;

pub use config::{MergeConfig, ProfileConfig};
pub use element::{Element, SourceElement, SourceGeometry};
pub use feature::{AttrValue, Attributes, Feature, Geometry};
pub use merge::{merge_tiles, LineMerger, TileGroup, TileKey, TileResult};
pub use pipeline::{Pipeline, PipelineOutput, PipelineStats, Stage};
pub use profile::{FeaturePass, RailwayProfile};
pub use relations::{
    Member, MemberKind, MemberRef, Relation, RelationSource, RouteCache, RouteCacheBuilder,
    RouteInfo, RouteKind,
};
pub use resolve::{resolve, ResolvedAttributes};

pub use railway_common::{Error, Result, TagMap, Tags};
