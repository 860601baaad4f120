//! Tile-local line merging
//!
//! Runs once per (layer, zoom, tile) group, in tile pixel coordinates,
//! before the host writes the tile. Lines with identical attributes whose
//! endpoints touch are joined into longer lines, then short results are
//! dropped, the survivors simplified and detail far outside the tile cut
//! away. Clients render and label the joined lines far better than the
//! per-way fragments.

use std::fmt;

use geo::{Coord, Euclidean, Intersects, Length, LineString, Rect, Simplify};
use railway_common::{Error, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::config::MergeConfig;
use crate::feature::{Attributes, Feature, Geometry};

/// Identifies one tile group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub layer: String,
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.layer, self.zoom, self.x, self.y)
    }
}

/// Features the host assigned to one tile, geometry in tile pixels
#[derive(Debug, Clone)]
pub struct TileGroup {
    pub key: TileKey,
    pub features: Vec<Feature>,
}

/// Merge outcome for one tile group
#[derive(Debug)]
pub struct TileResult {
    pub key: TileKey,
    pub result: Result<Vec<Feature>>,
}

#[derive(Debug, Clone, Default)]
pub struct LineMerger {
    config: MergeConfig,
}

impl LineMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Post-process the features of one layer at one zoom level
    pub fn merge_layer(
        &self,
        layer: &str,
        zoom: u8,
        features: Vec<Feature>,
    ) -> Result<Vec<Feature>> {
        self.merge_labeled(&format!("{layer}/{zoom}"), features)
    }

    pub fn merge_tile(&self, group: TileGroup) -> TileResult {
        let result = self.merge_labeled(&group.key.to_string(), group.features);
        TileResult {
            key: group.key,
            result,
        }
    }

    pub fn merge(&self, features: Vec<Feature>) -> Result<Vec<Feature>> {
        self.merge_labeled("tile group", features)
    }

    /// Non-line features come first, unchanged and in input order, followed
    /// by one merged feature per attribute set in order of first appearance
    fn merge_labeled(&self, label: &str, features: Vec<Feature>) -> Result<Vec<Feature>> {
        let input = features.len();
        let mut output = Vec::with_capacity(input);
        let mut partitions: Vec<Vec<Feature>> = Vec::new();
        let mut index: FxHashMap<(String, Attributes), usize> = FxHashMap::default();

        for feature in features {
            if !feature.geometry.is_line() {
                output.push(feature);
                continue;
            }
            check_finite(label, &feature)?;

            let key = (feature.layer.clone(), feature.attrs.clone());
            let slot = *index.entry(key).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[slot].push(feature);
        }

        let partition_count = partitions.len();
        for partition in partitions {
            if let Some(merged) = self.merge_partition(partition) {
                output.push(merged);
            }
        }

        trace!(
            group = label,
            input,
            partitions = partition_count,
            output = output.len(),
            "merged line features"
        );
        Ok(output)
    }

    fn merge_partition(&self, mut partition: Vec<Feature>) -> Option<Feature> {
        let config = &self.config;
        if partition.len() == 1
            && config.buffer < 0.0
            && config.min_length <= 0.0
            && config.tolerance <= 0.0
        {
            return partition.pop();
        }

        let first = partition.first()?;
        let (layer, attrs, min_pixel_size) =
            (first.layer.clone(), first.attrs.clone(), first.min_pixel_size);
        let lines: Vec<LineString<f64>> = partition
            .into_iter()
            .flat_map(|f| f.geometry.into_lines())
            .filter_map(clean_line)
            .collect();

        let mut pieces = Vec::new();
        for mut line in self.join_and_prune(lines) {
            if line.0.len() > 2 && config.tolerance > 0.0 {
                line = line.simplify(&config.tolerance);
            }
            if !line.0.windows(2).any(|w| w[0] != w[1]) {
                continue;
            }
            if config.buffer >= 0.0 {
                self.trim_outside_tile(&line, &mut pieces);
            } else {
                pieces.push(line);
            }
        }

        Geometry::from_lines(pieces).map(|geometry| Feature {
            layer,
            geometry,
            attrs,
            min_pixel_size,
        })
    }

    /// Join touching lines and drop the short results, rejoining after every
    /// drop: removing a stub can turn a junction into a pass-through node.
    fn join_and_prune(&self, mut lines: Vec<LineString<f64>>) -> Vec<LineString<f64>> {
        loop {
            let joined = LineGraph::new(lines).join();
            let before = joined.len();
            let kept: Vec<LineString<f64>> = joined
                .into_iter()
                .filter(|line| line.length::<Euclidean>() >= self.config.min_length)
                .collect();
            if kept.len() == before {
                return kept;
            }
            lines = kept;
        }
    }

    /// Drop the parts of `line` that run entirely outside the buffered tile,
    /// splitting it where it leaves and re-enters
    fn trim_outside_tile(&self, line: &LineString<f64>, out: &mut Vec<LineString<f64>>) {
        let min = -self.config.buffer;
        let max = self.config.tile_extent + self.config.buffer;
        let tile = Rect::new(Coord { x: min, y: min }, Coord { x: max, y: max });

        let mut current: Vec<Coord<f64>> = Vec::new();
        let mut was_in = false;
        for segment in line.lines() {
            let now_in = segment.intersects(&tile);
            if now_in || was_in {
                current.push(segment.start);
            } else {
                self.flush_piece(&mut current, out);
            }
            was_in = now_in;
        }
        if was_in {
            if let Some(&last) = line.0.last() {
                current.push(last);
            }
        }
        self.flush_piece(&mut current, out);
    }

    /// Trimmed pieces obey the same length floor as whole lines, so merging
    /// the output again changes nothing
    fn flush_piece(&self, current: &mut Vec<Coord<f64>>, out: &mut Vec<LineString<f64>>) {
        let piece = LineString::new(std::mem::take(current));
        if piece.0.len() > 1 && piece.length::<Euclidean>() >= self.config.min_length {
            out.push(piece);
        }
    }
}

/// Merge every tile group in parallel.
///
/// Groups share nothing, so a group that fails only fails its own result.
pub fn merge_tiles(merger: &LineMerger, groups: Vec<TileGroup>) -> Vec<TileResult> {
    let results: Vec<TileResult> = groups
        .into_par_iter()
        .map(|group| merger.merge_tile(group))
        .collect();

    for tile in &results {
        if let Err(e) = &tile.result {
            warn!(tile = %tile.key, error = %e, "tile group merge failed");
        }
    }
    results
}

fn check_finite(label: &str, feature: &Feature) -> Result<()> {
    let finite = match &feature.geometry {
        Geometry::LineString(line) => line.0.iter().all(coord_is_finite),
        Geometry::MultiLineString(multi) => {
            multi.iter().flat_map(|l| l.0.iter()).all(coord_is_finite)
        }
        Geometry::Point(_) | Geometry::Polygon(_) => true,
    };
    if finite {
        Ok(())
    } else {
        Err(Error::DegenerateGeometry {
            group: label.to_string(),
            reason: format!("non-finite coordinate in a {} line", feature.layer),
        })
    }
}

fn coord_is_finite(c: &Coord<f64>) -> bool {
    c.x.is_finite() && c.y.is_finite()
}

/// Remove repeated vertices; lines left with fewer than two are zero-length
fn clean_line(mut line: LineString<f64>) -> Option<LineString<f64>> {
    line.0.dedup();
    (line.0.len() >= 2).then_some(line)
}

/// Endpoint identity, exact to the bit (with -0.0 folded into 0.0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey(u64, u64);

impl NodeKey {
    fn of(c: Coord<f64>) -> Self {
        // Adding 0.0 maps -0.0 to 0.0 and leaves everything else alone
        NodeKey((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Head,
    Tail,
}

impl End {
    fn opposite(self) -> Self {
        match self {
            End::Head => End::Tail,
            End::Tail => End::Head,
        }
    }
}

/// Lines as edges between their endpoints.
///
/// Joining only continues through nodes where exactly two line ends meet;
/// a junction of three or more ends every line touching it.
struct LineGraph {
    lines: Vec<Vec<Coord<f64>>>,
    incident: FxHashMap<NodeKey, Vec<(usize, End)>>,
}

impl LineGraph {
    fn new(lines: Vec<LineString<f64>>) -> Self {
        let lines: Vec<Vec<Coord<f64>>> = lines.into_iter().map(|line| line.0).collect();
        let mut incident: FxHashMap<NodeKey, Vec<(usize, End)>> = FxHashMap::default();
        for (i, line) in lines.iter().enumerate() {
            for end in [End::Head, End::Tail] {
                incident.entry(Self::endpoint(line, end)).or_default().push((i, end));
            }
        }
        Self { lines, incident }
    }

    fn endpoint(line: &[Coord<f64>], end: End) -> NodeKey {
        let c = match end {
            End::Head => line[0],
            End::Tail => line[line.len() - 1],
        };
        NodeKey::of(c)
    }

    fn degree(&self, line: usize, end: End) -> usize {
        self.incident
            .get(&Self::endpoint(&self.lines[line], end))
            .map_or(0, Vec::len)
    }

    fn join(self) -> Vec<LineString<f64>> {
        let mut visited = vec![false; self.lines.len()];
        let mut joined = Vec::new();

        for i in 0..self.lines.len() {
            if visited[i] {
                continue;
            }
            if self.degree(i, End::Head) != 2 {
                joined.push(LineString::new(self.walk(i, End::Head, &mut visited)));
            } else if self.degree(i, End::Tail) != 2 {
                // Walk in from the far end, then flip so line i keeps its direction
                let mut coords = self.walk(i, End::Tail, &mut visited);
                coords.reverse();
                joined.push(LineString::new(coords));
            }
        }

        // Whatever is left forms closed loops of pass-through nodes
        for i in 0..self.lines.len() {
            if !visited[i] {
                joined.push(LineString::new(self.walk(i, End::Head, &mut visited)));
            }
        }

        joined
    }

    /// Follow lines from `entry` of line `first` until a node that is not a
    /// pass-through, or until the loop closes
    fn walk(&self, first: usize, entry: End, visited: &mut [bool]) -> Vec<Coord<f64>> {
        let mut coords: Vec<Coord<f64>> = Vec::new();
        let (mut line, mut entry) = (first, entry);

        loop {
            visited[line] = true;
            let points = &self.lines[line];
            let skip = usize::from(!coords.is_empty());
            match entry {
                End::Head => coords.extend(points.iter().skip(skip).copied()),
                End::Tail => coords.extend(points.iter().rev().skip(skip).copied()),
            }

            let exit = entry.opposite();
            let Some(incident) = self.incident.get(&Self::endpoint(points, exit)) else {
                break;
            };
            if incident.len() != 2 {
                break;
            }
            let next = incident
                .iter()
                .copied()
                .find(|&(other, end)| (other, end) != (line, exit) && !visited[other]);
            match next {
                Some((other, end)) => {
                    line = other;
                    entry = end;
                }
                None => break,
            }
        }

        coords
    }
}
