//! Nearest-feature distance against road and transit line networks.

use rstar::{AABB, PointDistance, RTree, RTreeObject, primitives::Line};
use site_map_geometry::{MetricLine, MetricPoint};

use crate::SpatialError;

/// Minimum distance in meters from `point` to any line in `network`.
///
/// Lines without vertices are ignored.
///
/// # Errors
///
/// Returns [`SpatialError::EmptyNetwork`] if `network` contains no line
/// with at least one vertex.
pub fn nearest_distance(point: &MetricPoint, network: &[MetricLine]) -> Result<f64, SpatialError> {
    network
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.distance_to(point))
        .min_by(f64::total_cmp)
        .ok_or(SpatialError::EmptyNetwork)
}

/// Result of an indexed nearest-feature lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestFeature {
    /// Index of the nearest line in the layer it was built from.
    pub line_index: usize,
    /// Distance in meters.
    pub distance_m: f64,
}

/// One straight segment of a network line stored in the R-tree.
struct SegmentEntry {
    line_index: usize,
    segment: Line<[f64; 2]>,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.segment.envelope()
    }
}

impl PointDistance for SegmentEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.segment.distance_2(point)
    }
}

/// R-tree over the segments of a line network.
///
/// Each line is split into its segments so the nearest-neighbor search
/// prunes on tight envelopes. A single-vertex line is stored as a
/// zero-length segment, which measures as a point.
pub struct NetworkIndex {
    tree: RTree<SegmentEntry>,
    lines: usize,
}

impl NetworkIndex {
    /// Bulk-loads an index from projected network lines.
    #[must_use]
    pub fn new(network: &[MetricLine]) -> Self {
        let mut entries = Vec::new();
        let mut lines = 0;

        for (line_index, line) in network.iter().enumerate() {
            let coords = &line.line_string().0;
            match coords.as_slice() {
                [] => continue,
                [only] => entries.push(SegmentEntry {
                    line_index,
                    segment: Line::new([only.x, only.y], [only.x, only.y]),
                }),
                _ => entries.extend(coords.windows(2).map(|pair| SegmentEntry {
                    line_index,
                    segment: Line::new([pair[0].x, pair[0].y], [pair[1].x, pair[1].y]),
                })),
            }
            lines += 1;
        }

        log::debug!(
            "Built network index with {lines} lines ({} segments)",
            entries.len()
        );

        Self {
            tree: RTree::bulk_load(entries),
            lines,
        }
    }

    /// Number of non-empty lines in the index.
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.lines
    }

    /// Number of indexed segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no line features.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Finds the nearest line to `point`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyNetwork`] if the index is empty.
    pub fn nearest(&self, point: &MetricPoint) -> Result<NearestFeature, SpatialError> {
        let query = point.coords();
        self.tree
            .nearest_neighbor(&query)
            .map(|entry| NearestFeature {
                line_index: entry.line_index,
                distance_m: entry.distance_2(&query).sqrt(),
            })
            .ok_or(SpatialError::EmptyNetwork)
    }

    /// Indexed equivalent of [`nearest_distance`].
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyNetwork`] if the index is empty.
    pub fn nearest_distance(&self, point: &MetricPoint) -> Result<f64, SpatialError> {
        self.nearest(point).map(|nearest| nearest.distance_m)
    }
}
