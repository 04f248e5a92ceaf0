//! Multi-radius buffer counts against call events.
//!
//! A call event is inside the buffer of radius `r` when its distance to
//! the query point is `<= r`, matching a buffer-then-contains test on the
//! boundary. Radii are nested, so counts never decrease as the radius
//! grows.

use rstar::RTree;
use site_map_geometry::MetricPoint;

use crate::{SpatialError, validate_radii};

/// Number of events inside the buffer of one radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusCount {
    /// Buffer radius in meters.
    pub radius_m: f64,
    /// Events at distance `<= radius_m`.
    pub count: u64,
}

/// Counts `events` inside each radius around `point` by brute force.
///
/// Results are returned in the order of `radii`. Each event's distance is
/// computed once, so the cost is `O(events + radii * events)` comparisons.
/// An empty event collection yields zero for every radius.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidRadius`] if any radius is not a
/// positive finite number.
pub fn count_within_radii(
    point: &MetricPoint,
    events: &[MetricPoint],
    radii: &[f64],
) -> Result<Vec<RadiusCount>, SpatialError> {
    validate_radii(radii)?;

    let squared: Vec<f64> = events
        .iter()
        .map(|event| {
            let dx = event.x() - point.x();
            let dy = event.y() - point.y();
            dx.mul_add(dx, dy * dy)
        })
        .collect();

    Ok(radii
        .iter()
        .map(|&radius_m| {
            let limit = radius_m * radius_m;
            RadiusCount {
                radius_m,
                count: squared.iter().filter(|d2| **d2 <= limit).count() as u64,
            }
        })
        .collect())
}

/// R-tree over call event locations.
///
/// Built once when the call layer is loaded and shared read-only by every
/// analysis afterwards.
pub struct CallIndex {
    tree: RTree<[f64; 2]>,
}

impl CallIndex {
    /// Bulk-loads an index from projected call locations.
    #[must_use]
    pub fn new(events: &[MetricPoint]) -> Self {
        let tree = RTree::bulk_load(events.iter().map(MetricPoint::coords).collect());
        log::debug!("Built call index with {} events", tree.size());
        Self { tree }
    }

    /// Number of indexed events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Counts events within `radius_m` (inclusive) of `point`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidRadius`] if `radius_m` is not a
    /// positive finite number.
    pub fn count_within(&self, point: &MetricPoint, radius_m: f64) -> Result<u64, SpatialError> {
        validate_radii(&[radius_m])?;
        Ok(self.count_unchecked(point, radius_m))
    }

    fn count_unchecked(&self, point: &MetricPoint, radius_m: f64) -> u64 {
        self.tree
            .locate_within_distance(point.coords(), radius_m * radius_m)
            .count() as u64
    }

    /// Indexed equivalent of [`count_within_radii`].
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidRadius`] if any radius is not a
    /// positive finite number.
    pub fn count_within_radii(
        &self,
        point: &MetricPoint,
        radii: &[f64],
    ) -> Result<Vec<RadiusCount>, SpatialError> {
        validate_radii(radii)?;

        Ok(radii
            .iter()
            .map(|&radius_m| RadiusCount {
                radius_m,
                count: self.count_unchecked(point, radius_m),
            })
            .collect())
    }
}
