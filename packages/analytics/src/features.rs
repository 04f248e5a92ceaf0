//! Feature vector assembly and the full per-point analysis pipeline.

use site_map_analytics_models::{Cluster, FeatureVector, PROXIMITY_RADII_M};
use site_map_geometry::{GeoPoint, MetricPoint};
use site_map_spatial::{CallIndex, NetworkIndex, SpatialError};

use crate::AnalyticsError;
use crate::classifier::{FittedModel, classify_features};

/// Measures the six model features for a projected point.
///
/// Call counts are taken at [`PROXIMITY_RADII_M`] against `calls`, then the
/// nearest distance to `transit`, then to `roads`. This order is the order
/// the clustering model was fitted on and must not change.
///
/// # Errors
///
/// Returns [`SpatialError::EmptyNetwork`] if either network is empty.
pub fn build_feature_vector(
    point: &MetricPoint,
    calls: &CallIndex,
    roads: &NetworkIndex,
    transit: &NetworkIndex,
) -> Result<FeatureVector, SpatialError> {
    let radius_counts = calls.count_within_radii(point, &PROXIMITY_RADII_M)?;
    let mut counts = [0u64; 4];
    for (slot, radius_count) in counts.iter_mut().zip(&radius_counts) {
        *slot = radius_count.count;
    }

    let transit_distance = transit.nearest_distance(point)?;
    let road_distance = roads.nearest_distance(point)?;

    Ok(FeatureVector::new(counts, transit_distance, road_distance))
}

/// Features and predicted cluster for one analyzed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointAnalysis {
    pub features: FeatureVector,
    pub cluster: Cluster,
}

/// Computes the analysis for a geographic point that is not in the catalog.
///
/// [`crate::ClickOrchestrator`] depends on this trait rather than on
/// [`AnalysisPipeline`] directly so the expensive path can be observed or
/// substituted.
pub trait PointAnalyzer {
    /// Runs projection, measurement and classification for `point`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if any stage fails.
    fn analyze(&self, point: GeoPoint) -> Result<PointAnalysis, AnalyticsError>;
}

impl<T: PointAnalyzer + ?Sized> PointAnalyzer for &T {
    fn analyze(&self, point: GeoPoint) -> Result<PointAnalysis, AnalyticsError> {
        (**self).analyze(point)
    }
}

/// The standard analysis pipeline over loaded reference layers.
#[derive(Clone, Copy)]
pub struct AnalysisPipeline<'a> {
    calls: &'a CallIndex,
    roads: &'a NetworkIndex,
    transit: &'a NetworkIndex,
    model: &'a FittedModel,
}

impl<'a> AnalysisPipeline<'a> {
    #[must_use]
    pub const fn new(
        calls: &'a CallIndex,
        roads: &'a NetworkIndex,
        transit: &'a NetworkIndex,
        model: &'a FittedModel,
    ) -> Self {
        Self {
            calls,
            roads,
            transit,
            model,
        }
    }
}

impl PointAnalyzer for AnalysisPipeline<'_> {
    fn analyze(&self, point: GeoPoint) -> Result<PointAnalysis, AnalyticsError> {
        let metric = point.to_metric()?;
        let features = build_feature_vector(&metric, self.calls, self.roads, self.transit)?;
        let cluster = classify_features(&features, self.model)?;

        log::debug!("Analyzed {point}: {features:?} -> cluster {cluster}");

        Ok(PointAnalysis { features, cluster })
    }
}
