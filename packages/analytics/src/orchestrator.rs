//! Click handling: catalogued-site lookup, novel-point analysis and
//! suppression of repeated identical clicks.

use site_map_analytics_models::{AnalysisResult, DEFAULT_MATCH_TOLERANCE_DEG};
use site_map_geometry::GeoPoint;

use crate::AnalyticsError;
use crate::catalog::SiteCatalog;
use crate::features::PointAnalyzer;

const KEY_SCALE: f64 = 1e6;

/// Identity of a click, rounded to six decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClickKey {
    lat_e6: i64,
    lon_e6: i64,
}

impl ClickKey {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(point: GeoPoint) -> Self {
        Self {
            lat_e6: (point.lat * KEY_SCALE).round() as i64,
            lon_e6: (point.lon * KEY_SCALE).round() as i64,
        }
    }
}

impl From<GeoPoint> for ClickKey {
    fn from(point: GeoPoint) -> Self {
        Self::new(point)
    }
}

/// Memory of the most recent successful click.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClickState {
    last_click: Option<ClickKey>,
    last_result: Option<AnalysisResult>,
}

impl ClickState {
    #[must_use]
    pub const fn last_click(&self) -> Option<ClickKey> {
        self.last_click
    }

    #[must_use]
    pub const fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    fn remember(&mut self, key: ClickKey, result: AnalysisResult) {
        self.last_click = Some(key);
        self.last_result = Some(result);
    }

    fn cached(&self, key: ClickKey) -> Option<AnalysisResult> {
        match (self.last_click, self.last_result) {
            (Some(last), Some(result)) if last == key => Some(result),
            _ => None,
        }
    }

    /// Forgets the last click and its result.
    pub const fn clear(&mut self) {
        self.last_click = None;
        self.last_result = None;
    }
}

/// Outcome of one click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickOutcome {
    pub result: AnalysisResult,
    /// `true` when the click repeated the previous one and no work was done.
    pub reused: bool,
}

/// Routes clicks either to the site catalog or to the analysis pipeline.
pub struct ClickOrchestrator<'a, A: PointAnalyzer> {
    catalog: &'a SiteCatalog,
    analyzer: A,
    tolerance_deg: f64,
    state: ClickState,
}

impl<'a, A: PointAnalyzer> ClickOrchestrator<'a, A> {
    #[must_use]
    pub fn new(catalog: &'a SiteCatalog, analyzer: A) -> Self {
        Self {
            catalog,
            analyzer,
            tolerance_deg: DEFAULT_MATCH_TOLERANCE_DEG,
            state: ClickState::default(),
        }
    }

    /// Overrides the site match tolerance in degrees.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance_deg: f64) -> Self {
        self.tolerance_deg = tolerance_deg;
        self
    }

    /// Resumes from a previously saved click state.
    #[must_use]
    pub const fn with_state(mut self, state: ClickState) -> Self {
        self.state = state;
        self
    }

    /// Consumes the orchestrator, returning its click state.
    #[must_use]
    pub fn into_state(self) -> ClickState {
        self.state
    }

    #[must_use]
    pub const fn last_result(&self) -> Option<&AnalysisResult> {
        self.state.last_result()
    }

    pub const fn clear_selection(&mut self) {
        self.state.clear();
    }

    /// Produces the analysis result for a clicked coordinate.
    ///
    /// A click identical (at six decimals) to the previous successful one
    /// returns the cached result without touching the catalog or the
    /// analyzer. Otherwise a catalogued site within the tolerance is
    /// returned as-is, and any other point goes through the analyzer.
    ///
    /// # Errors
    ///
    /// * [`AnalyticsError::InvalidClick`] if the coordinate is not finite
    /// * any error raised by the analyzer
    ///
    /// On error the click state is cleared.
    pub fn handle_click(&mut self, point: GeoPoint) -> Result<ClickOutcome, AnalyticsError> {
        if !point.is_finite() {
            self.state.clear();
            return Err(AnalyticsError::InvalidClick {
                lat: point.lat,
                lon: point.lon,
            });
        }

        let key = ClickKey::new(point);
        if let Some(result) = self.state.cached(key) {
            log::debug!("Repeated click at {point}, reusing previous result");
            return Ok(ClickOutcome {
                result,
                reused: true,
            });
        }

        let result = if let Some(site) = self.catalog.find_match(point, self.tolerance_deg) {
            log::debug!("Click at {point} matched site {} ({})", site.id, site.address);
            AnalysisResult::matched(site)
        } else {
            log::debug!("Click at {point} is a novel point, running analysis");
            match self.analyzer.analyze(point) {
                Ok(analysis) => AnalysisResult::NovelPoint {
                    point,
                    features: analysis.features,
                    cluster: analysis.cluster,
                },
                Err(e) => {
                    log::warn!("Analysis failed for click at {point}: {e}");
                    self.state.clear();
                    return Err(e);
                }
            }
        };

        self.state.remember(key, result);

        Ok(ClickOutcome {
            result,
            reused: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use site_map_analytics_models::{AnalysisKind, Cluster, FeatureVector, Site};
    use site_map_geometry::MetricLine;
    use site_map_spatial::{CallIndex, NetworkIndex, SpatialError};

    use super::*;
    use crate::classifier::FittedModel;
    use crate::features::{AnalysisPipeline, PointAnalysis};

    /// Analyzer that counts invocations and optionally fails.
    struct CountingAnalyzer {
        calls: Cell<usize>,
        fail: Cell<bool>,
    }

    impl CountingAnalyzer {
        const fn new() -> Self {
            Self {
                calls: Cell::new(0),
                fail: Cell::new(false),
            }
        }
    }

    impl PointAnalyzer for CountingAnalyzer {
        fn analyze(&self, _point: GeoPoint) -> Result<PointAnalysis, AnalyticsError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail.get() {
                return Err(SpatialError::EmptyNetwork.into());
            }
            Ok(PointAnalysis {
                features: FeatureVector::new([1, 2, 2, 3], 120.0, 15.0),
                cluster: Cluster::Three,
            })
        }
    }

    fn catalog() -> SiteCatalog {
        SiteCatalog::new(vec![Site {
            id: 0,
            point: GeoPoint::new(47.2529, -122.4443),
            site_type: "Library".to_string(),
            address: "1102 Tacoma Ave S".to_string(),
            city: "Tacoma".to_string(),
            cluster: Cluster::Two,
            features: FeatureVector::new([3, 10, 25, 40], 210.5, 12.25),
        }])
    }

    #[test]
    fn site_click_returns_stored_values_without_analysis() {
        let catalog = catalog();
        let analyzer = CountingAnalyzer::new();
        let mut orchestrator = ClickOrchestrator::new(&catalog, &analyzer);

        let outcome = orchestrator
            .handle_click(GeoPoint::new(47.2529, -122.4443))
            .unwrap();

        assert!(!outcome.reused);
        assert_eq!(outcome.result.kind(), AnalysisKind::MatchedSite);
        assert_eq!(outcome.result.site_id(), Some(0));
        assert_eq!(outcome.result.cluster(), Cluster::Two);
        assert_eq!(outcome.result.features().counts(), [3, 10, 25, 40]);
        assert_eq!(analyzer.calls.get(), 0);
    }

    #[test]
    fn novel_click_runs_analysis() {
        let catalog = catalog();
        let analyzer = CountingAnalyzer::new();
        let mut orchestrator = ClickOrchestrator::new(&catalog, &analyzer);

        let click = GeoPoint::new(47.25, -122.45);
        let outcome = orchestrator.handle_click(click).unwrap();

        assert_eq!(outcome.result.kind(), AnalysisKind::NovelPoint);
        assert_eq!(outcome.result.site_id(), None);
        assert_eq!(outcome.result.point(), click);
        assert_eq!(outcome.result.cluster(), Cluster::Three);
        assert_eq!(analyzer.calls.get(), 1);
    }

    #[test]
    fn repeated_click_is_served_from_cache() {
        let catalog = catalog();
        let analyzer = CountingAnalyzer::new();
        let mut orchestrator = ClickOrchestrator::new(&catalog, &analyzer);

        let first = orchestrator
            .handle_click(GeoPoint::new(47.25, -122.45))
            .unwrap();
        // Differs only below the sixth decimal.
        let second = orchestrator
            .handle_click(GeoPoint::new(47.250_000_2, -122.450_000_3))
            .unwrap();

        assert!(!first.reused);
        assert!(second.reused);
        assert_eq!(first.result, second.result);
        assert_eq!(analyzer.calls.get(), 1);
    }

    #[test]
    fn different_click_runs_again() {
        let catalog = catalog();
        let analyzer = CountingAnalyzer::new();
        let mut orchestrator = ClickOrchestrator::new(&catalog, &analyzer);

        orchestrator
            .handle_click(GeoPoint::new(47.25, -122.45))
            .unwrap();
        orchestrator
            .handle_click(GeoPoint::new(47.26, -122.45))
            .unwrap();
        orchestrator
            .handle_click(GeoPoint::new(47.25, -122.45))
            .unwrap();

        assert_eq!(analyzer.calls.get(), 3);
    }

    #[test]
    fn clear_selection_forgets_last_click() {
        let catalog = catalog();
        let analyzer = CountingAnalyzer::new();
        let mut orchestrator = ClickOrchestrator::new(&catalog, &analyzer);
        let click = GeoPoint::new(47.25, -122.45);

        orchestrator.handle_click(click).unwrap();
        assert!(orchestrator.last_result().is_some());

        orchestrator.clear_selection();
        assert!(orchestrator.last_result().is_none());

        let outcome = orchestrator.handle_click(click).unwrap();
        assert!(!outcome.reused);
        assert_eq!(analyzer.calls.get(), 2);
    }

    #[test]
    fn failed_analysis_is_not_cached() {
        let catalog = catalog();
        let analyzer = CountingAnalyzer::new();
        let mut orchestrator = ClickOrchestrator::new(&catalog, &analyzer);
        let click = GeoPoint::new(47.25, -122.45);

        analyzer.fail.set(true);
        assert_eq!(
            orchestrator.handle_click(click),
            Err(AnalyticsError::Spatial(SpatialError::EmptyNetwork))
        );
        assert!(orchestrator.last_result().is_none());

        analyzer.fail.set(false);
        let outcome = orchestrator.handle_click(click).unwrap();
        assert!(!outcome.reused);
        assert_eq!(analyzer.calls.get(), 2);
    }

    #[test]
    fn non_finite_click_is_rejected_before_work() {
        let catalog = catalog();
        let analyzer = CountingAnalyzer::new();
        let mut orchestrator = ClickOrchestrator::new(&catalog, &analyzer);

        assert!(matches!(
            orchestrator.handle_click(GeoPoint::new(f64::NAN, -122.45)),
            Err(AnalyticsError::InvalidClick { .. })
        ));
        assert_eq!(analyzer.calls.get(), 0);
    }

    #[test]
    fn tolerance_is_configurable() {
        let catalog = catalog();
        let analyzer = CountingAnalyzer::new();
        let near = GeoPoint::new(47.2534, -122.4443);

        let mut strict = ClickOrchestrator::new(&catalog, &analyzer);
        assert_eq!(
            strict.handle_click(near).unwrap().result.kind(),
            AnalysisKind::NovelPoint
        );

        let mut loose = ClickOrchestrator::new(&catalog, &analyzer).with_tolerance(1e-3);
        assert_eq!(
            loose.handle_click(near).unwrap().result.kind(),
            AnalysisKind::MatchedSite
        );
    }

    #[test]
    fn state_survives_handoff() {
        let catalog = catalog();
        let analyzer = CountingAnalyzer::new();
        let click = GeoPoint::new(47.25, -122.45);

        let mut first = ClickOrchestrator::new(&catalog, &analyzer);
        first.handle_click(click).unwrap();
        let state = first.into_state();
        assert_eq!(state.last_click(), Some(ClickKey::new(click)));

        let mut second = ClickOrchestrator::new(&catalog, &analyzer).with_state(state);
        assert!(second.handle_click(click).unwrap().reused);
        assert_eq!(analyzer.calls.get(), 1);
    }

    #[test]
    fn end_to_end_novel_point_counts_nested_buffers() {
        let catalog = catalog();
        let click = GeoPoint::new(47.25, -122.45);
        let origin = click.to_metric().unwrap();

        let calls = CallIndex::new(&[
            origin.offset(300.0, 0.0),
            origin.offset(0.0, 800.0),
            origin.offset(-2_500.0, 0.0),
        ]);
        let transit = NetworkIndex::new(&[MetricLine::new(vec![
            (origin.x() - 1_000.0, origin.y() + 400.0),
            (origin.x() + 1_000.0, origin.y() + 400.0),
        ])]);
        let roads = NetworkIndex::new(&[MetricLine::new(vec![
            (origin.x() + 25.0, origin.y() - 1_000.0),
            (origin.x() + 25.0, origin.y() + 1_000.0),
        ])]);
        let model = FittedModel::new(vec![0.0; 6], vec![1.0; 6], vec![vec![0.0; 6]]).unwrap();
        let pipeline = AnalysisPipeline::new(&calls, &roads, &transit, &model);
        let mut orchestrator = ClickOrchestrator::new(&catalog, pipeline);

        let outcome = orchestrator.handle_click(click).unwrap();
        let features = outcome.result.features();

        assert_eq!(outcome.result.kind(), AnalysisKind::NovelPoint);
        assert_eq!(features.counts(), [1, 2, 2, 3]);
        assert!((features.nearest_transit_distance - 400.0).abs() < 1e-6);
        assert!((features.nearest_road_distance - 25.0).abs() < 1e-6);
        assert_eq!(outcome.result.cluster(), Cluster::One);
    }

    #[test]
    fn click_key_rounds_to_six_decimals() {
        assert_eq!(
            ClickKey::new(GeoPoint::new(47.123_456_4, -122.000_000_1)),
            ClickKey::new(GeoPoint::new(47.123_456_1, -122.0))
        );
        assert_ne!(
            ClickKey::new(GeoPoint::new(47.123_456, -122.0)),
            ClickKey::new(GeoPoint::new(47.123_457, -122.0))
        );
    }
}
