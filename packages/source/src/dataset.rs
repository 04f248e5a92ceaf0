//! The fully loaded, read-only reference dataset.

use std::sync::Arc;

use site_map_analytics::{AnalysisPipeline, ClickOrchestrator, FittedModel, SiteCatalog};
use site_map_source_models::{LayerKind, SiteMapConfig};
use site_map_spatial::{CallIndex, NetworkIndex};

use crate::SourceError;
use crate::progress::ProgressCallback;

/// Everything click analysis needs, loaded once.
pub struct Dataset {
    pub catalog: SiteCatalog,
    pub calls: CallIndex,
    pub roads: NetworkIndex,
    pub transit: NetworkIndex,
    pub model: FittedModel,
    /// Per-axis tolerance, in degrees, for matching clicks to sites.
    pub match_tolerance_deg: f64,
}

impl Dataset {
    /// The novel-point pipeline over this dataset's layers.
    #[must_use]
    pub const fn pipeline(&self) -> AnalysisPipeline<'_> {
        AnalysisPipeline::new(&self.calls, &self.roads, &self.transit, &self.model)
    }

    /// A click orchestrator with empty history and the configured tolerance.
    #[must_use]
    pub fn orchestrator(&self) -> ClickOrchestrator<'_, AnalysisPipeline<'_>> {
        ClickOrchestrator::new(&self.catalog, self.pipeline())
            .with_tolerance(self.match_tolerance_deg)
    }

    /// Number of loaded records in a layer: sites, call events, or network
    /// lines.
    #[must_use]
    pub fn layer_size(&self, kind: LayerKind) -> usize {
        match kind {
            LayerKind::Sites => self.catalog.len(),
            LayerKind::Calls => self.calls.len(),
            LayerKind::Roads => self.roads.line_count(),
            LayerKind::Transit => self.transit.line_count(),
        }
    }
}

/// Loads every layer and the model named by `config`.
///
/// An empty road or transit layer is accepted here and reported as a
/// warning; analyzing a novel point against it fails later with
/// `EmptyNetwork`.
///
/// # Errors
///
/// Returns the first [`SourceError`] raised by any loader.
pub fn load_dataset(
    config: &SiteMapConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Dataset, SourceError> {
    progress.set_total(LayerKind::all().len() as u64 + 1);

    progress.set_message(format!("Loading {}", LayerKind::Sites));
    let catalog = SiteCatalog::new(crate::sites::load_sites(&config.layers.sites)?);
    progress.inc(1);

    progress.set_message(format!("Loading {}", LayerKind::Calls));
    let calls = CallIndex::new(&crate::calls::load_calls(&config.layers.calls)?);
    progress.inc(1);

    progress.set_message(format!("Loading {}", LayerKind::Roads));
    let roads = NetworkIndex::new(&crate::network::load_network(&config.layers.roads)?);
    progress.inc(1);

    progress.set_message(format!("Loading {}", LayerKind::Transit));
    let transit = NetworkIndex::new(&crate::network::load_network(&config.layers.transit)?);
    progress.inc(1);

    progress.set_message("Loading model".to_string());
    let model = crate::model::load_model(&config.model.path)?;
    progress.inc(1);

    for (kind, network) in [(LayerKind::Roads, &roads), (LayerKind::Transit, &transit)] {
        if network.is_empty() {
            log::warn!("The {kind} layer has no line features; novel points cannot be analyzed");
        }
    }

    progress.finish(format!(
        "Loaded {} sites, {} calls, {} roads, {} transit lines",
        catalog.len(),
        calls.len(),
        roads.line_count(),
        transit.line_count()
    ));

    Ok(Dataset {
        catalog,
        calls,
        roads,
        transit,
        model,
        match_tolerance_deg: config.analysis.match_tolerance_deg,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use site_map_analytics::{AnalysisKind, Cluster};
    use site_map_geometry::GeoPoint;

    use super::*;
    use crate::config::load_config;
    use crate::progress::null_progress;

    fn write_fixture(dir: &Path) {
        std::fs::write(
            dir.join("site_map.toml"),
            r#"
            [layers.sites]
            path = "sites.geojson"
            [layers.calls]
            path = "calls.csv"
            [layers.roads]
            path = "roads.geojson"
            [layers.transit]
            path = "transit.geojson"
            [model]
            path = "model.json"
            "#,
        )
        .unwrap();

        std::fs::write(
            dir.join("sites.geojson"),
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [-122.4443, 47.2529]},
                 "properties": {"Type": "Library", "Address": "1102 Tacoma Ave S", "City": "Tacoma",
                    "Cluster": 2, "Nearby_Cou": 3, "Nearby_C_1": 10, "Nearby_C_2": 25,
                    "Nearby_C_3": 40, "Nearest_Tr": 210.5, "Nearest_Ro": 12.25}}
            ]}"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("calls.csv"),
            "Longitude,Latitude\n-122.4501,47.2501\n-122.4490,47.2510\n",
        )
        .unwrap();

        std::fs::write(
            dir.join("roads.geojson"),
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[-122.46, 47.25], [-122.44, 47.25]]}}
            ]}"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("transit.geojson"),
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[-122.45, 47.24], [-122.45, 47.26]]}}
            ]}"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("model.json"),
            r#"{"center": [0, 0, 0, 0, 0, 0], "scale": [1, 1, 1, 1, 1, 1],
                "centroids": [[0, 0, 0, 0, 0, 0], [100, 100, 100, 100, 1000, 1000]]}"#,
        )
        .unwrap();
    }

    #[test]
    fn loads_every_layer() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let config = load_config(&dir.path().join("site_map.toml")).unwrap();
        let dataset = load_dataset(&config, &null_progress()).unwrap();

        assert_eq!(dataset.layer_size(LayerKind::Sites), 1);
        assert_eq!(dataset.layer_size(LayerKind::Calls), 2);
        assert_eq!(dataset.layer_size(LayerKind::Roads), 1);
        assert_eq!(dataset.layer_size(LayerKind::Transit), 1);
        assert!((dataset.match_tolerance_deg - 1e-4).abs() < f64::EPSILON);
    }

    #[test]
    fn orchestrator_routes_site_and_novel_clicks() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let config = load_config(&dir.path().join("site_map.toml")).unwrap();
        let dataset = load_dataset(&config, &null_progress()).unwrap();
        let mut orchestrator = dataset.orchestrator();

        let site = orchestrator
            .handle_click(GeoPoint::new(47.2529, -122.4443))
            .unwrap();
        assert_eq!(site.result.kind(), AnalysisKind::MatchedSite);
        assert_eq!(site.result.cluster(), Cluster::Two);

        let novel = orchestrator
            .handle_click(GeoPoint::new(47.25, -122.45))
            .unwrap();
        assert_eq!(novel.result.kind(), AnalysisKind::NovelPoint);
        assert_eq!(novel.result.features().counts(), [2, 2, 2, 2]);
        assert!(novel.result.features().nearest_road_distance < 1e-6);
        assert!(novel.result.features().nearest_transit_distance < 1e-6);
        assert_eq!(novel.result.cluster(), Cluster::One);
    }

    #[test]
    fn missing_layer_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        std::fs::remove_file(dir.path().join("transit.geojson")).unwrap();

        let config = load_config(&dir.path().join("site_map.toml")).unwrap();
        assert!(matches!(
            load_dataset(&config, &null_progress()),
            Err(SourceError::Io { .. })
        ));
    }
}
