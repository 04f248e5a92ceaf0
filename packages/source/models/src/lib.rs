#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration types describing where the reference layers and the
//! fitted model live.
//!
//! The schema is deserialized from a TOML file; see [`SiteMapConfig`].
//! Paths are stored as written. Resolving them against the config file's
//! directory is the loader's job.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default EPSG code assumed for layers that do not declare one.
pub const DEFAULT_EPSG: u32 = 4326;

pub use site_map_analytics_models::DEFAULT_MATCH_TOLERANCE_DEG;

/// The reference layers a dataset is built from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayerKind {
    /// Candidate sites with stored analytics (`GeoJSON` points).
    Sites,
    /// Call events (CSV with coordinate columns).
    Calls,
    /// Road network (`GeoJSON` lines).
    Roads,
    /// Transit network (`GeoJSON` lines).
    Transit,
}

impl LayerKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Sites, Self::Calls, Self::Roads, Self::Transit]
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteMapConfig {
    pub layers: LayersConfig,
    pub model: ModelSource,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl SiteMapConfig {
    /// Returns a copy with every relative path joined onto `base`.
    #[must_use]
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.layers.sites.path);
        resolve(&mut self.layers.calls.path);
        resolve(&mut self.layers.roads.path);
        resolve(&mut self.layers.transit.path);
        resolve(&mut self.model.path);

        self
    }
}

/// The four reference layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayersConfig {
    pub sites: LayerSource,
    pub calls: CallLayerSource,
    pub roads: LayerSource,
    pub transit: LayerSource,
}

impl LayersConfig {
    /// Path of the file backing `kind`.
    #[must_use]
    pub fn path(&self, kind: LayerKind) -> &Path {
        match kind {
            LayerKind::Sites => &self.sites.path,
            LayerKind::Calls => &self.calls.path,
            LayerKind::Roads => &self.roads.path,
            LayerKind::Transit => &self.transit.path,
        }
    }
}

/// A `GeoJSON` layer on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSource {
    pub path: PathBuf,
    /// EPSG code of the file's coordinates. `None` defers to the file's
    /// own `crs` member, then [`DEFAULT_EPSG`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsg: Option<u32>,
}

/// The call event CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallLayerSource {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsg: Option<u32>,
    /// Header of the longitude (or x) column.
    #[serde(default = "default_longitude_column")]
    pub longitude_column: String,
    /// Header of the latitude (or y) column.
    #[serde(default = "default_latitude_column")]
    pub latitude_column: String,
}

impl CallLayerSource {
    #[must_use]
    pub fn epsg(&self) -> u32 {
        self.epsg.unwrap_or(DEFAULT_EPSG)
    }
}

fn default_longitude_column() -> String {
    "Longitude".to_string()
}

fn default_latitude_column() -> String {
    "Latitude".to_string()
}

/// Location of the fitted clustering model (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSource {
    pub path: PathBuf,
}

/// Tunables for click analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Per-axis tolerance, in degrees, for matching a click to a site.
    #[serde(default = "default_match_tolerance")]
    pub match_tolerance_deg: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            match_tolerance_deg: DEFAULT_MATCH_TOLERANCE_DEG,
        }
    }
}

const fn default_match_tolerance() -> f64 {
    DEFAULT_MATCH_TOLERANCE_DEG
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    const FULL: &str = r#"
        [layers.sites]
        path = "data/sites.geojson"

        [layers.calls]
        path = "data/calls.csv"
        longitude_column = "X"
        latitude_column = "Y"

        [layers.roads]
        path = "/srv/roads.geojson"

        [layers.transit]
        path = "data/transit.geojson"
        epsg = 3857

        [model]
        path = "data/model.json"

        [analysis]
        match_tolerance_deg = 0.0005
    "#;

    #[test]
    fn parses_full_config() {
        let config: SiteMapConfig = toml::from_str(FULL).unwrap();

        assert_eq!(config.layers.sites.epsg, None);
        assert_eq!(config.layers.transit.epsg, Some(3857));
        assert_eq!(config.layers.calls.longitude_column, "X");
        assert_eq!(config.layers.calls.latitude_column, "Y");
        assert!((config.analysis.match_tolerance_deg - 0.0005).abs() < f64::EPSILON);
    }

    #[test]
    fn optional_sections_use_defaults() {
        let config: SiteMapConfig = toml::from_str(
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

        assert_eq!(config.layers.calls.longitude_column, "Longitude");
        assert_eq!(config.layers.calls.latitude_column, "Latitude");
        assert_eq!(config.layers.calls.epsg(), DEFAULT_EPSG);
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert!(
            (config.analysis.match_tolerance_deg - DEFAULT_MATCH_TOLERANCE_DEG).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        let result = toml::from_str::<SiteMapConfig>(&FULL.replace("epsg = 3857", "crs = 3857"));
        assert!(result.is_err());
    }

    #[test]
    fn resolves_only_relative_paths() {
        let config: SiteMapConfig = toml::from_str(FULL).unwrap();
        let resolved = config.resolve_paths(Path::new("/opt/site_map"));

        assert_eq!(
            resolved.layers.path(LayerKind::Sites),
            Path::new("/opt/site_map/data/sites.geojson")
        );
        assert_eq!(
            resolved.layers.path(LayerKind::Roads),
            Path::new("/srv/roads.geojson")
        );
        assert_eq!(resolved.model.path, Path::new("/opt/site_map/data/model.json"));
    }

    #[test]
    fn layer_kind_names() {
        assert_eq!(LayerKind::Transit.to_string(), "transit");
        assert_eq!(LayerKind::from_str("calls").unwrap(), LayerKind::Calls);
        assert_eq!(LayerKind::all().len(), 4);
    }
}
