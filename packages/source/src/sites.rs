//! Site catalog loading from a `GeoJSON` point layer.
//!
//! Site attributes may use either the full names (`Nearby_Count_500`) or
//! the ten-character names a shapefile export truncates them to
//! (`Nearby_Cou`). Numeric attributes are accepted as integers or as
//! integral floats, since shapefile round trips store them as doubles.

use serde::{Deserialize, Deserializer};
use site_map_analytics_models::{Cluster, FeatureVector, Site};
use site_map_geometry::{Crs, GeoPoint, Tagged};
use site_map_source_models::LayerSource;

use crate::SourceError;
use crate::layer::{parse_layer, read_layer};

/// Site attributes as stored in the layer's feature properties.
#[derive(Debug, Deserialize)]
struct SiteProperties {
    #[serde(rename = "Type", default)]
    site_type: Option<String>,
    #[serde(rename = "Address", default)]
    address: Option<String>,
    #[serde(rename = "City", default)]
    city: Option<String>,
    #[serde(rename = "Cluster", deserialize_with = "deserialize_cluster")]
    cluster: Cluster,
    #[serde(
        rename = "Nearby_Count_500",
        alias = "Nearby_Cou",
        deserialize_with = "deserialize_count"
    )]
    nearby_count_500: u64,
    #[serde(
        rename = "Nearby_Count_1000",
        alias = "Nearby_C_1",
        deserialize_with = "deserialize_count"
    )]
    nearby_count_1000: u64,
    #[serde(
        rename = "Nearby_Count_2000",
        alias = "Nearby_C_2",
        deserialize_with = "deserialize_count"
    )]
    nearby_count_2000: u64,
    #[serde(
        rename = "Nearby_Count_3000",
        alias = "Nearby_C_3",
        deserialize_with = "deserialize_count"
    )]
    nearby_count_3000: u64,
    #[serde(rename = "Nearest_Transit_Distance", alias = "Nearest_Tr")]
    nearest_transit_distance: f64,
    #[serde(rename = "Nearest_Road_Distance", alias = "Nearest_Ro")]
    nearest_road_distance: f64,
}

impl SiteProperties {
    fn into_site(self, id: usize, point: GeoPoint) -> Site {
        Site {
            id,
            point,
            site_type: self.site_type.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            cluster: self.cluster,
            features: FeatureVector::new(
                [
                    self.nearby_count_500,
                    self.nearby_count_1000,
                    self.nearby_count_2000,
                    self.nearby_count_3000,
                ],
                self.nearest_transit_distance,
                self.nearest_road_distance,
            ),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn deserialize_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a non-negative whole count, got {value}"
        )))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn deserialize_cluster<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cluster, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || !(1.0..=3.0).contains(&value) {
        return Err(serde::de::Error::custom(format!(
            "invalid cluster label {value}: expected 1-3"
        )));
    }
    Cluster::from_value(value as u8).map_err(serde::de::Error::custom)
}

/// Loads the site layer described by `source`.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or parsed, if a
/// feature's attributes are incomplete, or if a coordinate cannot be
/// converted to degrees.
pub fn load_sites(source: &LayerSource) -> Result<Vec<Site>, SourceError> {
    let layer = read_layer(&source.path, source.epsg)?;
    let sites = sites_from_layer(layer.collection, layer.crs)?;
    log::info!("Loaded {} sites from {}", sites.len(), source.path.display());
    Ok(sites)
}

/// Parses site features from `GeoJSON` text.
///
/// # Errors
///
/// See [`load_sites`].
pub fn parse_sites(contents: &str, epsg: Option<u32>) -> Result<Vec<Site>, SourceError> {
    let layer = parse_layer(contents, epsg)?;
    sites_from_layer(layer.collection, layer.crs)
}

fn sites_from_layer(
    collection: geojson::FeatureCollection,
    crs: Crs,
) -> Result<Vec<Site>, SourceError> {
    let mut sites = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            log::warn!("Skipping site feature {index}: no geometry");
            continue;
        };

        let point = match geo::Geometry::<f64>::try_from(geometry)? {
            geo::Geometry::Point(point) => point,
            geo::Geometry::MultiPoint(multi) if multi.0.len() == 1 => multi.0[0],
            other => {
                log::warn!("Skipping site feature {index}: expected a point, found {other:?}");
                continue;
            }
        };

        let properties = serde_json::Value::Object(feature.properties.unwrap_or_default());
        let properties: SiteProperties =
            serde_json::from_value(properties).map_err(|e| SourceError::Invalid {
                message: format!("site feature {index}: {e}"),
            })?;

        let point = GeoPoint::from_tagged(&Tagged::new(crs, point))?;
        sites.push(properties.into_site(sites.len(), point));
    }

    Ok(sites)
}
