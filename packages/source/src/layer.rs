//! Shared `GeoJSON` layer reading and CRS resolution.

use std::path::Path;

use geojson::{FeatureCollection, GeoJson};
use site_map_geometry::Crs;

use crate::SourceError;

/// A parsed feature collection and the CRS its coordinates are in.
pub struct GeoJsonLayer {
    pub collection: FeatureCollection,
    pub crs: Crs,
}

/// Reads a `GeoJSON` `FeatureCollection` from disk.
pub fn read_layer(path: &Path, epsg: Option<u32>) -> Result<GeoJsonLayer, SourceError> {
    let contents = crate::read_to_string(path)?;
    parse_layer(&contents, epsg).map_err(|e| match e {
        SourceError::Invalid { message } => SourceError::Invalid {
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    })
}

/// Parses a `GeoJSON` `FeatureCollection`.
///
/// The coordinate system comes from `epsg` when set, otherwise from the
/// legacy `crs` member, otherwise EPSG:4326. When both `epsg` and a `crs`
/// member are present they must agree.
pub fn parse_layer(contents: &str, epsg: Option<u32>) -> Result<GeoJsonLayer, SourceError> {
    let collection = match contents.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(_) => {
            return Err(SourceError::invalid(
                "expected a FeatureCollection, found a single Feature",
            ));
        }
        GeoJson::Geometry(_) => {
            return Err(SourceError::invalid(
                "expected a FeatureCollection, found a bare Geometry",
            ));
        }
    };

    let declared = declared_crs(&collection)?;
    let crs = match (epsg, declared) {
        (Some(code), Some(declared)) => {
            let configured = Crs::from_epsg(code)?;
            if configured != declared {
                return Err(site_map_geometry::GeometryError::CrsMismatch {
                    expected: configured,
                    found: declared,
                }
                .into());
            }
            configured
        }
        (Some(code), None) => Crs::from_epsg(code)?,
        (None, Some(declared)) => declared,
        (None, None) => Crs::Wgs84,
    };

    Ok(GeoJsonLayer { collection, crs })
}

/// The CRS named by a legacy `"crs": {"type": "name", ...}` member.
fn declared_crs(collection: &FeatureCollection) -> Result<Option<Crs>, SourceError> {
    let Some(name) = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|properties| properties.get("name"))
        .and_then(serde_json::Value::as_str)
    else {
        return Ok(None);
    };

    Ok(Some(Crs::from_name(name)?))
}
