//! Road and transit network loading from `GeoJSON` line layers.

use geo::LineString;
use site_map_geometry::{Crs, MetricLine, Tagged, project};
use site_map_source_models::LayerSource;

use crate::SourceError;
use crate::layer::{parse_layer, read_layer};

/// Loads a line layer and projects it into Web Mercator meters.
///
/// `LineString` and `MultiLineString` features are accepted; each part of
/// a multi-line becomes its own [`MetricLine`]. Other geometry types are
/// skipped with a warning.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or parsed or if a
/// vertex lies outside the Web Mercator domain.
pub fn load_network(source: &LayerSource) -> Result<Vec<MetricLine>, SourceError> {
    let layer = read_layer(&source.path, source.epsg)?;
    let lines = lines_from_layer(layer.collection, layer.crs)?;

    log::info!(
        "Loaded {} network lines from {}",
        lines.len(),
        source.path.display()
    );

    Ok(lines)
}

/// Parses a line layer from `GeoJSON` text.
///
/// # Errors
///
/// See [`load_network`].
pub fn parse_network(contents: &str, epsg: Option<u32>) -> Result<Vec<MetricLine>, SourceError> {
    let layer = parse_layer(contents, epsg)?;
    lines_from_layer(layer.collection, layer.crs)
}

fn lines_from_layer(
    collection: geojson::FeatureCollection,
    crs: Crs,
) -> Result<Vec<MetricLine>, SourceError> {
    let mut lines = Vec::new();
    let mut skipped = 0usize;

    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            skipped += 1;
            continue;
        };

        match geo::Geometry::<f64>::try_from(geometry)? {
            geo::Geometry::LineString(line) => lines.push(to_metric(line, crs)?),
            geo::Geometry::MultiLineString(multi) => {
                for line in multi.0 {
                    lines.push(to_metric(line, crs)?);
                }
            }
            geo::Geometry::Line(line) => lines.push(to_metric(line.into(), crs)?),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} network features without line geometry");
    }

    Ok(lines)
}

fn to_metric(line: LineString<f64>, crs: Crs) -> Result<MetricLine, SourceError> {
    let projected = project(&Tagged::new(crs, line), Crs::WebMercator)?;
    Ok(MetricLine::try_from(projected)?)
}
