//! Call event loading from CSV.

use std::io::Read;

use geo::Point;
use site_map_geometry::{Crs, MetricPoint, Tagged, project};
use site_map_source_models::CallLayerSource;

use crate::SourceError;

/// Loads call events and projects them into Web Mercator meters.
///
/// Rows whose coordinate cells are empty, unparseable or outside the
/// projection domain are skipped and counted in a warning.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read, is not valid CSV,
/// or lacks one of the configured coordinate columns.
pub fn load_calls(source: &CallLayerSource) -> Result<Vec<MetricPoint>, SourceError> {
    let path = source.path.display().to_string();
    let crs = Crs::from_epsg(source.epsg())?;

    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&source.path)
        .map_err(|e| csv_error(&path, e))?;

    let events = read_events(
        reader,
        &source.longitude_column,
        &source.latitude_column,
        crs,
    )
    .map_err(|e| match e {
        SourceError::Csv { source, .. } => SourceError::Csv { path: path.clone(), source },
        other => other,
    })?;

    log::info!("Loaded {} call events from {path}", events.len());

    Ok(events)
}

/// Reads call events from any CSV source.
///
/// # Errors
///
/// See [`load_calls`].
pub fn read_calls(
    input: impl Read,
    longitude_column: &str,
    latitude_column: &str,
    crs: Crs,
) -> Result<Vec<MetricPoint>, SourceError> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    read_events(reader, longitude_column, latitude_column, crs)
}

fn read_events<R: Read>(
    mut reader: csv::Reader<R>,
    longitude_column: &str,
    latitude_column: &str,
    crs: Crs,
) -> Result<Vec<MetricPoint>, SourceError> {
    let headers = reader.headers().map_err(|e| csv_error("<input>", e))?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim() == name)
            .ok_or_else(|| SourceError::invalid(format!("call CSV has no '{name}' column")))
    };
    let x_index = column(longitude_column)?;
    let y_index = column(latitude_column)?;

    let mut events = Vec::new();
    let mut skipped = 0u64;

    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::debug!("  skipping malformed row {row}: {e}");
                skipped += 1;
                continue;
            }
        };

        let coordinate = |index: usize| {
            record
                .get(index)
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .and_then(|cell| cell.parse::<f64>().ok())
        };

        let (Some(x), Some(y)) = (coordinate(x_index), coordinate(y_index)) else {
            log::debug!("  skipping row {row}: missing or unparseable coordinates");
            skipped += 1;
            continue;
        };

        match project(&Tagged::new(crs, Point::new(x, y)), Crs::WebMercator)
            .and_then(MetricPoint::try_from)
        {
            Ok(point) => events.push(point),
            Err(e) => {
                log::debug!("  skipping row {row}: {e}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} call rows without usable coordinates");
    }

    Ok(events)
}

fn csv_error(path: &str, source: csv::Error) -> SourceError {
    SourceError::Csv {
        path: path.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use site_map_geometry::GeoPoint;

    use super::*;

    const CALLS: &str = "\
Incident,Longitude,Latitude
a,-122.45,47.25
b,-122.44,47.26
c,,47.26
d,not-a-number,47.26
e,-122.43,89.5
f,-122.42,47.27
";

    #[test]
    fn reads_and_projects_valid_rows() {
        let events = read_calls(CALLS.as_bytes(), "Longitude", "Latitude", Crs::Wgs84).unwrap();
        assert_eq!(events.len(), 3);

        let expected = GeoPoint::new(47.25, -122.45).to_metric().unwrap();
        assert!(events[0].distance_to(&expected) < 1e-6);
    }

    #[test]
    fn missing_column_is_invalid() {
        let result = read_calls(CALLS.as_bytes(), "Lon", "Latitude", Crs::Wgs84);
        assert!(matches!(result, Err(SourceError::Invalid { .. })));
    }

    #[test]
    fn metric_rows_are_used_as_is() {
        let csv = "X,Y\n100.0,200.0\n-50.5,0\n";
        let events = read_calls(csv.as_bytes(), "X", "Y", Crs::WebMercator).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].distance_to(&MetricPoint::new(100.0, 200.0)) < 1e-12);
    }

    #[test]
    fn header_whitespace_is_ignored() {
        let csv = " Longitude , Latitude \n-122.45,47.25\n";
        let events = read_calls(csv.as_bytes(), "Longitude", "Latitude", Crs::Wgs84).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn loads_from_disk_with_custom_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.csv");
        std::fs::write(&path, "lon,lat\n-122.45,47.25\n-122.46,47.24\n").unwrap();

        let events = load_calls(&CallLayerSource {
            path,
            epsg: None,
            longitude_column: "lon".to_string(),
            latitude_column: "lat".to_string(),
        })
        .unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn missing_file_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_calls(&CallLayerSource {
            path: dir.path().join("absent.csv"),
            epsg: None,
            longitude_column: "Longitude".to_string(),
            latitude_column: "Latitude".to_string(),
        });
        assert!(matches!(result, Err(SourceError::Csv { .. })));
    }
}
