//! Spherical Web Mercator projection (`EPSG:4326` <-> `EPSG:3857`).
//!
//! Formulas follow the pseudo-Mercator definition used by web map tiles:
//! longitude and latitude are projected onto a sphere of radius
//! [`EARTH_RADIUS`].

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use geo::{Coord, MapCoords};

use crate::{Crs, GeometryError, Tagged};

/// Sphere radius used by `EPSG:3857`, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which Web Mercator becomes square; coordinates beyond it
/// cannot be projected.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Re-expresses `tagged` in `target`, projecting every coordinate.
///
/// Topology is preserved: the output has the same structure and vertex
/// count as the input. Projecting into the CRS the geometry is already
/// in returns a copy.
///
/// # Errors
///
/// Returns [`GeometryError::OutOfDomain`] if any coordinate is non-finite
/// or lies outside the Web Mercator latitude range.
pub fn project<G>(tagged: &Tagged<G>, target: Crs) -> Result<Tagged<G>, GeometryError>
where
    G: MapCoords<f64, f64, Output = G> + Clone,
{
    let geometry = match (tagged.crs(), target) {
        (Crs::Wgs84, Crs::WebMercator) => tagged.geometry().try_map_coords(lon_lat_to_meters)?,
        (Crs::WebMercator, Crs::Wgs84) => tagged.geometry().try_map_coords(meters_to_lon_lat)?,
        _ => tagged.geometry().clone(),
    };

    Ok(Tagged::new(target, geometry))
}

/// Projects a `(lon, lat)` coordinate in degrees to Web Mercator meters.
///
/// # Errors
///
/// Returns [`GeometryError::OutOfDomain`] for non-finite input, longitudes
/// outside `[-180, 180]` or latitudes beyond [`MAX_LATITUDE`].
pub fn lon_lat_to_meters(coord: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
    let (lon, lat) = (coord.x, coord.y);
    if !lon.is_finite() || !lat.is_finite() || lon.abs() > 180.0 || lat.abs() > MAX_LATITUDE {
        return Err(GeometryError::OutOfDomain {
            crs: Crs::WebMercator,
            x: lon,
            y: lat,
        });
    }

    Ok(Coord {
        x: EARTH_RADIUS * lon.to_radians(),
        y: EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
    })
}

/// Inverts [`lon_lat_to_meters`].
///
/// # Errors
///
/// Returns [`GeometryError::OutOfDomain`] for non-finite input.
pub fn meters_to_lon_lat(coord: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(GeometryError::OutOfDomain {
            crs: Crs::Wgs84,
            x: coord.x,
            y: coord.y,
        });
    }

    Ok(Coord {
        x: (coord.x / EARTH_RADIUS).to_degrees(),
        y: 2.0f64
            .mul_add((coord.y / EARTH_RADIUS).exp().atan(), -FRAC_PI_2)
            .to_degrees(),
    })
}
