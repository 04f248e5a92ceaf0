#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate reference system tags and typed geometries.
//!
//! Two coordinate systems are used throughout the site-map toolchain:
//! geographic WGS 84 degrees ([`Crs::Wgs84`], `EPSG:4326`) for storage,
//! display and click coordinates, and Web Mercator meters
//! ([`Crs::WebMercator`], `EPSG:3857`) for every buffer and distance
//! computation.
//!
//! Metric operations only accept [`MetricPoint`] and [`MetricLine`]. The
//! only ways to obtain one are constructing it directly from meter values
//! or converting a [`Tagged`] geometry whose tag is metric, so degree
//! coordinates can never reach a meter-radius computation unprojected.

pub mod projection;

use geo::{Distance as _, Euclidean, LineString, Point};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use projection::project;

/// Errors produced by CRS handling and projection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// A geometry was tagged with a different CRS than the operation requires.
    #[error("CRS mismatch: expected {expected}, found {found}")]
    CrsMismatch {
        /// CRS the operation requires.
        expected: Crs,
        /// CRS the geometry was tagged with.
        found: Crs,
    },

    /// The EPSG code or CRS name is not one of the supported systems.
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// A coordinate lies outside the domain of the target projection.
    #[error("Coordinate ({x}, {y}) is outside the {crs} projection domain")]
    OutOfDomain {
        /// Projection being applied.
        crs: Crs,
        /// X (longitude or easting).
        x: f64,
        /// Y (latitude or northing).
        y: f64,
    },
}

/// A supported coordinate reference system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
pub enum Crs {
    /// Geographic WGS 84 longitude/latitude in degrees.
    #[strum(serialize = "EPSG:4326")]
    Wgs84,
    /// Spherical Web Mercator in meters.
    #[strum(serialize = "EPSG:3857")]
    WebMercator,
}

impl Crs {
    /// Returns the EPSG code of this system.
    #[must_use]
    pub const fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::WebMercator => 3857,
        }
    }

    /// Resolves an EPSG code.
    ///
    /// `900913` and `102100` are legacy aliases for Web Mercator.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedCrs`] for any other code.
    pub fn from_epsg(code: u32) -> Result<Self, GeometryError> {
        match code {
            4326 => Ok(Self::Wgs84),
            3857 | 900_913 | 102_100 => Ok(Self::WebMercator),
            _ => Err(GeometryError::UnsupportedCrs(format!("EPSG:{code}"))),
        }
    }

    /// Resolves a CRS name as found in legacy `GeoJSON` `crs` members,
    /// e.g. `"urn:ogc:def:crs:EPSG::3857"`, `"EPSG:4326"` or
    /// `"urn:ogc:def:crs:OGC:1.3:CRS84"`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedCrs`] if the name cannot be
    /// resolved to a supported system.
    pub fn from_name(name: &str) -> Result<Self, GeometryError> {
        let trimmed = name.trim();
        if trimmed.ends_with("CRS84") {
            return Ok(Self::Wgs84);
        }

        trimmed
            .rsplit(':')
            .next()
            .and_then(|code| code.parse::<u32>().ok())
            .map_or_else(
                || Err(GeometryError::UnsupportedCrs(trimmed.to_string())),
                Self::from_epsg,
            )
    }
}

/// A geometry together with the CRS its coordinates are expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<G> {
    crs: Crs,
    geometry: G,
}

impl<G> Tagged<G> {
    /// Tags `geometry` with `crs`.
    #[must_use]
    pub const fn new(crs: Crs, geometry: G) -> Self {
        Self { crs, geometry }
    }

    /// The CRS the coordinates are expressed in.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// Borrows the untagged geometry.
    #[must_use]
    pub const fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Consumes the tag, returning the geometry.
    #[must_use]
    pub fn into_inner(self) -> G {
        self.geometry
    }

    /// Fails with [`GeometryError::CrsMismatch`] unless tagged with `expected`.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn require(&self, expected: Crs) -> Result<(), GeometryError> {
        if self.crs == expected {
            Ok(())
        } else {
            Err(GeometryError::CrsMismatch {
                expected,
                found: self.crs,
            })
        }
    }
}

/// A geographic click/storage coordinate in WGS 84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both components are finite numbers.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Tags this point as a `geo` point in [`Crs::Wgs84`] (x = lon, y = lat).
    #[must_use]
    pub fn tagged(&self) -> Tagged<Point<f64>> {
        Tagged::new(Crs::Wgs84, Point::new(self.lon, self.lat))
    }

    /// Projects this point into Web Mercator meters.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::OutOfDomain`] for latitudes beyond the
    /// Web Mercator limit or non-finite coordinates.
    pub fn to_metric(&self) -> Result<MetricPoint, GeometryError> {
        MetricPoint::try_from(project(&self.tagged(), Crs::WebMercator)?)
    }

    /// Converts a Web Mercator point back to degrees.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::OutOfDomain`] for non-finite coordinates.
    pub fn from_metric(point: MetricPoint) -> Result<Self, GeometryError> {
        let geographic = project(&point.tagged(), Crs::Wgs84)?.into_inner();
        Ok(Self::new(geographic.y(), geographic.x()))
    }

    /// Converts a point tagged with any supported CRS into degrees.
    ///
    /// # Errors
    ///
    /// Propagates projection failures.
    pub fn from_tagged(point: &Tagged<Point<f64>>) -> Result<Self, GeometryError> {
        let geographic = project(point, Crs::Wgs84)?.into_inner();
        Ok(Self::new(geographic.y(), geographic.x()))
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// A point in Web Mercator meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPoint(Point<f64>);

impl MetricPoint {
    /// Creates a point from Web Mercator easting/northing in meters.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point::new(x, y))
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.0.x()
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.0.y()
    }

    /// The underlying `geo` point.
    #[must_use]
    pub const fn point(&self) -> &Point<f64> {
        &self.0
    }

    /// Coordinates as an `[x, y]` array, the key type used by the R-tree
    /// indexes.
    #[must_use]
    pub fn coords(&self) -> [f64; 2] {
        [self.0.x(), self.0.y()]
    }

    /// Returns a copy translated by `(dx, dy)` meters.
    #[must_use]
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x() + dx, self.y() + dy)
    }

    /// Euclidean distance in meters.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        Euclidean.distance(self.0, other.0)
    }

    /// Re-tags this point for projection back to degrees.
    #[must_use]
    pub const fn tagged(&self) -> Tagged<Point<f64>> {
        Tagged::new(Crs::WebMercator, self.0)
    }
}

impl TryFrom<Tagged<Point<f64>>> for MetricPoint {
    type Error = GeometryError;

    fn try_from(value: Tagged<Point<f64>>) -> Result<Self, Self::Error> {
        value.require(Crs::WebMercator)?;
        Ok(Self(value.into_inner()))
    }
}

/// A line string in Web Mercator meters.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine(LineString<f64>);

impl MetricLine {
    /// Creates a line from Web Mercator vertices in meters.
    #[must_use]
    pub fn new(vertices: Vec<(f64, f64)>) -> Self {
        Self(LineString::from(vertices))
    }

    /// The underlying `geo` line string.
    #[must_use]
    pub const fn line_string(&self) -> &LineString<f64> {
        &self.0
    }

    /// Euclidean distance in meters from `point` to the nearest location
    /// on this line. A single-vertex line is measured as a point.
    #[must_use]
    pub fn distance_to(&self, point: &MetricPoint) -> f64 {
        match self.0.0.as_slice() {
            [] => f64::INFINITY,
            [only] => Euclidean.distance(Point::from(*only), *point.point()),
            _ => Euclidean.distance(point.point(), &self.0),
        }
    }

    /// Whether the line has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.0.is_empty()
    }
}

impl TryFrom<Tagged<LineString<f64>>> for MetricLine {
    type Error = GeometryError;

    fn try_from(value: Tagged<LineString<f64>>) -> Result<Self, Self::Error> {
        value.require(Crs::WebMercator)?;
        Ok(Self(value.into_inner()))
    }
}
