#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metric proximity queries for site analysis.
//!
//! Two queries feed the site feature vector:
//!
//! - how many call events fall inside buffers of several radii around a
//!   point ([`count_within_radii`] / [`CallIndex`]);
//! - how far a point is from the nearest line of a road or transit network
//!   ([`nearest_distance`] / [`NetworkIndex`]).
//!
//! Every query takes [`MetricPoint`]/[`MetricLine`] inputs, so distances and
//! radii are always in Web Mercator meters. The free functions are
//! brute-force scans; the index types are R-trees built once per layer at
//! startup and answer the same queries with identical semantics.

pub mod network;
pub mod proximity;

pub use network::{NearestFeature, NetworkIndex, nearest_distance};
pub use proximity::{CallIndex, RadiusCount, count_within_radii};
pub use site_map_geometry::{MetricLine, MetricPoint};

/// Errors from proximity and distance queries.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SpatialError {
    /// A nearest-distance query ran against a network with no line features.
    #[error("Network layer has no line features to measure against")]
    EmptyNetwork,

    /// A buffer radius was zero, negative or not finite.
    #[error("Invalid buffer radius {0}: must be a positive finite number of meters")]
    InvalidRadius(f64),
}

/// Rejects radii that cannot describe a buffer.
fn validate_radii(radii: &[f64]) -> Result<(), SpatialError> {
    match radii.iter().find(|r| !r.is_finite() || **r <= 0.0) {
        Some(bad) => Err(SpatialError::InvalidRadius(*bad)),
        None => Ok(()),
    }
}
