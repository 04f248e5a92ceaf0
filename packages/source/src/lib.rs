#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reference data loading.
//!
//! Reads the site catalog, call events, road and transit networks and the
//! fitted clustering model described by a [`SiteMapConfig`], converts every
//! layer into the typed geometry the analytics engine expects, and bundles
//! the result as a [`Dataset`].

pub mod calls;
pub mod config;
pub mod dataset;
mod layer;
pub mod model;
pub mod network;
pub mod progress;
pub mod sites;

use site_map_analytics::ClassifyError;
use site_map_geometry::GeometryError;

pub use config::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE, load_config, resolve_config_path};
pub use dataset::{Dataset, load_dataset};
pub use site_map_source_models::{LayerKind, SiteMapConfig};

/// Errors that can occur while loading reference data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Reading a file failed.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that could not be read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// CSV decoding failed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File being decoded.
        path: String,
        /// Underlying error.
        source: csv::Error,
    },

    /// JSON decoding failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` decoding failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(Box<geojson::Error>),

    /// The configuration file is not valid TOML or does not match the
    /// schema.
    #[error("Failed to parse config {path}: {message}")]
    Toml {
        /// Config file path.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A layer's coordinates could not be tagged or projected.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// The fitted model failed validation.
    #[error("Model error: {0}")]
    Classify(#[from] ClassifyError),

    /// The data is well-formed but unusable.
    #[error("Invalid data: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<geojson::Error> for SourceError {
    fn from(e: geojson::Error) -> Self {
        Self::GeoJson(Box::new(e))
    }
}

impl SourceError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Reads a whole file into a string, attaching the path to any error.
pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })
}
