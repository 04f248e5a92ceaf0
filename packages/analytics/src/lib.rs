#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Site analytics engine.
//!
//! Turns a clicked coordinate into a feature vector and a cluster label:
//!
//! 1. [`features`] projects the point into meters and measures call counts
//!    and network distances against the loaded reference layers.
//! 2. [`classifier`] standardizes the vector, assigns the nearest fitted
//!    centroid and remaps the raw centroid index to a final [`Cluster`].
//! 3. [`orchestrator`] decides whether a click is a catalogued site (pure
//!    lookup in the [`catalog`]) or a novel point needing the full
//!    pipeline, and suppresses repeated identical clicks.
//!
//! All reference data is passed in explicitly by shared reference; the
//! only mutable state is the orchestrator's last-click memory.

pub mod catalog;
pub mod classifier;
pub mod features;
pub mod orchestrator;

use site_map_geometry::GeometryError;
use site_map_spatial::SpatialError;

pub use catalog::SiteCatalog;
pub use classifier::{CLUSTER_REMAP, ClassifyError, FittedModel, classify, remap_centroid_index};
pub use features::{AnalysisPipeline, PointAnalysis, PointAnalyzer, build_feature_vector};
pub use orchestrator::{ClickKey, ClickOrchestrator, ClickOutcome, ClickState};
pub use site_map_analytics_models::{
    AnalysisKind, AnalysisResult, Cluster, DEFAULT_MATCH_TOLERANCE_DEG, FeatureVector, Site,
};

/// Errors surfaced while analyzing a click.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    /// Projection or CRS tagging failed.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// A proximity or distance query failed.
    #[error("Spatial error: {0}")]
    Spatial(#[from] SpatialError),

    /// The classifier rejected the feature vector or model output.
    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    /// The click coordinate was not a finite latitude/longitude.
    #[error("Invalid click coordinate ({lat}, {lon})")]
    InvalidClick {
        /// Clicked latitude.
        lat: f64,
        /// Clicked longitude.
        lon: f64,
    },
}
