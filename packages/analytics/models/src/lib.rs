#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Site, feature vector and analysis result types.
//!
//! These types are shared between the dataset loaders, the analytics
//! engine and the presentation layer. Field names serialize to the
//! attribute names used by the site dataset (`Nearby_Count_500`,
//! `Nearest_Road_Distance`, `Cluster`, ...).

use serde::{Deserialize, Serialize};
use site_map_geometry::GeoPoint;
use strum_macros::{AsRefStr, Display, EnumString};

/// Buffer radii (meters) for the four proximity counts, in feature order.
pub const PROXIMITY_RADII_M: [f64; 4] = [500.0, 1000.0, 2000.0, 3000.0];

/// Number of features in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 6;

/// Default per-axis tolerance, in degrees, for matching a click to a site.
pub const DEFAULT_MATCH_TOLERANCE_DEG: f64 = 1e-4;

/// Feature names in the order the clustering model was fitted on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Nearby_Count_500",
    "Nearby_Count_1000",
    "Nearby_Count_2000",
    "Nearby_Count_3000",
    "Nearest_Transit_Distance",
    "Nearest_Road_Distance",
];

/// One of the four buffer radii used for proximity counts.
///
/// Parses from and displays as the radius in meters (`"500"`, `"1000"`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
pub enum ProximityTier {
    #[strum(serialize = "500")]
    M500,
    #[strum(serialize = "1000")]
    M1000,
    #[strum(serialize = "2000")]
    M2000,
    #[strum(serialize = "3000")]
    M3000,
}

impl ProximityTier {
    /// Buffer radius in meters.
    #[must_use]
    pub const fn radius_m(self) -> f64 {
        match self {
            Self::M500 => PROXIMITY_RADII_M[0],
            Self::M1000 => PROXIMITY_RADII_M[1],
            Self::M2000 => PROXIMITY_RADII_M[2],
            Self::M3000 => PROXIMITY_RADII_M[3],
        }
    }

    /// Returns all tiers in feature order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::M500, Self::M1000, Self::M2000, Self::M3000]
    }
}

/// Final cluster label assigned to a site.
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
#[serde(try_from = "u8", into = "u8")]
pub enum Cluster {
    #[strum(serialize = "1")]
    One = 1,
    #[strum(serialize = "2")]
    Two = 2,
    #[strum(serialize = "3")]
    Three = 3,
}

impl Cluster {
    /// Returns the numeric label.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a cluster from its numeric label.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not 1, 2 or 3.
    pub const fn from_value(value: u8) -> Result<Self, InvalidClusterError> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            _ => Err(InvalidClusterError { value }),
        }
    }

    /// Marker color used when drawing sites of this cluster.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::One => "#2e5777",
            Self::Two => "#0194d3",
            Self::Three => "#3d7527",
        }
    }

    /// Layer name shown in map legends.
    #[must_use]
    pub const fn layer_name(self) -> &'static str {
        match self {
            Self::One => "Cluster 1 Sites",
            Self::Two => "Cluster 2 Sites",
            Self::Three => "Cluster 3 Sites",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::One, Self::Two, Self::Three]
    }
}

impl TryFrom<u8> for Cluster {
    type Error = InvalidClusterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Cluster> for u8 {
    fn from(cluster: Cluster) -> Self {
        cluster.value()
    }
}

/// Error returned when a numeric cluster label is not 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidClusterError {
    /// The invalid cluster value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidClusterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid cluster label {}: expected 1-3", self.value)
    }
}

impl std::error::Error for InvalidClusterError {}

/// The six numeric features describing a location.
///
/// Order is fixed: four call counts at [`PROXIMITY_RADII_M`], then the
/// nearest transit distance, then the nearest road distance. The
/// clustering model was fitted on exactly this order; see
/// [`FeatureVector::to_array`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Calls within 500 m.
    #[serde(rename = "Nearby_Count_500")]
    pub nearby_count_500: u64,
    /// Calls within 1000 m.
    #[serde(rename = "Nearby_Count_1000")]
    pub nearby_count_1000: u64,
    /// Calls within 2000 m.
    #[serde(rename = "Nearby_Count_2000")]
    pub nearby_count_2000: u64,
    /// Calls within 3000 m.
    #[serde(rename = "Nearby_Count_3000")]
    pub nearby_count_3000: u64,
    /// Meters to the nearest transit line.
    #[serde(rename = "Nearest_Transit_Distance")]
    pub nearest_transit_distance: f64,
    /// Meters to the nearest road.
    #[serde(rename = "Nearest_Road_Distance")]
    pub nearest_road_distance: f64,
}

impl FeatureVector {
    /// Assembles a vector from counts ordered by [`PROXIMITY_RADII_M`] and
    /// the two nearest distances.
    #[must_use]
    pub const fn new(counts: [u64; 4], nearest_transit: f64, nearest_road: f64) -> Self {
        Self {
            nearby_count_500: counts[0],
            nearby_count_1000: counts[1],
            nearby_count_2000: counts[2],
            nearby_count_3000: counts[3],
            nearest_transit_distance: nearest_transit,
            nearest_road_distance: nearest_road,
        }
    }

    /// Proximity counts ordered by [`PROXIMITY_RADII_M`].
    #[must_use]
    pub const fn counts(&self) -> [u64; 4] {
        [
            self.nearby_count_500,
            self.nearby_count_1000,
            self.nearby_count_2000,
            self.nearby_count_3000,
        ]
    }

    /// Count for one proximity tier.
    #[must_use]
    pub const fn count(&self, tier: ProximityTier) -> u64 {
        match tier {
            ProximityTier::M500 => self.nearby_count_500,
            ProximityTier::M1000 => self.nearby_count_1000,
            ProximityTier::M2000 => self.nearby_count_2000,
            ProximityTier::M3000 => self.nearby_count_3000,
        }
    }

    /// Whether counts never decrease as the radius grows.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.counts().windows(2).all(|w| w[0] <= w[1])
    }

    /// Numeric features in model order (see [`FEATURE_NAMES`]).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.nearby_count_500 as f64,
            self.nearby_count_1000 as f64,
            self.nearby_count_2000 as f64,
            self.nearby_count_3000 as f64,
            self.nearest_transit_distance,
            self.nearest_road_distance,
        ]
    }
}

/// A catalogued candidate site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Stable index of the site within the loaded dataset.
    pub id: usize,
    /// Site location in degrees.
    pub point: GeoPoint,
    /// Site type (e.g. "Library", "Fire Station").
    #[serde(rename = "Type")]
    pub site_type: String,
    /// Street address.
    #[serde(rename = "Address")]
    pub address: String,
    /// City name.
    #[serde(rename = "City")]
    pub city: String,
    /// Stored cluster label.
    #[serde(rename = "Cluster")]
    pub cluster: Cluster,
    /// Precomputed feature values.
    #[serde(flatten)]
    pub features: FeatureVector,
}

/// Which branch of click analysis produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum AnalysisKind {
    /// The click landed on a catalogued site.
    MatchedSite,
    /// The click was analyzed from scratch.
    NovelPoint,
}

/// Result bundle handed to the presentation layer for one click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AnalysisResult {
    /// The click matched a catalogued site; values are the stored ones.
    MatchedSite {
        /// Matched site identifier.
        site_id: usize,
        /// Stored site location.
        point: GeoPoint,
        /// Stored feature values.
        #[serde(flatten)]
        features: FeatureVector,
        /// Stored cluster label.
        #[serde(rename = "Cluster")]
        cluster: Cluster,
    },
    /// The click was a new location; values were computed on demand.
    NovelPoint {
        /// Clicked location.
        point: GeoPoint,
        /// Computed feature values.
        #[serde(flatten)]
        features: FeatureVector,
        /// Predicted cluster label.
        #[serde(rename = "Cluster")]
        cluster: Cluster,
    },
}

impl AnalysisResult {
    /// Builds a matched-site result from a catalogued site.
    #[must_use]
    pub const fn matched(site: &Site) -> Self {
        Self::MatchedSite {
            site_id: site.id,
            point: site.point,
            features: site.features,
            cluster: site.cluster,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> AnalysisKind {
        match self {
            Self::MatchedSite { .. } => AnalysisKind::MatchedSite,
            Self::NovelPoint { .. } => AnalysisKind::NovelPoint,
        }
    }

    /// Matched site identifier, if any.
    #[must_use]
    pub const fn site_id(&self) -> Option<usize> {
        match self {
            Self::MatchedSite { site_id, .. } => Some(*site_id),
            Self::NovelPoint { .. } => None,
        }
    }

    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        match self {
            Self::MatchedSite { point, .. } | Self::NovelPoint { point, .. } => *point,
        }
    }

    #[must_use]
    pub const fn features(&self) -> &FeatureVector {
        match self {
            Self::MatchedSite { features, .. } | Self::NovelPoint { features, .. } => features,
        }
    }

    #[must_use]
    pub const fn cluster(&self) -> Cluster {
        match self {
            Self::MatchedSite { cluster, .. } | Self::NovelPoint { cluster, .. } => *cluster,
        }
    }
}
