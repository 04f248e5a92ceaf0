//! Nearest-centroid cluster assignment with a pre-fitted scaler.
//!
//! The model is an opaque fitted artifact: per-feature center and scale
//! from a standard scaler, plus k-means centroids expressed in the scaled
//! space. Classification never refits anything.

use serde::Deserialize;
use site_map_analytics_models::{Cluster, FeatureVector};

/// Raw centroid index to final cluster label.
///
/// The fitted model has four centroids; two of them describe the same kind
/// of site and share label 1.
pub const CLUSTER_REMAP: [(usize, Cluster); 4] = [
    (0, Cluster::One),
    (1, Cluster::Two),
    (2, Cluster::One),
    (3, Cluster::Three),
];

/// Errors from model validation and classification.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    /// A vector or model component has the wrong number of features.
    #[error("Dimension mismatch: expected {expected} features, found {found}")]
    DimensionMismatch {
        /// Dimension the model was fitted on.
        expected: usize,
        /// Dimension actually supplied.
        found: usize,
    },

    /// The nearest centroid has no entry in [`CLUSTER_REMAP`].
    #[error("Centroid index {0} has no cluster label mapping")]
    UnknownCentroidIndex(usize),

    /// The model defines no centroids.
    #[error("Model has no centroids")]
    NoCentroids,

    /// A scale factor is zero or not finite.
    #[error("Invalid scale {value} for feature {feature}")]
    InvalidScale {
        /// Feature position.
        feature: usize,
        /// Offending scale value.
        value: f64,
    },

    /// An input feature is NaN or infinite.
    #[error("Feature {feature} is not a finite number")]
    NonFiniteFeature {
        /// Feature position.
        feature: usize,
    },

    /// A fitted center or centroid component is NaN or infinite.
    /// `centroid` is `None` for the scaler center.
    #[error("Model parameter for feature {feature} is not a finite number (centroid {centroid:?})")]
    NonFiniteParameter {
        /// Centroid index, or `None` for the center.
        centroid: Option<usize>,
        /// Feature position.
        feature: usize,
    },

    /// The distance to a centroid overflowed or was undefined.
    #[error("Distance to centroid {centroid} is not a finite number")]
    NonFiniteDistance {
        /// Centroid index.
        centroid: usize,
    },
}

/// Maps a raw centroid index through [`CLUSTER_REMAP`].
///
/// # Errors
///
/// Returns [`ClassifyError::UnknownCentroidIndex`] for indices absent from
/// the table.
pub fn remap_centroid_index(raw: usize) -> Result<Cluster, ClassifyError> {
    CLUSTER_REMAP
        .iter()
        .find(|(index, _)| *index == raw)
        .map(|(_, cluster)| *cluster)
        .ok_or(ClassifyError::UnknownCentroidIndex(raw))
}

/// Serialized form of a fitted model.
///
/// Accepts either plain names or the attribute names of the fitted
/// scikit-learn estimators (`mean_`, `scale_`, `cluster_centers_`).
#[derive(Debug, Deserialize)]
struct ModelParameters {
    #[serde(alias = "mean_")]
    center: Vec<f64>,
    #[serde(alias = "scale_")]
    scale: Vec<f64>,
    #[serde(alias = "cluster_centers_")]
    centroids: Vec<Vec<f64>>,
}

/// A validated standardization transform plus centroids.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ModelParameters")]
pub struct FittedModel {
    center: Vec<f64>,
    scale: Vec<f64>,
    centroids: Vec<Vec<f64>>,
}

impl TryFrom<ModelParameters> for FittedModel {
    type Error = ClassifyError;

    fn try_from(params: ModelParameters) -> Result<Self, Self::Error> {
        Self::new(params.center, params.scale, params.centroids)
    }
}

impl FittedModel {
    /// Validates and wraps fitted parameters.
    ///
    /// # Errors
    ///
    /// * [`ClassifyError::DimensionMismatch`] if `scale` or any centroid
    ///   differs in length from `center`.
    /// * [`ClassifyError::NoCentroids`] if `centroids` is empty.
    /// * [`ClassifyError::InvalidScale`] if any scale is zero or not finite.
    /// * [`ClassifyError::NonFiniteParameter`] if a center or centroid
    ///   component is NaN or infinite.
    pub fn new(
        center: Vec<f64>,
        scale: Vec<f64>,
        centroids: Vec<Vec<f64>>,
    ) -> Result<Self, ClassifyError> {
        let expected = center.len();
        check_dimension(expected, scale.len())?;

        if centroids.is_empty() {
            return Err(ClassifyError::NoCentroids);
        }
        for centroid in &centroids {
            check_dimension(expected, centroid.len())?;
        }

        if let Some((feature, value)) = scale
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_finite() || **s == 0.0)
        {
            return Err(ClassifyError::InvalidScale {
                feature,
                value: *value,
            });
        }

        if let Some(feature) = center.iter().position(|c| !c.is_finite()) {
            return Err(ClassifyError::NonFiniteParameter {
                centroid: None,
                feature,
            });
        }
        for (index, centroid) in centroids.iter().enumerate() {
            if let Some(feature) = centroid.iter().position(|c| !c.is_finite()) {
                return Err(ClassifyError::NonFiniteParameter {
                    centroid: Some(index),
                    feature,
                });
            }
        }

        Ok(Self {
            center,
            scale,
            centroids,
        })
    }

    /// Number of features the model expects.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.center.len()
    }

    #[must_use]
    pub fn centroid_count(&self) -> usize {
        self.centroids.len()
    }

    /// Applies `z_i = (x_i - center_i) / scale_i`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::DimensionMismatch`] if `vector` has the
    /// wrong length, or [`ClassifyError::NonFiniteFeature`] if it contains
    /// NaN or infinity.
    pub fn standardize(&self, vector: &[f64]) -> Result<Vec<f64>, ClassifyError> {
        check_dimension(self.dimension(), vector.len())?;

        if let Some(feature) = vector.iter().position(|x| !x.is_finite()) {
            return Err(ClassifyError::NonFiniteFeature { feature });
        }

        Ok(vector
            .iter()
            .zip(&self.center)
            .zip(&self.scale)
            .map(|((x, center), scale)| (x - center) / scale)
            .collect())
    }

    /// Index of the centroid closest to an already standardized vector.
    ///
    /// Ties resolve to the lowest index.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::DimensionMismatch`] if `standardized` has
    /// the wrong length, or [`ClassifyError::NonFiniteDistance`] if any
    /// centroid distance is NaN or infinite.
    pub fn nearest_centroid(&self, standardized: &[f64]) -> Result<usize, ClassifyError> {
        check_dimension(self.dimension(), standardized.len())?;

        let mut best: Option<(usize, f64)> = None;
        for (index, centroid) in self.centroids.iter().enumerate() {
            let distance = squared_distance(standardized, centroid);
            if !distance.is_finite() {
                return Err(ClassifyError::NonFiniteDistance { centroid: index });
            }
            if best.is_none_or(|(_, nearest)| distance < nearest) {
                best = Some((index, distance));
            }
        }

        best.map(|(index, _)| index).ok_or(ClassifyError::NoCentroids)
    }
}

/// Classifies a raw (unstandardized) feature vector.
///
/// # Errors
///
/// * [`ClassifyError::DimensionMismatch`] if `vector.len()` differs from
///   the model dimension.
/// * [`ClassifyError::NonFiniteFeature`] for NaN or infinite input.
/// * [`ClassifyError::NonFiniteDistance`] if a centroid distance
///   overflows.
/// * [`ClassifyError::UnknownCentroidIndex`] if the nearest centroid has
///   no remap entry.
pub fn classify(vector: &[f64], model: &FittedModel) -> Result<Cluster, ClassifyError> {
    let standardized = model.standardize(vector)?;
    let raw = model.nearest_centroid(&standardized)?;
    log::trace!("Nearest centroid {raw} for standardized vector {standardized:?}");
    remap_centroid_index(raw)
}

/// Classifies a [`FeatureVector`] in model feature order.
///
/// # Errors
///
/// See [`classify`].
pub fn classify_features(
    features: &FeatureVector,
    model: &FittedModel,
) -> Result<Cluster, ClassifyError> {
    classify(&features.to_array(), model)
}

const fn check_dimension(expected: usize, found: usize) -> Result<(), ClassifyError> {
    if expected == found {
        Ok(())
    } else {
        Err(ClassifyError::DimensionMismatch { expected, found })
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
