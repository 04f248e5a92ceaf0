//! Fitted clustering model loading.

use std::path::Path;

use site_map_analytics::{ClassifyError, FittedModel};
use site_map_analytics_models::FEATURE_COUNT;

use crate::SourceError;

/// Loads a fitted model from a JSON file.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read,
/// [`SourceError::Json`] if it is not a valid model document, or
/// [`SourceError::Classify`] if the model was fitted on a different number
/// of features than the site feature vector has.
pub fn load_model(path: &Path) -> Result<FittedModel, SourceError> {
    let model = parse_model(&crate::read_to_string(path)?)?;

    log::info!(
        "Loaded model with {} centroids from {}",
        model.centroid_count(),
        path.display()
    );

    Ok(model)
}

/// Parses a fitted model from JSON text.
///
/// # Errors
///
/// See [`load_model`].
pub fn parse_model(contents: &str) -> Result<FittedModel, SourceError> {
    let model: FittedModel = serde_json::from_str(contents)?;

    if model.dimension() != FEATURE_COUNT {
        return Err(ClassifyError::DimensionMismatch {
            expected: FEATURE_COUNT,
            found: model.dimension(),
        }
        .into());
    }

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "mean_": [1, 1, 1, 1, 100, 50],
        "scale_": [1, 1, 1, 1, 50, 10],
        "cluster_centers_": [
            [0, 0, 0, 0, 0, 0],
            [1, 4, 9, 14, 1, -1],
            [5, 5, 5, 5, 5, 5],
            [-3, -3, -3, -3, -3, -3]
        ]
    }"#;

    #[test]
    fn parses_estimator_export() {
        let model = parse_model(MODEL).unwrap();
        assert_eq!(model.dimension(), 6);
        assert_eq!(model.centroid_count(), 4);
    }

    #[test]
    fn rejects_models_of_the_wrong_dimension() {
        let result = parse_model(
            r#"{"center": [0, 0], "scale": [1, 1], "centroids": [[0, 0]]}"#,
        );
        assert!(matches!(
            result,
            Err(SourceError::Classify(ClassifyError::DimensionMismatch {
                expected: 6,
                found: 2,
            }))
        ));
    }

    #[test]
    fn rejects_zero_scale() {
        let result = parse_model(&MODEL.replace("[1, 1, 1, 1, 50, 10]", "[1, 1, 0, 1, 50, 10]"));
        match result {
            Err(SourceError::Json(e)) => assert!(e.to_string().contains("Invalid scale"), "{e}"),
            other => panic!("expected a JSON error, got {other:?}"),
        }
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, MODEL).unwrap();

        assert_eq!(load_model(&path).unwrap().centroid_count(), 4);
    }
}
