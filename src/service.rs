//! Prediction on top of an externally trained correction model.
//!
//! A [`PredictionService`] is built once at startup from a model and the
//! feature-name list saved with it, and is read-only afterwards.

use crate::types::feature_vector::{FeatureVector, FEATURE_NAMES};
use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to read feature names file '{0}'")]
    FeatureNamesRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse feature names file '{0}'")]
    FeatureNamesParse(PathBuf, #[source] serde_json::Error),

    #[error("Model expects feature '{0}' which is not extracted")]
    UnknownFeature(String),

    #[error("Model expects no features")]
    EmptyFeatureList,
}

/// A trained regressor consuming features positionally.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> f64;
}

impl<F> Regressor for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn predict(&self, features: &[f64]) -> f64 {
        self(features)
    }
}

pub struct PredictionService<R> {
    regressor: R,
    feature_names: Vec<String>,
    /// Position of each model input within [`FEATURE_NAMES`].
    positions: Vec<usize>,
}

impl<R: Regressor> PredictionService<R> {
    /// Pairs `regressor` with the feature order it was trained on.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnknownFeature`] when a name is not produced by the
    /// extractor, [`ServiceError::EmptyFeatureList`] when there are none.
    pub fn new(regressor: R, feature_names: Vec<String>) -> Result<Self, ServiceError> {
        if feature_names.is_empty() {
            return Err(ServiceError::EmptyFeatureList);
        }
        let positions = feature_names
            .iter()
            .map(|name| {
                FEATURE_NAMES
                    .iter()
                    .position(|known| *known == name.as_str())
                    .ok_or_else(|| ServiceError::UnknownFeature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PredictionService {
            regressor,
            feature_names,
            positions,
        })
    }

    /// Loads the feature order from a JSON list of names.
    pub fn from_feature_names_file(regressor: R, path: &Path) -> Result<Self, ServiceError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::FeatureNamesRead(path.to_path_buf(), e))?;
        let names: Vec<String> = serde_json::from_str(&json)
            .map_err(|e| ServiceError::FeatureNamesParse(path.to_path_buf(), e))?;
        info!("Loaded {} feature names from {}", names.len(), path.display());
        Self::new(regressor, names)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Model input for `features`, ordered as the model expects.
    pub fn model_input(&self, features: &FeatureVector) -> Vec<f64> {
        let values = features.to_values();
        self.positions.iter().map(|&idx| values[idx]).collect()
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.regressor.predict(&self.model_input(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector {
            no2_column_center: 5e15,
            physics_prediction: 12.0,
            wind_speed: 3.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_reorders_by_persisted_names() {
        let service = PredictionService::new(
            |x: &[f64]| x[0] * 10.0 + x[1],
            vec!["wind_speed".to_string(), "physics_prediction".to_string()],
        )
        .unwrap();
        assert_eq!(service.model_input(&features()), vec![3.0, 12.0]);
        assert_eq!(service.predict(&features()), 42.0);
    }

    #[test]
    fn test_unknown_feature_fails_fast() {
        let result = PredictionService::new(|_: &[f64]| 0.0, vec!["elevation".to_string()]);
        assert!(matches!(result, Err(ServiceError::UnknownFeature(name)) if name == "elevation"));

        let empty = PredictionService::new(|_: &[f64]| 0.0, vec![]);
        assert!(matches!(empty, Err(ServiceError::EmptyFeatureList)));
    }

    #[test]
    fn test_loads_feature_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_names.json");
        crate::pipeline::dataset::write_feature_names(&path).unwrap();

        let service =
            PredictionService::from_feature_names_file(|x: &[f64]| x.len() as f64, &path).unwrap();
        assert_eq!(service.feature_names().len(), FEATURE_NAMES.len());
        assert_eq!(service.model_input(&features()), features().to_values());
        assert_eq!(service.predict(&features()), FEATURE_NAMES.len() as f64);

        std::fs::write(&path, "not json").unwrap();
        let err = PredictionService::from_feature_names_file(|_: &[f64]| 0.0, &path).err();
        assert!(matches!(err, Some(ServiceError::FeatureNamesParse(..))));
    }
}
