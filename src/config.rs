/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Calculation settings and run description files

use crate::optics::Optics;
use crate::scatterer::Scatterer;
use crate::target::DetectorGrid;
use crate::theory::{Result, ScatteringError};
use crate::tmatrix::SolutionMethod;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings of the multisphere interaction solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultisphereConfig {
    /// Iteration cap for the interaction-equation solve
    pub max_iterations: usize,
    /// Relative error tolerance of the interaction-equation solve
    pub relative_tolerance: f64,
    /// Interaction-equation solving strategy
    pub method: SolutionMethod,
    /// Truncation tolerance of each sphere's own expansion
    pub single_sphere_truncation_tol: f64,
    /// Truncation tolerance of the cluster expansion
    pub cluster_truncation_tol: f64,
}

impl Default for MultisphereConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            relative_tolerance: 1e-6,
            method: SolutionMethod::OrderOfScattering,
            single_sphere_truncation_tol: 1e-5,
            cluster_truncation_tol: 1e-8,
        }
    }
}

impl MultisphereConfig {
    /// Check that every setting is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ScatteringError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        let tolerances = [
            ("relative_tolerance", self.relative_tolerance),
            ("single_sphere_truncation_tol", self.single_sphere_truncation_tol),
            ("cluster_truncation_tol", self.cluster_truncation_tol),
        ];
        for (name, value) in tolerances {
            if !(value.is_finite() && value > 0.0) {
                return Err(ScatteringError::InvalidParameter(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Everything the command line needs for one calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDescription {
    /// The scatterer
    pub scatterer: Scatterer,
    /// Illumination and medium
    #[serde(default)]
    pub optics: Optics,
    /// Detector plane on which fields are sampled
    pub detector: DetectorGrid,
    /// Multisphere solver settings
    #[serde(default)]
    pub solver: MultisphereConfig,
}

impl RunDescription {
    /// Parse a run description from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let run: Self = serde_json::from_str(text).map_err(|e| {
            ScatteringError::InvalidParameter(format!("malformed run description: {}", e))
        })?;
        run.validate()?;
        Ok(run)
    }

    /// Read and parse a run description file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ScatteringError::InvalidParameter(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Check the optics, detector and solver settings
    pub fn validate(&self) -> Result<()> {
        if !self.optics.is_valid() {
            return Err(ScatteringError::InvalidParameter(format!(
                "unphysical optics: {:?}",
                self.optics
            )));
        }
        DetectorGrid::new(self.detector.shape, self.detector.spacing, self.detector.center)?;
        self.solver.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = MultisphereConfig::default();
        assert_eq!(config.max_iterations, 200);
        assert_eq!(config.relative_tolerance, 1e-6);
        assert_eq!(config.method, SolutionMethod::OrderOfScattering);
        assert_eq!(config.single_sphere_truncation_tol, 1e-5);
        assert_eq!(config.cluster_truncation_tol, 1e-8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MultisphereConfig =
            serde_json::from_str(r#"{"method": "biconjugate_gradient", "max_iterations": 50}"#)
                .unwrap();
        assert_eq!(config.method, SolutionMethod::BiconjugateGradient);
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.cluster_truncation_tol, 1e-8);
    }

    #[rstest]
    #[case(MultisphereConfig { max_iterations: 0, ..Default::default() })]
    #[case(MultisphereConfig { relative_tolerance: 0.0, ..Default::default() })]
    #[case(MultisphereConfig { single_sphere_truncation_tol: -1e-5, ..Default::default() })]
    #[case(MultisphereConfig { cluster_truncation_tol: f64::NAN, ..Default::default() })]
    fn test_invalid_settings(#[case] config: MultisphereConfig) {
        assert!(matches!(
            config.validate(),
            Err(ScatteringError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_run_description() {
        let text = r#"{
            "scatterer": {"type": "spheres", "scatterers": [
                {"n": [1.6, 0.0], "r": 0.5, "center": {"x": -2.0, "y": 0.0, "z": 0.0}},
                {"n": [1.6, 0.0], "r": 0.5, "center": {"x": 2.0, "y": 0.0, "z": 0.0}}
            ]},
            "optics": {"wavelen": 0.66, "index": 1.33, "polarization": [1.0, 0.0]},
            "detector": {"shape": [20, 20], "spacing": [0.1, 0.1],
                         "center": {"x": 0.0, "y": 0.0, "z": -10.0}}
        }"#;
        let run = RunDescription::from_json(text).unwrap();
        assert_eq!(run.solver, MultisphereConfig::default());
        match run.scatterer {
            Scatterer::Spheres(ref c) => assert_eq!(c.len(), 2),
            _ => panic!("expected a sphere cluster"),
        }
    }

    #[test]
    fn test_run_description_rejects_bad_detector() {
        let text = r#"{
            "scatterer": {"type": "sphere", "n": [1.6, 0.0], "r": 0.5,
                          "center": {"x": 0.0, "y": 0.0, "z": 0.0}},
            "detector": {"shape": [4, 4], "spacing": [0.0, 0.1],
                         "center": {"x": 0.0, "y": 0.0, "z": -5.0}}
        }"#;
        assert!(RunDescription::from_json(text).is_err());
    }
}
