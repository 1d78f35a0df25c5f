/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the scattering theories

use crate::target::TargetError;
use crate::tmatrix::SolutionMethod;
use thiserror::Error;

/// Result type for scattering calculations
pub type Result<T> = std::result::Result<T, ScatteringError>;

/// Why a scatterer cannot be evaluated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnrealizableReason {
    /// A sphere is too large compared with the wavelength
    #[error("radius of sphere {sphere} too large, field calculation would take forever")]
    RadiusTooLarge { sphere: usize },

    /// The spheres are too far apart compared with the wavelength
    #[error("particle separation too large, calculation would take forever")]
    SeparationTooLarge,

    /// The reconstructed field contains NaN or infinite values
    #[error("computed fields are not finite; the calculation probably failed to converge")]
    NonFiniteField,

    /// A sphere has a zero, negative or non-finite radius
    #[error("sphere {sphere} has a non-positive radius")]
    NonPositiveRadius { sphere: usize },
}

/// Scattering calculation failures
#[derive(Error, Debug)]
pub enum ScatteringError {
    /// The theory cannot handle this kind of scatterer
    #[error("{theory} theory is not compatible with scatterer {scatterer}")]
    TheoryNotCompatible { theory: String, scatterer: String },

    /// The physical configuration cannot be evaluated
    #[error("{theory} cannot compute scatterer {scatterer}: {reason}")]
    UnrealizableScatterer {
        theory: String,
        scatterer: String,
        reason: UnrealizableReason,
    },

    /// The kernel's coefficients contain non-finite values
    #[error(
        "internal expansion for multisphere coefficients is not finite, \
         this probably means the scatterer is unphysical"
    )]
    ExpansionNaN,

    /// The interaction solve did not reach the tolerance
    #[error(
        "multisphere calculation failed to converge within {max_iterations} iterations \
         using {method}; the scatterer is probably unphysical, or just huge"
    )]
    ConvergenceFailure {
        max_iterations: usize,
        method: SolutionMethod,
    },

    /// The target geometry cannot receive the computed values
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// A calculation parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ScatteringError {
    /// Build an [`ScatteringError::UnrealizableScatterer`] for a theory and scatterer
    pub fn unrealizable(
        theory: &str,
        scatterer: &impl std::fmt::Display,
        reason: UnrealizableReason,
    ) -> Self {
        ScatteringError::UnrealizableScatterer {
            theory: theory.to_string(),
            scatterer: scatterer.to_string(),
            reason,
        }
    }

    /// The unrealizability reason, if this is such an error
    pub fn reason(&self) -> Option<&UnrealizableReason> {
        match self {
            ScatteringError::UnrealizableScatterer { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<TargetError> for ScatteringError {
    fn from(err: TargetError) -> Self {
        ScatteringError::InvalidTarget(err.to_string())
    }
}
