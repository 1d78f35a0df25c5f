/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! # holoscat-rs
//!
//! Light scattering by spheres and clusters of spheres for holographic
//! microscopy.
//!
//! A single sphere is handled by Lorenz-Mie theory; a cluster by the
//! T-matrix superposition method, which couples the multipole expansions of
//! all spheres through an iterative solve of the interaction equations and
//! re-expands the result about the cluster centroid. Fields, intensities and
//! scattering cross-sections are available for any target geometry.
//!
//! Lengths may be in any unit as long as radii, positions and wavelength
//! share it. The incident plane wave travels along `-z`.

pub mod cli;
pub mod config;
pub mod optics;
pub mod scatterer;
pub mod target;
pub mod theory;
pub mod tmatrix;
pub mod utils;

pub use config::{MultisphereConfig, RunDescription};
pub use optics::Optics;
pub use scatterer::{Scatterer, Sphere, Spheres, Vector3D};
pub use target::{DetectorGrid, DetectorPoints, Target, VectorField};
pub use theory::{
    determine_theory, Mie, Multisphere, ScatteringError, ScatteringTheory, UnrealizableReason,
};
pub use tmatrix::{MultipoleKernel, SolutionMethod, TmatrixKernel};

use ndarray::ArrayD;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

/// Scattered field of a sphere cluster by the multisphere theory
///
/// # Arguments
///
/// * `scatterer` - The scatterer; anything but a sphere cluster is rejected
/// * `optics` - Medium, wavelength and polarization
/// * `target` - Sample points
/// * `config` - Interaction solve settings
///
/// # Returns
///
/// The scattered field in the target's layout
pub fn compute_scattered_field(
    scatterer: &Scatterer,
    optics: &Optics,
    target: &dyn Target,
    config: &MultisphereConfig,
) -> theory::Result<VectorField> {
    config.validate()?;
    Multisphere::new(*config).calc_field(scatterer, optics, target)
}

/// Scattered field using the theory suited to the scatterer
pub fn calc_field(
    scatterer: &Scatterer,
    optics: &Optics,
    target: &dyn Target,
) -> theory::Result<VectorField> {
    determine_theory(scatterer).calc_field(scatterer, optics, target)
}

/// Scattered intensity using the theory suited to the scatterer
pub fn calc_intensity(
    scatterer: &Scatterer,
    optics: &Optics,
    target: &dyn Target,
) -> theory::Result<ArrayD<f64>> {
    determine_theory(scatterer).calc_intensity(scatterer, optics, target)
}

/// Scattering cross-section using the theory suited to the scatterer
pub fn calc_cross_section(scatterer: &Scatterer, optics: &Optics) -> theory::Result<f64> {
    determine_theory(scatterer).calc_cross_section(scatterer, optics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_single_sphere_dispatch() {
        let sphere = Scatterer::from(Sphere::new(1.59, 0.5, Vector3D::origin()));
        let target = DetectorPoints::new(vec![Vector3D::new(1.0, 0.0, -10.0)]);
        let field = calc_field(&sphere, &Optics::default(), &target).unwrap();
        assert_eq!(field.shape(), &[1]);
        assert!(field.is_finite());

        let err = compute_scattered_field(
            &sphere,
            &Optics::default(),
            &target,
            &MultisphereConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScatteringError::TheoryNotCompatible { .. }));
    }
}
