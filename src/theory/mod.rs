/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Scattering theories
//!
//! A theory turns a scatterer, an optical context and a target into the
//! scattered electric field at the target's sample points. Each theory
//! supplies only [`ScatteringTheory::raw_field`]; intensities and
//! cross-sections are derived from it once, here.

pub mod errors;
pub mod mie;
pub mod multisphere;

pub use errors::{Result, ScatteringError, UnrealizableReason};
pub use mie::{mie_scattering_cross_section, Mie};
pub use multisphere::{truncate_coefficients, Multisphere};

use crate::config::MultisphereConfig;
use crate::optics::Optics;
use crate::scatterer::Scatterer;
use crate::target::{DetectorPoints, Target, VectorField};
use crate::tmatrix::SphericalQuadrature;
use ndarray::ArrayD;

/// Nondimensional radius at which the far field is sampled
const FAR_FIELD_KR: f64 = 1e7;

/// Capability interface shared by all scattering theories
pub trait ScatteringTheory: Send + Sync {
    /// Human readable theory name used in error messages
    fn name(&self) -> &'static str;

    /// Scattered field of `scatterer` at the target's sample points
    ///
    /// The incident wave has unit amplitude, travels along `-z` and has
    /// zero phase at `z = 0`.
    fn raw_field(
        &self,
        scatterer: &Scatterer,
        optics: &Optics,
        target: &dyn Target,
    ) -> Result<VectorField>;

    /// Scattered field after checking the optical context
    fn calc_field(
        &self,
        scatterer: &Scatterer,
        optics: &Optics,
        target: &dyn Target,
    ) -> Result<VectorField> {
        if !optics.is_valid() {
            return Err(ScatteringError::InvalidParameter(format!(
                "unphysical optics: {:?}",
                optics
            )));
        }
        self.raw_field(scatterer, optics, target)
    }

    /// Scattered intensity `|E|²` at the target's sample points
    fn calc_intensity(
        &self,
        scatterer: &Scatterer,
        optics: &Optics,
        target: &dyn Target,
    ) -> Result<ArrayD<f64>> {
        Ok(self.calc_field(scatterer, optics, target)?.intensity())
    }

    /// Scattering cross-section, in squared length units
    ///
    /// Integrates the far-field intensity over a sphere centred on the
    /// scatterer, normalized by the incident intensity.
    fn calc_cross_section(&self, scatterer: &Scatterer, optics: &Optics) -> Result<f64> {
        let k = optics.wavevec();
        let size = scatterer.bounding_radius() * k;
        let order = (size + 4.0 * size.cbrt() + 2.0).ceil() as usize + 10;
        let quadrature = SphericalQuadrature::new(order);

        let radius = FAR_FIELD_KR / k;
        let origin = scatterer.centroid();
        let points = DetectorPoints::new(
            quadrature
                .directions()
                .into_iter()
                .map(|d| origin + d * radius)
                .collect(),
        );

        let intensity = self.calc_intensity(scatterer, optics, &points)?;
        let [px, py] = optics.polarization;
        let incident = px * px + py * py;

        let flux: f64 = intensity
            .iter()
            .zip(quadrature.weights())
            .map(|(i, w)| i * w)
            .sum();
        Ok(flux * radius * radius / incident)
    }
}

/// Choose the theory suited to a scatterer
///
/// A single sphere is handled by [`Mie`], a cluster by [`Multisphere`].
pub fn determine_theory(scatterer: &Scatterer) -> Box<dyn ScatteringTheory> {
    match scatterer {
        Scatterer::Sphere(_) => Box::new(Mie::default()),
        Scatterer::Spheres(_) => Box::new(Multisphere::new(MultisphereConfig::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scatterer::{Sphere, Spheres, Vector3D};

    #[test]
    fn test_determine_theory() {
        let sphere = Scatterer::from(Sphere::new(1.6, 0.5, Vector3D::origin()));
        assert_eq!(determine_theory(&sphere).name(), "Mie");

        let cluster = Scatterer::from(Spheres::new(vec![
            Sphere::new(1.6, 0.5, Vector3D::new(-1.0, 0.0, 0.0)),
            Sphere::new(1.6, 0.5, Vector3D::new(1.0, 0.0, 0.0)),
        ]));
        assert_eq!(determine_theory(&cluster).name(), "Multisphere");
    }
}
