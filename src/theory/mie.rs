/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Single-sphere (Lorenz-Mie) theory
//!
//! The field of one sphere needs no interaction solve: its outgoing
//! coefficients are the Mie coefficients times the exact plane-wave
//! coefficients. The same wave functions and reconstruction as the
//! multisphere path are used, so the two agree for a one-sphere cluster.

use super::errors::{Result, ScatteringError, UnrealizableReason};
use super::ScatteringTheory;
use crate::optics::Optics;
use crate::scatterer::{Scatterer, Sphere};
use crate::target::{Target, VectorField};
use crate::tmatrix::interaction::plane_wave_coefficients;
use crate::tmatrix::mie::{scattering_efficiency, sphere_order, SphereOrder};
use crate::tmatrix::{tmatrix_fields, MAX_ORDER};
use crate::utils::multipole_terms;
use log::{debug, warn};
use ndarray::Array3;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Lorenz-Mie theory for a single sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mie {
    /// Truncation tolerance of the partial-wave series
    pub truncation_tol: f64,
}

impl Default for Mie {
    fn default() -> Self {
        Self {
            truncation_tol: 1e-12,
        }
    }
}

impl Mie {
    /// Create the theory with a partial-wave truncation tolerance
    pub fn new(truncation_tol: f64) -> Self {
        Self { truncation_tol }
    }

    fn expansion(&self, sphere: &Sphere, optics: &Optics) -> Result<SphereOrder> {
        if !(sphere.r.is_finite() && sphere.r > 0.0) {
            return Err(ScatteringError::unrealizable(
                self.name(),
                sphere,
                UnrealizableReason::NonPositiveRadius { sphere: 0 },
            ));
        }
        let size = sphere.r * optics.wavevec();
        let index = sphere.n / optics.index;
        let order = sphere_order(size, index, self.truncation_tol, MAX_ORDER);
        if !order.converged {
            warn!(
                "Mie series for size parameter {:.1} capped at order {}",
                size, order.order
            );
        }
        Ok(order)
    }
}

impl ScatteringTheory for Mie {
    fn name(&self) -> &'static str {
        "Mie"
    }

    fn raw_field(
        &self,
        scatterer: &Scatterer,
        optics: &Optics,
        target: &dyn Target,
    ) -> Result<VectorField> {
        let sphere = match scatterer {
            Scatterer::Sphere(s) => s,
            other => {
                return Err(ScatteringError::TheoryNotCompatible {
                    theory: self.name().to_string(),
                    scatterer: other.to_string(),
                })
            }
        };

        let order = self.expansion(sphere, optics)?;
        let terms = multipole_terms(order.order);
        let incident = plane_wave_coefficients(order.order);

        let mut amn = Array3::zeros((2, terms, 2));
        for n in 1..=order.order {
            let lo = n * n - 1;
            for idx in lo..lo + 2 * n + 1 {
                for pol in 0..2 {
                    amn[[0, idx, pol]] = -order.b[n] * incident[[idx, pol]];
                    amn[[1, idx, pol]] = -order.a[n] * incident[[terms + idx, pol]];
                }
            }
        }
        debug!("Mie expansion of order {}", order.order);

        let k = optics.wavevec();
        let positions = target.positions_kr_theta_phi(sphere.center, k);
        let fields = tmatrix_fields(positions.view(), amn.view(), order.order, optics.polarization);
        if fields.iter().any(|c| !(c.re.is_finite() && c.im.is_finite())) {
            return Err(ScatteringError::unrealizable(
                self.name(),
                sphere,
                UnrealizableReason::NonFiniteField,
            ));
        }

        let phase = Complex64::from_polar(1.0, -2.0 * PI * sphere.center.z / optics.med_wavelen());
        Ok(target.from_1d(fields)? * phase)
    }

    fn calc_cross_section(&self, scatterer: &Scatterer, optics: &Optics) -> Result<f64> {
        match scatterer {
            Scatterer::Sphere(s) => mie_scattering_cross_section(s, optics),
            other => Err(ScatteringError::TheoryNotCompatible {
                theory: self.name().to_string(),
                scatterer: other.to_string(),
            }),
        }
    }
}

/// Scattering cross-section of a sphere from the Mie series
///
/// `σ = (2π/k²) Σ (2n+1)(|a_n|² + |b_n|²)`
pub fn mie_scattering_cross_section(sphere: &Sphere, optics: &Optics) -> Result<f64> {
    let order = Mie::default().expansion(sphere, optics)?;
    let size = sphere.r * optics.wavevec();
    Ok(scattering_efficiency(size, &order.a, &order.b) * PI * sphere.r * sphere.r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scatterer::{Spheres, Vector3D};
    use crate::target::DetectorPoints;
    use crate::tmatrix::mie::{forward_amplitude, mie_coefficients};
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_clusters() {
        let cluster = Scatterer::from(Spheres::new(vec![Sphere::new(1.5, 0.5, Vector3D::origin())]));
        let target = DetectorPoints::new(vec![Vector3D::new(0.0, 0.0, -5.0)]);
        let err = Mie::default()
            .raw_field(&cluster, &Optics::default(), &target)
            .unwrap_err();
        assert!(matches!(err, ScatteringError::TheoryNotCompatible { .. }));
    }

    #[test]
    fn test_forward_scattering_amplitude() {
        // far downstream, |E| kr -> |S(0)|
        let sphere = Sphere::new(1.59, 0.5, Vector3D::origin());
        let optics = Optics::default();
        let k = optics.wavevec();
        let kr = 1e6;
        let target = DetectorPoints::new(vec![Vector3D::new(0.0, 0.0, -kr / k)]);
        let field = Mie::default()
            .raw_field(&Scatterer::from(sphere), &optics, &target)
            .unwrap();

        let size = sphere.r * k;
        let (a, b) = mie_coefficients(size, Complex64::new(1.59 / 1.33, 0.0), 40);
        let expected = forward_amplitude(&a, &b).norm();

        let e = field.to_flat();
        let magnitude = e.row(0).iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
        assert_relative_eq!(magnitude * kr, expected, max_relative = 1e-3);
        // forward scattering keeps the incident polarization
        assert!(e[[0, 1]].norm() < 1e-6 * e[[0, 0]].norm());
    }

    #[test]
    fn test_cross_section_series_matches_integral() {
        let sphere = Sphere::new(1.5, 0.3, Vector3D::new(0.1, -0.2, 1.0));
        let optics = Optics::default();
        let scatterer = Scatterer::from(sphere);
        let series = Mie::default().calc_cross_section(&scatterer, &optics).unwrap();

        // the default trait method integrates the far field numerically
        struct Integrated(Mie);
        impl ScatteringTheory for Integrated {
            fn name(&self) -> &'static str {
                "Integrated"
            }
            fn raw_field(
                &self,
                scatterer: &Scatterer,
                optics: &Optics,
                target: &dyn Target,
            ) -> Result<VectorField> {
                self.0.raw_field(scatterer, optics, target)
            }
        }
        let integrated = Integrated(Mie::default())
            .calc_cross_section(&scatterer, &optics)
            .unwrap();
        assert_relative_eq!(integrated, series, max_relative = 1e-4);
    }

    #[test]
    fn test_non_positive_radius() {
        let sphere = Sphere::new(1.5, 0.0, Vector3D::origin());
        let target = DetectorPoints::new(vec![Vector3D::new(0.0, 0.0, -5.0)]);
        let err = Mie::default()
            .raw_field(&Scatterer::from(sphere), &Optics::default(), &target)
            .unwrap_err();
        assert_eq!(
            err.reason(),
            Some(&UnrealizableReason::NonPositiveRadius { sphere: 0 })
        );
    }
}
