/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Product quadrature on the unit sphere
//!
//! Gauss-Legendre nodes in `cos θ` times equally spaced azimuths. Projection
//! onto the orthonormal spherical harmonics separates into an azimuthal sum
//! per polar row followed by the polar sum, so one projection costs
//! `O(L³)` rather than `O(L⁴)`.

use crate::scatterer::Vector3D;
use crate::utils::{gauss_legendre, multipole_index, multipole_terms, GaussLegendre, LegendreTable};
use num_complex::Complex64;
use std::f64::consts::PI;
use std::sync::Arc;

/// Extra polar nodes beyond the projection order
const POLAR_MARGIN: usize = 8;

/// Quadrature able to project band-limited functions up to order `lmax`
#[derive(Debug, Clone)]
pub struct SphericalQuadrature {
    lmax: usize,
    rule: Arc<GaussLegendre>,
    n_phi: usize,
    legendre: Vec<LegendreTable>,
    // e^{-imφ_k} for every azimuth k and m = -lmax..=lmax
    azimuthal: Vec<Vec<Complex64>>,
}

impl SphericalQuadrature {
    /// Build a quadrature for projections up to order `lmax`
    pub fn new(lmax: usize) -> Self {
        let n_theta = lmax + POLAR_MARGIN;
        let n_phi = 2 * (lmax + POLAR_MARGIN);
        let rule = gauss_legendre(n_theta);

        let legendre = rule
            .nodes
            .iter()
            .map(|&x| LegendreTable::new(lmax, x, (1.0 - x * x).max(0.0).sqrt()))
            .collect();

        let azimuthal = (0..n_phi)
            .map(|k| {
                let phi = Self::azimuth(k, n_phi);
                (-(lmax as i64)..=lmax as i64)
                    .map(|m| Complex64::from_polar(1.0, -(m as f64) * phi))
                    .collect()
            })
            .collect();

        Self {
            lmax,
            rule,
            n_phi,
            legendre,
            azimuthal,
        }
    }

    fn azimuth(k: usize, n_phi: usize) -> f64 {
        2.0 * PI * k as f64 / n_phi as f64
    }

    /// Projection order
    pub fn lmax(&self) -> usize {
        self.lmax
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.rule.len() * self.n_phi
    }

    /// Whether the quadrature has no nodes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unit vectors of the nodes, polar-row major
    pub fn directions(&self) -> Vec<Vector3D> {
        let mut out = Vec::with_capacity(self.len());
        for &x in &self.rule.nodes {
            let theta = x.clamp(-1.0, 1.0).acos();
            for k in 0..self.n_phi {
                out.push(Vector3D::from_spherical(1.0, theta, Self::azimuth(k, self.n_phi)));
            }
        }
        out
    }

    /// Solid-angle weights of the nodes, in the order of [`Self::directions`]
    pub fn weights(&self) -> Vec<f64> {
        let d_phi = 2.0 * PI / self.n_phi as f64;
        self.rule
            .weights
            .iter()
            .flat_map(|&w| std::iter::repeat(w * d_phi).take(self.n_phi))
            .collect()
    }

    /// Spherical harmonic coefficients `∫ f conj(Y_nm) dΩ` of sampled values
    ///
    /// # Arguments
    ///
    /// * `values` - Samples at the nodes, in the order of [`Self::directions`]
    ///
    /// # Returns
    ///
    /// Coefficients for `n = 1..=lmax` at their flat multipole indices. The
    /// monopole is not returned.
    pub fn project(&self, values: &[Complex64]) -> Vec<Complex64> {
        let lmax = self.lmax as i64;
        let mut coeffs = vec![Complex64::new(0.0, 0.0); multipole_terms(self.lmax)];
        let d_phi = 2.0 * PI / self.n_phi as f64;

        for (a, (table, &weight)) in self.legendre.iter().zip(&self.rule.weights).enumerate() {
            let row = &values[a * self.n_phi..(a + 1) * self.n_phi];

            // azimuthal Fourier sums of this polar row
            let mut fourier = vec![Complex64::new(0.0, 0.0); (2 * lmax + 1) as usize];
            for (value, phases) in row.iter().zip(&self.azimuthal) {
                for (f, phase) in fourier.iter_mut().zip(phases) {
                    *f += value * phase;
                }
            }

            let scale = weight * d_phi;
            for n in 1..=self.lmax {
                for m in -(n as i64)..=n as i64 {
                    let f = fourier[(m + lmax) as usize];
                    coeffs[multipole_index(n, m)] += f * (scale * table.p(n, m));
                }
            }
        }

        coeffs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_node_count() {
        let quad = SphericalQuadrature::new(4);
        assert_eq!(quad.len(), 12 * 24);
        assert_eq!(quad.directions().len(), quad.len());
        assert!(quad.directions().iter().all(|d| (d.length() - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_weights_cover_the_sphere() {
        let quad = SphericalQuadrature::new(6);
        let total: f64 = quad.weights().iter().sum();
        assert_relative_eq!(total, 4.0 * PI, epsilon = 1e-12);

        // ∫ cos²θ dΩ = 4π/3
        let second: f64 = quad
            .weights()
            .iter()
            .zip(quad.directions())
            .map(|(w, d)| w * d.z * d.z)
            .sum();
        assert_relative_eq!(second, 4.0 * PI / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projects_single_harmonic() {
        let quad = SphericalQuadrature::new(5);
        let (n0, m0) = (3usize, -2i64);
        let values: Vec<Complex64> = quad
            .directions()
            .iter()
            .map(|d| {
                let (_, theta, phi) = d.to_spherical();
                let table = LegendreTable::from_theta(5, theta);
                table.p(n0, m0) * Complex64::from_polar(1.0, m0 as f64 * phi)
            })
            .collect();

        let coeffs = quad.project(&values);
        for n in 1..=5usize {
            for m in -(n as i64)..=n as i64 {
                let expected = if (n, m) == (n0, m0) { 1.0 } else { 0.0 };
                let c = coeffs[multipole_index(n, m)];
                assert_relative_eq!(c.re, expected, epsilon = 1e-12);
                assert_relative_eq!(c.im, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_dipole_of_coordinate() {
        // z = sqrt(4π/3) r Y_10
        let quad = SphericalQuadrature::new(3);
        let values: Vec<Complex64> = quad
            .directions()
            .iter()
            .map(|d| Complex64::new(d.z, 0.0))
            .collect();
        let coeffs = quad.project(&values);
        assert_relative_eq!(
            coeffs[multipole_index(1, 0)].re,
            (4.0 * PI / 3.0).sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(coeffs[multipole_index(1, 1)].norm(), 0.0, epsilon = 1e-12);
    }
}
