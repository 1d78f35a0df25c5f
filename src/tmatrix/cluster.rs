/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Cluster-centred expansion of the scattered field
//!
//! The outgoing waves of all spheres are summed on a sphere enclosing the
//! cluster and re-expanded as a single outgoing series about the centroid.
//! Outside the enclosing sphere the two descriptions agree, and the single
//! series is what the reconstruction step evaluates.

use super::interaction::{block_offsets, SphereSite};
use super::quadrature::SphericalQuadrature;
use super::vswf::{radial_component, WaveFunctions};
use super::MAX_ORDER;
use crate::utils::{multipole_terms, spherical_hankel_array};
use faer::col;
use log::debug;
use ndarray::Array3;
use num_complex::Complex64;
use rayon::prelude::*;

/// Orders added to the estimated cluster bandwidth
const ORDER_MARGIN: usize = 10;

/// Coefficients of the scattered field about the cluster centroid
#[derive(Debug, Clone)]
pub struct ClusterExpansion {
    /// Truncation order chosen from `qeps2`
    pub lmax: usize,
    /// Order up to which coefficients were computed
    pub computed_order: usize,
    /// Coefficients, shape `(2, terms(computed_order), 2)`
    pub coefficients: Array3<Complex64>,
    /// Whether the truncation criterion was met below the order cap
    pub converged: bool,
}

/// Expansion order the cluster needs before truncation
pub fn cluster_order(sites: &[SphereSite]) -> (usize, bool) {
    let reach = sites
        .iter()
        .map(|s| s.center.length())
        .fold(0.0_f64, f64::max)
        .ceil() as usize;
    let widest = sites.iter().map(SphereSite::order).max().unwrap_or(1);
    let wanted = widest + reach + ORDER_MARGIN;
    (wanted.min(MAX_ORDER), wanted <= MAX_ORDER)
}

/// Re-expand the spheres' scattered waves about the origin
///
/// # Arguments
///
/// * `sites` - The spheres, centers relative to the centroid
/// * `solutions` - Concatenated scattered coefficients for each incident
///   polarization basis state
/// * `qeps2` - Relative tail power allowed beyond the truncation order
///
/// # Returns
///
/// The expansion with its truncation order
pub fn cluster_expansion(
    sites: &[SphereSite],
    solutions: &[col::Col<Complex64>; 2],
    qeps2: f64,
) -> ClusterExpansion {
    let (order, uncapped) = cluster_order(sites);
    let radius = sites
        .iter()
        .map(|s| s.center.length() + s.size)
        .fold(0.0_f64, f64::max);
    let offsets = block_offsets(sites);
    let quadrature = SphericalQuadrature::new(order);

    // u = r·E and v = r·(∇×E)/k of the summed outgoing field, per polarization
    let samples: Vec<[Complex64; 4]> = quadrature
        .directions()
        .into_par_iter()
        .map(|direction| {
            let point = direction * radius;
            let mut acc = [Complex64::new(0.0, 0.0); 4];
            for (site, &offset) in sites.iter().zip(&offsets) {
                let terms = site.terms();
                let wf = WaveFunctions::at(site.order(), point - site.center);
                for b in 0..terms {
                    let rm = radial_component(point, &wf.m[b]);
                    let rn = radial_component(point, &wf.n[b]);
                    for (pol, solution) in solutions.iter().enumerate() {
                        let e = solution[offset + b];
                        let f = solution[offset + terms + b];
                        acc[2 * pol] += e * rm + f * rn;
                        acc[2 * pol + 1] += e * rn + f * rm;
                    }
                }
            }
            acc
        })
        .collect();

    let hankel = spherical_hankel_array(order, radius);
    let terms = multipole_terms(order);
    let mut coefficients = Array3::zeros((2, terms, 2));
    for pol in 0..2 {
        let u: Vec<Complex64> = samples.iter().map(|s| s[2 * pol]).collect();
        let v: Vec<Complex64> = samples.iter().map(|s| s[2 * pol + 1]).collect();
        let m_coeffs = quadrature.project(&v);
        let n_coeffs = quadrature.project(&u);
        for n in 1..=order {
            let scale = hankel[n] * (n * (n + 1)) as f64;
            let lo = n * n - 1;
            for idx in lo..lo + 2 * n + 1 {
                coefficients[[0, idx, pol]] = m_coeffs[idx] / scale;
                coefficients[[1, idx, pol]] = n_coeffs[idx] / scale;
            }
        }
    }

    let (lmax, met) = truncation_order(&coefficients, order, qeps2);
    debug!(
        "cluster expansion: radius {:.3}, computed order {}, truncated at {}",
        radius, order, lmax
    );

    ClusterExpansion {
        lmax,
        computed_order: order,
        coefficients,
        converged: met || uncapped,
    }
}

/// Smallest order whose tail power is at most `qeps2` of the total
///
/// The power of order `n` is `n(n+1) Σ_m (|a_M|² + |a_N|²)` over both
/// polarizations, proportional to the far-field flux of that order. A field
/// with no power truncates at order 1; a non-finite power keeps every order.
pub fn truncation_order(coefficients: &Array3<Complex64>, order: usize, qeps2: f64) -> (usize, bool) {
    let mut power = vec![0.0; order + 1];
    for n in 1..=order {
        let lo = n * n - 1;
        let mut sum = 0.0;
        for idx in lo..lo + 2 * n + 1 {
            for family in 0..2 {
                for pol in 0..2 {
                    sum += coefficients[[family, idx, pol]].norm_sqr();
                }
            }
        }
        power[n] = (n * (n + 1)) as f64 * sum;
    }

    let total: f64 = power.iter().sum();
    if !total.is_finite() {
        return (order, false);
    }
    if total == 0.0 {
        return (1, true);
    }

    // tail[n] = Σ_{l > n} power[l], accumulated from the top
    let mut tail = vec![0.0; order + 1];
    for n in (0..order).rev() {
        tail[n] = tail[n + 1] + power[n + 1];
    }

    for n in 1..=order {
        if tail[n] <= qeps2 * total {
            return (n, n < order);
        }
    }
    (order, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scatterer::Vector3D;
    use crate::tmatrix::interaction::{excitation, incident_coefficients, RegularProjector};
    use crate::tmatrix::mie::sphere_order;
    use crate::utils::multipole_index;
    use approx::assert_relative_eq;

    #[test]
    fn test_truncation_order_from_tail() {
        let order = 4;
        let mut c = Array3::zeros((2, multipole_terms(order), 2));
        c[[1, multipole_index(1, 1), 0]] = Complex64::new(1.0, 0.0);
        c[[0, multipole_index(2, 0), 0]] = Complex64::new(1e-3, 0.0);
        c[[0, multipole_index(3, 0), 1]] = Complex64::new(1e-6, 0.0);

        assert_eq!(truncation_order(&c, order, 1e-2).0, 1);
        assert_eq!(truncation_order(&c, order, 1e-8).0, 2);
        assert_eq!(truncation_order(&c, order, 1e-14).0, 3);
    }

    #[test]
    fn test_truncation_order_of_empty_field() {
        let c = Array3::zeros((2, multipole_terms(3), 2));
        assert_eq!(truncation_order(&c, 3, 1e-8), (1, true));
    }

    #[test]
    fn test_truncation_order_of_nan_field() {
        let mut c = Array3::zeros((2, multipole_terms(3), 2));
        c[[0, 0, 0]] = Complex64::new(f64::NAN, 0.0);
        assert_eq!(truncation_order(&c, 3, 1e-8), (3, false));
    }

    #[test]
    fn test_centred_sphere_keeps_mie_coefficients() {
        // a single sphere at the origin re-expands onto itself
        let site = SphereSite {
            center: Vector3D::origin(),
            size: 2.0,
            response: sphere_order(2.0, Complex64::new(1.5, 0.0), 1e-8, MAX_ORDER),
        };
        let projector = RegularProjector::new(site.order(), site.size);
        let incident = vec![incident_coefficients(&site, &projector)];
        let sites = vec![site];
        let rhs = excitation(&sites, &incident);

        let expansion = cluster_expansion(&sites, &rhs, 1e-8);
        assert!(expansion.converged);
        assert!(expansion.lmax <= sites[0].order());

        let terms = sites[0].terms();
        for idx in 0..terms {
            for pol in 0..2 {
                let m = expansion.coefficients[[0, idx, pol]];
                let n = expansion.coefficients[[1, idx, pol]];
                assert_relative_eq!(m.re, rhs[pol][idx].re, epsilon = 1e-9);
                assert_relative_eq!(m.im, rhs[pol][idx].im, epsilon = 1e-9);
                assert_relative_eq!(n.re, rhs[pol][terms + idx].re, epsilon = 1e-9);
                assert_relative_eq!(n.im, rhs[pol][terms + idx].im, epsilon = 1e-9);
            }
        }
    }
}
