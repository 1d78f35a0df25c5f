/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Single-sphere (Lorenz-Mie) response coefficients
//!
//! `a_n` multiplies the electric (N) and `b_n` the magnetic (M) partial waves.
//! An exciting regular wave with coefficient `c` on `M_nm` (`N_nm`) produces a
//! scattered outgoing wave with coefficient `-b_n c` (`-a_n c`).

use crate::utils::{spherical_bessel_j_array, spherical_hankel_array};
use num_complex::Complex64;

/// Logarithmic derivative `D_n(z) = ψ_n'(z)/ψ_n(z)` for `n = 0..=nmax`
///
/// Computed by downward recurrence, which is stable for complex arguments.
fn log_derivative(nmax: usize, z: Complex64) -> Vec<Complex64> {
    let start = nmax.max(z.norm().ceil() as usize) + 16;
    let mut d = vec![Complex64::new(0.0, 0.0); start + 1];
    for n in (1..=start).rev() {
        let ratio = n as f64 / z;
        d[n - 1] = ratio - 1.0 / (d[n] + ratio);
    }
    d.truncate(nmax + 1);
    d
}

/// Mie coefficients `a_n`, `b_n` of a sphere for `n = 0..=nmax`
///
/// # Arguments
///
/// * `size` - Size parameter `k a`, must be positive
/// * `m` - Refractive index relative to the medium
/// * `nmax` - Highest order required
///
/// # Returns
///
/// Two vectors of length `nmax + 1`; index 0 is unused and zero.
pub fn mie_coefficients(size: f64, m: Complex64, nmax: usize) -> (Vec<Complex64>, Vec<Complex64>) {
    let x = size;
    let d = log_derivative(nmax, m * x);
    let j = spherical_bessel_j_array(nmax, x);
    let h = spherical_hankel_array(nmax, x);

    let mut a = vec![Complex64::new(0.0, 0.0); nmax + 1];
    let mut b = vec![Complex64::new(0.0, 0.0); nmax + 1];

    for n in 1..=nmax {
        let nx = n as f64 / x;
        let psi = x * j[n];
        let psi_prev = x * j[n - 1];
        let xi = h[n] * x;
        let xi_prev = h[n - 1] * x;

        let da = d[n] / m + nx;
        a[n] = (da * psi - psi_prev) / (da * xi - xi_prev);

        let db = d[n] * m + nx;
        b[n] = (db * psi - psi_prev) / (db * xi - xi_prev);
    }

    (a, b)
}

/// Expansion order of one sphere chosen from its Mie series
#[derive(Debug, Clone)]
pub struct SphereOrder {
    /// Chosen order `L`
    pub order: usize,
    /// Whether the truncation criterion was met below the order cap
    pub converged: bool,
    /// `a_n` for `n = 0..=order`
    pub a: Vec<Complex64>,
    /// `b_n` for `n = 0..=order`
    pub b: Vec<Complex64>,
}

/// Choose a sphere's expansion order from its Mie coefficients
///
/// The order is the first `n` whose partial-wave power
/// `(2n+1)(|a_n|² + |b_n|²)` falls to `qeps1` times the accumulated power.
/// Trial orders follow the Wiscombe estimate `x + 4x^{1/3} + 2` plus a
/// margin and never exceed `max_order`.
pub fn sphere_order(size: f64, m: Complex64, qeps1: f64, max_order: usize) -> SphereOrder {
    let wiscombe = size + 4.0 * size.cbrt() + 2.0;
    let trial = ((wiscombe.ceil() as usize) + 10).min(max_order).max(1);
    let (mut a, mut b) = mie_coefficients(size, m, trial);

    let mut total = 0.0;
    let mut chosen = None;
    for n in 1..=trial {
        let power = (2 * n + 1) as f64 * (a[n].norm_sqr() + b[n].norm_sqr());
        total += power;
        if power <= qeps1 * total {
            chosen = Some(n);
            break;
        }
    }

    let (order, converged) = match chosen {
        Some(n) => (n, true),
        None => (trial, false),
    };
    a.truncate(order + 1);
    b.truncate(order + 1);

    SphereOrder {
        order,
        converged,
        a,
        b,
    }
}

/// Scattering efficiency `Q_sca = 2/x² Σ (2n+1)(|a_n|² + |b_n|²)`
pub fn scattering_efficiency(size: f64, a: &[Complex64], b: &[Complex64]) -> f64 {
    let sum: f64 = a
        .iter()
        .zip(b)
        .enumerate()
        .skip(1)
        .map(|(n, (an, bn))| (2 * n + 1) as f64 * (an.norm_sqr() + bn.norm_sqr()))
        .sum();
    2.0 * sum / (size * size)
}

/// Forward scattering amplitude `S(0) = Σ (2n+1)/2 (a_n + b_n)`
pub fn forward_amplitude(a: &[Complex64], b: &[Complex64]) -> Complex64 {
    a.iter()
        .zip(b)
        .enumerate()
        .skip(1)
        .map(|(n, (an, bn))| (an + bn) * ((2 * n + 1) as f64 / 2.0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rayleigh_limit() {
        let x = 0.01;
        let m = Complex64::new(1.5, 0.0);
        let (a, b) = mie_coefficients(x, m, 3);
        let m2 = m * m;
        let expected = Complex64::new(0.0, -2.0 * x.powi(3) / 3.0) * (m2 - 1.0) / (m2 + 2.0);
        assert_relative_eq!(a[1].re, expected.re, epsilon = 1e-10);
        assert_relative_eq!(a[1].im, expected.im, max_relative = 1e-3);
        assert!(b[1].norm() < 1e-2 * a[1].norm());
    }

    #[test]
    fn test_index_matched_sphere_is_invisible() {
        let (a, b) = mie_coefficients(3.0, Complex64::new(1.0, 0.0), 10);
        for n in 1..=10 {
            assert!(a[n].norm() < 1e-12);
            assert!(b[n].norm() < 1e-12);
        }
    }

    #[test]
    fn test_lossless_coefficients_on_unitarity_circle() {
        // for real m, |a_n - 1/2| = 1/2
        let (a, b) = mie_coefficients(5.0, Complex64::new(1.33, 0.0), 12);
        for n in 1..=12 {
            assert_relative_eq!((a[n] - 0.5).norm(), 0.5, epsilon = 1e-10);
            assert_relative_eq!((b[n] - 0.5).norm(), 0.5, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_extinction_paradox_trend() {
        // Q_sca approaches 2 for large nonabsorbing spheres
        let size = 60.0;
        let m = Complex64::new(1.2, 0.0);
        let order = sphere_order(size, m, 1e-12, 150);
        let q = scattering_efficiency(size, &order.a, &order.b);
        assert!(q > 1.5 && q < 3.5, "Q_sca = {}", q);
    }

    #[test]
    fn test_sphere_order_selection() {
        let order = sphere_order(1.0, Complex64::new(1.5, 0.0), 1e-8, 70);
        assert!(order.converged);
        assert!(order.order >= 3 && order.order <= 10);
        assert_eq!(order.a.len(), order.order + 1);

        let capped = sphere_order(300.0, Complex64::new(1.5, 0.0), 1e-8, 70);
        assert!(!capped.converged);
        assert_eq!(capped.order, 70);
    }

    #[test]
    fn test_absorbing_sphere() {
        let (a, b) = mie_coefficients(2.0, Complex64::new(1.5, 0.3), 8);
        assert!(a.iter().chain(b.iter()).all(|c| c.re.is_finite() && c.im.is_finite()));
        // absorption pulls the coefficients inside the unitarity circle
        assert!((a[1] - 0.5).norm() < 0.5);
    }
}
