/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Mathematical utility functions for scattering calculations
//!
//! This module provides the special functions needed by the multipole code:
//! spherical Bessel and Hankel functions of all orders up to a maximum,
//! normalized associated Legendre tables and Gauss-Legendre quadrature rules.

use num_complex::Complex64;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, RwLock};

/// Rescaling threshold for the downward Bessel recurrence
const RESCALE_LIMIT: f64 = 1e250;

/// Spherical Bessel functions of the first kind j_0(x) ... j_nmax(x)
///
/// Uses upward recurrence where it is stable (`x > nmax`) and Miller's
/// downward recurrence normalized against j_0 or j_1 otherwise, so high
/// orders at small arguments keep full relative precision.
///
/// # Arguments
///
/// * `nmax` - The highest order required
/// * `x` - The (real) argument
///
/// # Returns
///
/// A vector of length `nmax + 1`
pub fn spherical_bessel_j_array(nmax: usize, x: f64) -> Vec<f64> {
    let mut out = vec![0.0; nmax + 1];

    if x == 0.0 {
        out[0] = 1.0;
        return out;
    }

    let (sin_x, cos_x) = x.sin_cos();
    let j0 = sin_x / x;
    let j1 = sin_x / (x * x) - cos_x / x;

    if x.abs() > nmax as f64 {
        out[0] = j0;
        if nmax >= 1 {
            out[1] = j1;
        }
        for n in 1..nmax {
            out[n + 1] = (2 * n + 1) as f64 / x * out[n] - out[n - 1];
        }
        return out;
    }

    let start = nmax + 16 + (40.0 * (nmax as f64 + x.abs())).sqrt() as usize;
    let mut f = vec![0.0; start + 2];
    f[start] = 1e-30;

    for n in (1..=start).rev() {
        f[n - 1] = (2 * n + 1) as f64 / x * f[n] - f[n + 1];
        if f[n - 1].abs() > RESCALE_LIMIT {
            for v in f[n - 1..].iter_mut() {
                *v /= RESCALE_LIMIT;
            }
        }
    }

    let scale = if j0.abs() >= j1.abs() { j0 / f[0] } else { j1 / f[1] };
    for (o, v) in out.iter_mut().zip(f.iter()) {
        *o = v * scale;
    }

    out
}

/// Spherical Bessel functions of the second kind y_0(x) ... y_nmax(x)
///
/// Upward recurrence is stable for y_n at every argument. At `x = 0` the
/// result is non-finite, which callers screen for.
pub fn spherical_bessel_y_array(nmax: usize, x: f64) -> Vec<f64> {
    let mut out = vec![0.0; nmax + 1];
    let (sin_x, cos_x) = x.sin_cos();

    out[0] = -cos_x / x;
    if nmax >= 1 {
        out[1] = -cos_x / (x * x) - sin_x / x;
    }
    for n in 1..nmax {
        out[n + 1] = (2 * n + 1) as f64 / x * out[n] - out[n - 1];
    }

    out
}

/// Spherical Hankel functions of the first kind h_n^(1)(x) = j_n(x) + i y_n(x)
///
/// # Arguments
///
/// * `nmax` - The highest order required
/// * `x` - The argument
///
/// # Returns
///
/// A vector of length `nmax + 1`
pub fn spherical_hankel_array(nmax: usize, x: f64) -> Vec<Complex64> {
    let j = spherical_bessel_j_array(nmax, x);
    let y = spherical_bessel_y_array(nmax, x);
    j.into_iter()
        .zip(y)
        .map(|(j_n, y_n)| Complex64::new(j_n, y_n))
        .collect()
}

/// Normalized associated Legendre functions evaluated at one polar angle
///
/// Stores, for `0 ≤ m ≤ n ≤ lmax`, the orthonormal functions
/// `P̄_n^m(cos θ)` (so that `Y_nm = P̄_n^m e^{imφ}`, Condon-Shortley phase),
/// the ratio `P̄_n^m / sin θ` for `m ≥ 1` and the derivative `dP̄_n^m/dθ`.
/// The ratio is built by the same recurrence seeded without the last
/// factor of `sin θ`, so it stays finite on the polar axis.
#[derive(Debug, Clone)]
pub struct LegendreTable {
    lmax: usize,
    p: Vec<f64>,
    p_over_sin: Vec<f64>,
    dp: Vec<f64>,
}

impl LegendreTable {
    /// Build the table for a polar angle given through its cosine and sine
    pub fn new(lmax: usize, cos_theta: f64, sin_theta: f64) -> Self {
        let size = (lmax + 1) * (lmax + 2) / 2;
        let mut p = vec![0.0; size];
        let mut q = vec![0.0; size];
        let mut dp = vec![0.0; size];
        let x = cos_theta;
        let s = sin_theta;

        p[0] = 1.0 / (4.0 * PI).sqrt();
        for m in 1..=lmax {
            let factor = -((2 * m + 1) as f64 / (2 * m) as f64).sqrt();
            let prev = p[Self::idx(m - 1, m - 1)];
            p[Self::idx(m, m)] = factor * s * prev;
            q[Self::idx(m, m)] = factor * prev;
        }

        for m in 0..=lmax {
            if m + 1 <= lmax {
                let c = ((2 * m + 3) as f64).sqrt();
                p[Self::idx(m + 1, m)] = c * x * p[Self::idx(m, m)];
                q[Self::idx(m + 1, m)] = c * x * q[Self::idx(m, m)];
            }
            for n in (m + 2)..=lmax {
                let nf = n as f64;
                let mf = m as f64;
                let a = ((4.0 * nf * nf - 1.0) / (nf * nf - mf * mf)).sqrt();
                let b = (((nf - 1.0) * (nf - 1.0) - mf * mf) / (4.0 * (nf - 1.0) * (nf - 1.0) - 1.0))
                    .sqrt();
                p[Self::idx(n, m)] = a * (x * p[Self::idx(n - 1, m)] - b * p[Self::idx(n - 2, m)]);
                q[Self::idx(n, m)] = a * (x * q[Self::idx(n - 1, m)] - b * q[Self::idx(n - 2, m)]);
            }
        }

        for n in 1..=lmax {
            let nf = n as f64;
            dp[Self::idx(n, 0)] = (nf * (nf + 1.0)).sqrt() * p[Self::idx(n, 1)];
            for m in 1..=n {
                let mf = m as f64;
                let lower = if n > m {
                    ((2.0 * nf + 1.0) * (nf * nf - mf * mf) / (2.0 * nf - 1.0)).sqrt()
                        * q[Self::idx(n - 1, m)]
                } else {
                    0.0
                };
                dp[Self::idx(n, m)] = nf * x * q[Self::idx(n, m)] - lower;
            }
        }

        Self {
            lmax,
            p,
            p_over_sin: q,
            dp,
        }
    }

    /// Build the table for a polar angle in radians
    pub fn from_theta(lmax: usize, theta: f64) -> Self {
        Self::new(lmax, theta.cos(), theta.sin())
    }

    #[inline]
    fn idx(n: usize, m: usize) -> usize {
        n * (n + 1) / 2 + m
    }

    #[inline]
    fn sign(m: i64) -> f64 {
        if m < 0 && m % 2 != 0 {
            -1.0
        } else {
            1.0
        }
    }

    /// Highest order held by the table
    pub fn lmax(&self) -> usize {
        self.lmax
    }

    /// `P̄_n^m(cos θ)` for `|m| ≤ n`
    pub fn p(&self, n: usize, m: i64) -> f64 {
        Self::sign(m) * self.p[Self::idx(n, m.unsigned_abs() as usize)]
    }

    /// `m P̄_n^m(cos θ) / sin θ`, finite on the polar axis
    pub fn m_over_sin(&self, n: usize, m: i64) -> f64 {
        if m == 0 {
            return 0.0;
        }
        m as f64 * Self::sign(m) * self.p_over_sin[Self::idx(n, m.unsigned_abs() as usize)]
    }

    /// `dP̄_n^m(cos θ) / dθ`
    pub fn dp(&self, n: usize, m: i64) -> f64 {
        Self::sign(m) * self.dp[Self::idx(n, m.unsigned_abs() as usize)]
    }
}

/// Gauss-Legendre quadrature rule on [-1, 1]
#[derive(Debug, Clone)]
pub struct GaussLegendre {
    /// Quadrature nodes (cosines of the polar angles)
    pub nodes: Vec<f64>,
    /// Quadrature weights
    pub weights: Vec<f64>,
}

impl GaussLegendre {
    /// Compute an `n`-point rule by Newton iteration on P_n
    pub fn new(n: usize) -> Self {
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        let nf = n as f64;

        for i in 0..n {
            let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
            let mut pp = 1.0;

            for _ in 0..100 {
                let mut p1 = 1.0;
                let mut p2 = 0.0;
                for j in 1..=n {
                    let p3 = p2;
                    p2 = p1;
                    p1 = ((2 * j - 1) as f64 * z * p2 - (j - 1) as f64 * p3) / j as f64;
                }
                pp = nf * (z * p1 - p2) / (z * z - 1.0);
                let z_prev = z;
                z = z_prev - p1 / pp;
                if (z - z_prev).abs() < 1e-15 {
                    break;
                }
            }

            nodes[i] = z;
            weights[i] = 2.0 / ((1.0 - z * z) * pp * pp);
        }

        Self { nodes, weights }
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the rule has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// Rules are reused across spheres and calculations
static GAUSS_LEGENDRE_CACHE: Lazy<RwLock<HashMap<usize, Arc<GaussLegendre>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Fetch an `n`-point Gauss-Legendre rule, computing it once per process
pub fn gauss_legendre(n: usize) -> Arc<GaussLegendre> {
    if let Ok(cache) = GAUSS_LEGENDRE_CACHE.read() {
        if let Some(rule) = cache.get(&n) {
            return Arc::clone(rule);
        }
    }

    let rule = Arc::new(GaussLegendre::new(n));
    if let Ok(mut cache) = GAUSS_LEGENDRE_CACHE.write() {
        cache.insert(n, Arc::clone(&rule));
    }
    rule
}
