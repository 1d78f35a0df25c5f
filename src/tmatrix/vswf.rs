/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Outgoing vector spherical wave functions
//!
//! Evaluates every `M_nm^(3)` and `N_nm^(3)` up to a given order at one point
//! in Cartesian components. The radial dependence is the spherical Hankel
//! function of the first kind, so the functions describe outgoing waves for
//! the `e^{-iωt}` time convention.

use crate::scatterer::Vector3D;
use crate::utils::{multipole_index, multipole_terms, spherical_hankel_array, LegendreTable};
use num_complex::Complex64;

/// Outgoing wave functions of all orders `1..=lmax` at a single point
#[derive(Debug, Clone)]
pub struct WaveFunctions {
    /// Order of the evaluation
    pub lmax: usize,
    /// `M_nm` in Cartesian components, indexed by multipole
    pub m: Vec<[Complex64; 3]>,
    /// `N_nm` in Cartesian components, indexed by multipole
    pub n: Vec<[Complex64; 3]>,
}

impl WaveFunctions {
    /// Evaluate at a nondimensional position relative to the expansion origin
    pub fn at(lmax: usize, position: Vector3D) -> Self {
        let (kr, theta, phi) = position.to_spherical();
        Self::at_spherical(lmax, kr, theta, phi)
    }

    /// Evaluate at spherical coordinates `(kr, θ, φ)`
    ///
    /// At `kr = 0` the Hankel functions are singular and every component
    /// comes out non-finite.
    pub fn at_spherical(lmax: usize, kr: f64, theta: f64, phi: f64) -> Self {
        let terms = multipole_terms(lmax);
        let mut m_waves = vec![[Complex64::new(0.0, 0.0); 3]; terms];
        let mut n_waves = vec![[Complex64::new(0.0, 0.0); 3]; terms];

        let hankel = spherical_hankel_array(lmax, kr);
        let legendre = LegendreTable::from_theta(lmax, theta);
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_p, cos_p) = phi.sin_cos();

        // e^{imφ} for m = -lmax..=lmax
        let azimuthal: Vec<Complex64> = (-(lmax as i64)..=lmax as i64)
            .map(|m| Complex64::from_polar(1.0, m as f64 * phi))
            .collect();

        let i = Complex64::new(0.0, 1.0);
        for n in 1..=lmax {
            let nf = n as f64;
            let zn = hankel[n];
            let dz = hankel[n - 1] - zn * (nf / kr);
            let radial = zn * (nf * (nf + 1.0) / kr);

            for m in -(n as i64)..=n as i64 {
                let e = azimuthal[(m + lmax as i64) as usize];
                let p = legendre.p(n, m);
                let mp = legendre.m_over_sin(n, m);
                let dp = legendre.dp(n, m);

                let m_theta = zn * i * mp * e;
                let m_phi = -zn * dp * e;

                let n_r = radial * p * e;
                let n_theta = dz * dp * e;
                let n_phi = dz * i * mp * e;

                let idx = multipole_index(n, m);
                m_waves[idx] = to_cartesian(
                    Complex64::new(0.0, 0.0),
                    m_theta,
                    m_phi,
                    (sin_t, cos_t),
                    (sin_p, cos_p),
                );
                n_waves[idx] =
                    to_cartesian(n_r, n_theta, n_phi, (sin_t, cos_t), (sin_p, cos_p));
            }
        }

        Self {
            lmax,
            m: m_waves,
            n: n_waves,
        }
    }

    /// Field `Σ (c_M M_nm + c_N N_nm)` for coefficients over the same order
    pub fn field(&self, m_coeffs: &[Complex64], n_coeffs: &[Complex64]) -> [Complex64; 3] {
        let mut e = [Complex64::new(0.0, 0.0); 3];
        for (idx, (mw, nw)) in self.m.iter().zip(self.n.iter()).enumerate() {
            let cm = m_coeffs.get(idx).copied().unwrap_or_default();
            let cn = n_coeffs.get(idx).copied().unwrap_or_default();
            for axis in 0..3 {
                e[axis] += cm * mw[axis] + cn * nw[axis];
            }
        }
        e
    }
}

/// Spherical to Cartesian components of a vector at angles (θ, φ)
fn to_cartesian(
    e_r: Complex64,
    e_theta: Complex64,
    e_phi: Complex64,
    (sin_t, cos_t): (f64, f64),
    (sin_p, cos_p): (f64, f64),
) -> [Complex64; 3] {
    [
        e_r * (sin_t * cos_p) + e_theta * (cos_t * cos_p) - e_phi * sin_p,
        e_r * (sin_t * sin_p) + e_theta * (cos_t * sin_p) + e_phi * cos_p,
        e_r * cos_t - e_theta * sin_t,
    ]
}

/// Radial projection `r · E` of a complex vector at real position `r`
pub fn radial_component(r: Vector3D, e: &[Complex64; 3]) -> Complex64 {
    e[0] * r.x + e[1] * r.y + e[2] * r.z
}
