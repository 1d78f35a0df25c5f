/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Field reconstruction from the cluster expansion
//!
//! Positions arrive in the caller's frame, where the incident wave travels
//! along `-z`. The kernel frame is that frame mirrored through the xy plane,
//! so a point at polar angle `θ` is evaluated at `π - θ` and the z component
//! of the result is flipped back.

use super::vswf::WaveFunctions;
use crate::utils::multipole_terms;
use ndarray::{Array2, ArrayView2, ArrayView3};
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Evaluate the scattered field of a truncated cluster expansion
///
/// # Arguments
///
/// * `positions` - Rows of `(kr, θ, φ)` relative to the centroid, caller frame
/// * `amn` - Coefficients, shape `(2, ≥ lmax² + 2·lmax, 2)`
/// * `lmax` - Truncation order
/// * `polarization` - Incident polarization `(p_x, p_y)` in the caller frame
///
/// # Returns
///
/// Complex field components, one row of `(E_x, E_y, E_z)` per position. A
/// position at the expansion origin yields non-finite components.
pub fn tmatrix_fields(
    positions: ArrayView2<f64>,
    amn: ArrayView3<Complex64>,
    lmax: usize,
    polarization: [f64; 2],
) -> Array2<Complex64> {
    let terms = multipole_terms(lmax).min(amn.shape()[1]);
    let [px, py] = polarization;

    // the incident polarization is the same vector in both frames
    let combine = |family: usize| -> Vec<Complex64> {
        (0..terms)
            .map(|idx| amn[[family, idx, 0]] * px + amn[[family, idx, 1]] * py)
            .collect()
    };
    let m_coeffs = combine(0);
    let n_coeffs = combine(1);

    let rows: Vec<[Complex64; 3]> = (0..positions.nrows())
        .into_par_iter()
        .map(|i| {
            let kr = positions[[i, 0]];
            let theta = positions[[i, 1]];
            let phi = positions[[i, 2]];
            let wf = WaveFunctions::at_spherical(lmax, kr, PI - theta, phi);
            let e = wf.field(&m_coeffs, &n_coeffs);
            [e[0], e[1], -e[2]]
        })
        .collect();

    let mut out = Array2::zeros((rows.len(), 3));
    for (i, row) in rows.into_iter().enumerate() {
        for (axis, value) in row.into_iter().enumerate() {
            out[[i, axis]] = value;
        }
    }
    out
}
