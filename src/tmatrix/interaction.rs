/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Interaction operators between spheres
//!
//! Every sphere gets a regular-wave projector: two concentric quadrature
//! shells inside its own radius on which any field that is regular around
//! the sphere is sampled. The radial scalars `u = r·E` and `v = r·(∇×E)/k`
//! of a regular field `Σ (p M_nm + q N_nm)` expand as
//! `u = Σ q n(n+1) j_n(kr) Y_nm` and `v = Σ p n(n+1) j_n(kr) Y_nm`, so
//! projecting them onto the harmonics yields the regular coefficients. The
//! incident plane wave and the outgoing waves of the other spheres are both
//! re-expanded this way.

use super::mie::SphereOrder;
use super::quadrature::SphericalQuadrature;
use super::vswf::{radial_component, WaveFunctions};
use crate::scatterer::Vector3D;
use crate::utils::linear_algebra::ndarray_to_faer_vector;
use crate::utils::{multipole_index, multipole_terms, spherical_bessel_j_array};
use faer::{col, Mat};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Radius of the inner projection shell relative to the outer one
const INNER_SHELL: f64 = 0.7;

/// One sphere as seen by the interaction solve
#[derive(Debug, Clone)]
pub struct SphereSite {
    /// Nondimensional center
    pub center: Vector3D,
    /// Size parameter
    pub size: f64,
    /// Expansion order and Mie coefficients
    pub response: SphereOrder,
}

impl SphereSite {
    /// Expansion order of the sphere
    pub fn order(&self) -> usize {
        self.response.order
    }

    /// Multipole terms per wave family
    pub fn terms(&self) -> usize {
        multipole_terms(self.order())
    }

    /// Rows of the sphere's block: M terms followed by N terms
    pub fn block_size(&self) -> usize {
        2 * self.terms()
    }

    /// Diagonal of the sphere's T-matrix over its block
    ///
    /// M entries are `-b_n` and N entries `-a_n`.
    pub fn response_factors(&self) -> Vec<Complex64> {
        let terms = self.terms();
        let mut factors = vec![Complex64::new(0.0, 0.0); 2 * terms];
        for n in 1..=self.order() {
            let lo = n * n - 1;
            for idx in lo..lo + 2 * n + 1 {
                factors[idx] = -self.response.b[n];
                factors[terms + idx] = -self.response.a[n];
            }
        }
        factors
    }
}

/// Regular-wave projector about one sphere
#[derive(Debug, Clone)]
pub struct RegularProjector {
    order: usize,
    quadrature: SphericalQuadrature,
    offsets: Vec<Vector3D>,
    // n(n+1) j_n(ρ) on each shell
    radial: [Vec<f64>; 2],
}

impl RegularProjector {
    /// Build a projector of the given order inside a sphere of size `size`
    pub fn new(order: usize, size: f64) -> Self {
        let quadrature = SphericalQuadrature::new(order);
        let radii = [size, INNER_SHELL * size];
        let directions = quadrature.directions();

        let offsets = radii
            .iter()
            .flat_map(|&rho| directions.iter().map(move |d| *d * rho))
            .collect();

        let radial = radii.map(|rho| {
            spherical_bessel_j_array(order, rho)
                .iter()
                .enumerate()
                .map(|(n, j)| (n * (n + 1)) as f64 * j)
                .collect::<Vec<f64>>()
        });

        Self {
            order,
            quadrature,
            offsets,
            radial,
        }
    }

    /// Sample offsets relative to the sphere center
    pub fn offsets(&self) -> &[Vector3D] {
        &self.offsets
    }

    /// Regular coefficients from a radial scalar sampled at [`Self::offsets`]
    ///
    /// The two shells are combined in the least-squares sense, which keeps
    /// the projection well posed at zeros of `j_n` on either shell.
    pub fn project(&self, samples: &[Complex64]) -> Vec<Complex64> {
        let per_shell = self.quadrature.len();
        let outer = self.quadrature.project(&samples[..per_shell]);
        let inner = self.quadrature.project(&samples[per_shell..2 * per_shell]);

        let mut coeffs = vec![Complex64::new(0.0, 0.0); multipole_terms(self.order)];
        for n in 1..=self.order {
            let (g0, g1) = (self.radial[0][n], self.radial[1][n]);
            let g_max = g0.abs().max(g1.abs());
            if g_max == 0.0 {
                continue;
            }
            let (w0, w1) = (g0 / g_max, g1 / g_max);
            let norm = g_max * (w0 * w0 + w1 * w1);
            let lo = n * n - 1;
            for idx in lo..lo + 2 * n + 1 {
                coeffs[idx] = (outer[idx] * w0 + inner[idx] * w1) / norm;
            }
        }
        coeffs
    }
}

/// Regular coefficients of the unit incident plane waves about a sphere
///
/// The wave is `ê e^{iz}` in the kernel frame with `ê = x̂` (column 0) and
/// `ê = ŷ` (column 1). Rows hold the M coefficients followed by the N
/// coefficients.
pub fn incident_coefficients(site: &SphereSite, projector: &RegularProjector) -> Array2<Complex64> {
    let terms = site.terms();
    let offsets = projector.offsets();
    let i = Complex64::new(0.0, 1.0);

    let mut u = [Vec::with_capacity(offsets.len()), Vec::with_capacity(offsets.len())];
    let mut v = [Vec::with_capacity(offsets.len()), Vec::with_capacity(offsets.len())];
    for r in offsets {
        let phase = Complex64::from_polar(1.0, site.center.z + r.z);
        // u = (r·ê) e^{iz}, v = i (r·(ẑ×ê)) e^{iz}
        u[0].push(phase * r.x);
        v[0].push(i * phase * r.y);
        u[1].push(phase * r.y);
        v[1].push(-i * phase * r.x);
    }

    let mut out = Array2::zeros((2 * terms, 2));
    for pol in 0..2 {
        let m_coeffs = projector.project(&v[pol]);
        let n_coeffs = projector.project(&u[pol]);
        for idx in 0..terms {
            out[[idx, pol]] = m_coeffs[idx];
            out[[terms + idx, pol]] = n_coeffs[idx];
        }
    }
    out
}

/// Exact regular coefficients of the unit incident plane waves about the origin
///
/// Same layout as [`incident_coefficients`]. For `ê = x̂` only `m = ±1`
/// contribute, with `p_{n,±1} = q_{n,1} = -q_{n,-1} = i^{n+1} sqrt(π(2n+1)/(n(n+1)))`;
/// the `ŷ` state is the same wave rotated by 90° about z, which multiplies
/// each coefficient by `(-i)^m`.
pub fn plane_wave_coefficients(order: usize) -> Array2<Complex64> {
    let terms = multipole_terms(order);
    let mut out = Array2::zeros((2 * terms, 2));
    let i = Complex64::new(0.0, 1.0);

    for n in 1..=order {
        let nf = n as f64;
        let c = i.powu(n as u32 + 1) * (PI * (2.0 * nf + 1.0) / (nf * (nf + 1.0))).sqrt();
        for (m, sign) in [(1i64, 1.0), (-1i64, -1.0)] {
            let idx = multipole_index(n, m);
            let rotation = if m == 1 { -i } else { i };
            out[[idx, 0]] = c;
            out[[terms + idx, 0]] = c * sign;
            out[[idx, 1]] = c * rotation;
            out[[terms + idx, 1]] = c * sign * rotation;
        }
    }
    out
}

/// Translation block taking outgoing waves of `source` to regular waves of `target`
///
/// Columns are the source's `M` then `N` waves; rows the target's regular
/// `M` then `N` coefficients.
pub fn translation_block(
    target: &SphereSite,
    projector: &RegularProjector,
    source: &SphereSite,
) -> Array2<Complex64> {
    let target_terms = target.terms();
    let source_terms = source.terms();
    let offsets = projector.offsets();
    let shift = target.center - source.center;

    // rm[b][k] = r·M_b, rn[b][k] = r·N_b at sample k
    let samples: Vec<(Vec<Complex64>, Vec<Complex64>)> = offsets
        .par_iter()
        .map(|r| {
            let wf = WaveFunctions::at(source.order(), *r + shift);
            let rm = wf.m.iter().map(|e| radial_component(*r, e)).collect();
            let rn = wf.n.iter().map(|e| radial_component(*r, e)).collect();
            (rm, rn)
        })
        .collect();

    let mut block = Array2::zeros((2 * target_terms, 2 * source_terms));
    for b in 0..source_terms {
        let rm: Vec<Complex64> = samples.iter().map(|(rm, _)| rm[b]).collect();
        let rn: Vec<Complex64> = samples.iter().map(|(_, rn)| rn[b]).collect();
        let a_col = projector.project(&rm);
        let b_col = projector.project(&rn);

        for p in 0..target_terms {
            // an M wave has u = r·M and v = r·N, an N wave the reverse
            block[[p, b]] = b_col[p];
            block[[target_terms + p, b]] = a_col[p];
            block[[p, source_terms + b]] = a_col[p];
            block[[target_terms + p, source_terms + b]] = b_col[p];
        }
    }
    block
}

/// Starting row of every sphere's block in the concatenated system
pub fn block_offsets(sites: &[SphereSite]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(sites.len() + 1);
    let mut total = 0;
    for site in sites {
        offsets.push(total);
        total += site.block_size();
    }
    offsets.push(total);
    offsets
}

/// Assemble the coupling matrix `G` with blocks `T_i H_ij` (zero for `i = j`)
pub fn coupling_matrix(sites: &[SphereSite], projectors: &[RegularProjector]) -> Mat<Complex64> {
    let offsets = block_offsets(sites);
    let dim = offsets[sites.len()];

    let pairs: Vec<(usize, usize)> = (0..sites.len())
        .flat_map(|i| (0..sites.len()).filter(move |&j| j != i).map(move |j| (i, j)))
        .collect();

    let blocks: Vec<(usize, usize, Array2<Complex64>)> = pairs
        .into_par_iter()
        .map(|(i, j)| {
            let mut block = translation_block(&sites[i], &projectors[i], &sites[j]);
            let factors = sites[i].response_factors();
            for (mut row, factor) in block.rows_mut().into_iter().zip(factors) {
                row.mapv_inplace(|value| value * factor);
            }
            (i, j, block)
        })
        .collect();

    let mut g = Mat::<Complex64>::zeros(dim, dim);
    for (i, j, block) in blocks {
        let (r0, c0) = (offsets[i], offsets[j]);
        for ((p, q), value) in block.indexed_iter() {
            g[(r0 + p, c0 + q)] = *value;
        }
    }
    g
}

/// Right-hand sides `T_i p_i` for the two polarization basis states
pub fn excitation(
    sites: &[SphereSite],
    incident: &[Array2<Complex64>],
) -> [col::Col<Complex64>; 2] {
    let offsets = block_offsets(sites);
    let dim = offsets[sites.len()];
    let mut rhs: [Array1<Complex64>; 2] = [Array1::zeros(dim), Array1::zeros(dim)];

    for (i, (site, coeffs)) in sites.iter().zip(incident).enumerate() {
        let factors = site.response_factors();
        for (pol, out) in rhs.iter_mut().enumerate() {
            for (k, (value, factor)) in coeffs.column(pol).iter().zip(&factors).enumerate() {
                out[offsets[i] + k] = value * factor;
            }
        }
    }
    rhs.map(|v| ndarray_to_faer_vector(&v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmatrix::mie::sphere_order;
    use approx::assert_relative_eq;

    fn site(center: Vector3D, size: f64) -> SphereSite {
        SphereSite {
            center,
            size,
            response: sphere_order(size, Complex64::new(1.2, 0.0), 1e-8, 70),
        }
    }

    #[test]
    fn test_plane_wave_dipole_coefficients() {
        let s = site(Vector3D::origin(), 1.5);
        let projector = RegularProjector::new(s.order(), s.size);
        let coeffs = incident_coefficients(&s, &projector);
        let terms = s.terms();

        let n_plus = coeffs[[terms + multipole_index(1, 1), 0]];
        let n_minus = coeffs[[terms + multipole_index(1, -1), 0]];
        let n_zero = coeffs[[terms + multipole_index(1, 0), 0]];
        assert_relative_eq!(n_plus.norm(), n_minus.norm(), epsilon = 1e-10);
        assert!(n_zero.norm() < 1e-10);

        // near the center u ≈ x = sqrt(2π/3) r (Y_1,-1 - Y_1,1) and 2 j_1(ρ) ≈ 2ρ/3
        let expected = (2.0 * PI / 3.0).sqrt() * 3.0 / 2.0;
        assert_relative_eq!(n_plus.norm(), expected, max_relative = 1e-8);
    }

    #[test]
    fn test_projection_matches_exact_plane_wave() {
        let s = site(Vector3D::origin(), 3.0);
        let projector = RegularProjector::new(s.order(), s.size);
        let projected = incident_coefficients(&s, &projector);
        let exact = plane_wave_coefficients(s.order());

        for ((p, q), value) in exact.indexed_iter() {
            let got = projected[[p, q]];
            assert_relative_eq!(got.re, value.re, epsilon = 1e-9);
            assert_relative_eq!(got.im, value.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_offset_sphere_picks_up_propagation_phase() {
        let s = site(Vector3D::new(0.0, 0.0, 0.8), 1.0);
        let projector = RegularProjector::new(s.order(), s.size);
        let projected = incident_coefficients(&s, &projector);
        let exact = plane_wave_coefficients(s.order());
        let phase = Complex64::from_polar(1.0, 0.8);

        for ((p, q), value) in exact.indexed_iter() {
            let expected = value * phase;
            assert_relative_eq!(projected[[p, q]].re, expected.re, epsilon = 1e-9);
            assert_relative_eq!(projected[[p, q]].im, expected.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_projector_recovers_regular_field() {
        // u = Σ q n(n+1) j_n Y_nm for a single (n, m)
        let s = site(Vector3D::origin(), 2.0);
        let projector = RegularProjector::new(s.order(), s.size);
        let (n0, m0) = (2usize, 1i64);
        let samples: Vec<Complex64> = projector
            .offsets()
            .iter()
            .map(|r| {
                let (rho, theta, phi) = r.to_spherical();
                let j = spherical_bessel_j_array(n0, rho);
                let table = crate::utils::LegendreTable::from_theta(n0, theta);
                Complex64::from_polar(6.0 * j[n0] * table.p(n0, m0), m0 as f64 * phi)
            })
            .collect();

        let coeffs = projector.project(&samples);
        for (idx, c) in coeffs.iter().enumerate() {
            let expected = if idx == multipole_index(n0, m0) { 1.0 } else { 0.0 };
            assert_relative_eq!(c.re, expected, epsilon = 1e-10);
            assert_relative_eq!(c.im, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_block_layout() {
        let sites = vec![
            site(Vector3D::new(-3.0, 0.0, 0.0), 1.0),
            site(Vector3D::new(3.0, 0.0, 0.0), 1.0),
        ];
        let offsets = block_offsets(&sites);
        assert_eq!(offsets, vec![0, sites[0].block_size(), 2 * sites[0].block_size()]);

        let projectors: Vec<RegularProjector> = sites
            .iter()
            .map(|s| RegularProjector::new(s.order(), s.size))
            .collect();
        let g = coupling_matrix(&sites, &projectors);
        let d = sites[0].block_size();
        assert_eq!(g.nrows(), 2 * d);
        // no self-coupling
        for p in 0..d {
            for q in 0..d {
                assert_eq!(g[(p, q)], Complex64::new(0.0, 0.0));
            }
        }
        // neighbours do couple
        let coupled = (0..d).any(|p| (0..d).any(|q| g[(p, d + q)].norm() > 1e-6));
        assert!(coupled);
    }

    #[test]
    fn test_translated_dipole_matches_direct_evaluation() {
        // the re-expanded field of a neighbour reproduces it inside the target
        let target = SphereSite {
            center: Vector3D::origin(),
            size: 1.0,
            response: SphereOrder {
                order: 10,
                converged: true,
                a: vec![Complex64::new(0.0, 0.0); 11],
                b: vec![Complex64::new(0.0, 0.0); 11],
            },
        };
        let source = site(Vector3D::new(0.0, 0.0, 6.0), 1.0);
        let projector = RegularProjector::new(target.order(), target.size);
        let block = translation_block(&target, &projector, &source);

        let b = multipole_index(1, 1);
        let probe = Vector3D::new(0.2, -0.3, 0.1);
        let exact = WaveFunctions::at(source.order(), probe - source.center).n[b];
        let exact_u = radial_component(probe, &exact);

        // u of the regular expansion: Σ q n(n+1) j_n(ρ) Y_nm
        let (rho, theta, phi) = probe.to_spherical();
        let j = spherical_bessel_j_array(target.order(), rho);
        let table = crate::utils::LegendreTable::from_theta(target.order(), theta);
        let terms = target.terms();
        let mut u = Complex64::new(0.0, 0.0);
        for n in 1..=target.order() {
            for m in -(n as i64)..=n as i64 {
                let q = block[[terms + multipole_index(n, m), source.terms() + b]];
                let y = table.p(n, m) * Complex64::from_polar(1.0, m as f64 * phi);
                u += q * y * ((n * (n + 1)) as f64 * j[n]);
            }
        }
        assert_relative_eq!(u.re, exact_u.re, epsilon = 1e-6);
        assert_relative_eq!(u.im, exact_u.im, epsilon = 1e-6);
    }
}
