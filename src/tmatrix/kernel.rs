/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! The bundled multipole kernel

use super::cluster::cluster_expansion;
use super::interaction::{
    block_offsets, coupling_matrix, excitation, incident_coefficients, RegularProjector, SphereSite,
};
use super::mie::sphere_order;
use super::solver::InteractionSolver;
use super::{KernelInput, KernelOutput, MultipoleKernel, MAX_ORDER, MAX_TERMS};
use crate::scatterer::Vector3D;
use crate::utils::linear_algebra::faer_vector_to_ndarray;
use log::{debug, warn};
use ndarray::{Array2, Array3};
use num_complex::Complex64;
use rayon::prelude::*;

/// Superposition T-matrix kernel
///
/// Each sphere is described by its Mie coefficients. The spheres are coupled
/// through re-expansions of their outgoing waves, the coupled system is
/// solved iteratively for both incident polarization basis states, and the
/// resulting field is re-expanded about the cluster centroid.
#[derive(Debug, Clone, Copy, Default)]
pub struct TmatrixKernel;

impl TmatrixKernel {
    /// Create the kernel
    pub fn new() -> Self {
        Self
    }

    fn sites(input: &KernelInput) -> Vec<SphereSite> {
        (0..input.sphere_count())
            .into_par_iter()
            .map(|i| {
                let index = Complex64::new(input.m_real[i], input.m_imag[i]);
                SphereSite {
                    center: Vector3D::new(input.x[i], input.y[i], input.z[i]),
                    size: input.size[i],
                    response: sphere_order(input.size[i], index, input.qeps1, MAX_ORDER),
                }
            })
            .collect()
    }
}

impl MultipoleKernel for TmatrixKernel {
    fn amncalc(&self, input: &KernelInput) -> KernelOutput {
        let sites = Self::sites(input);
        let sphere_orders: Vec<usize> = sites.iter().map(SphereSite::order).collect();
        debug!("sphere expansion orders: {:?}", sphere_orders);

        let spheres_converged = sites.iter().all(|s| s.response.converged);
        if !spheres_converged {
            warn!(
                "a sphere expansion needs more than {} orders; the result is unreliable",
                MAX_ORDER
            );
        }

        let projectors: Vec<RegularProjector> = sites
            .par_iter()
            .map(|s| RegularProjector::new(s.order(), s.size))
            .collect();
        let incident: Vec<Array2<Complex64>> = sites
            .par_iter()
            .zip(&projectors)
            .map(|(s, p)| incident_coefficients(s, p))
            .collect();

        let coupling = coupling_matrix(&sites, &projectors);
        let rhs = excitation(&sites, &incident);
        debug!("interaction system of dimension {}", coupling.nrows());

        let mut solver = InteractionSolver::new(input.method);
        solver
            .set_tolerance(input.eps)
            .set_max_iterations(input.max_iterations);
        let [x_pol, y_pol] = rhs;
        let outcomes = [solver.solve(&coupling, &x_pol), solver.solve(&coupling, &y_pol)];
        let iterations = outcomes.iter().map(|o| o.iterations).max().unwrap_or(0);

        if !outcomes.iter().all(|o| o.converged) {
            warn!(
                "interaction solve did not converge within {} iterations ({})",
                input.max_iterations, input.method
            );
            return KernelOutput::unconverged(sphere_orders, iterations);
        }

        let [x_out, y_out] = outcomes;
        let solutions = [x_out.solution, y_out.solution];
        let expansion = cluster_expansion(&sites, &solutions, input.qeps2);

        let mut amn = Array3::zeros((2, MAX_TERMS, 2));
        for ((family, idx, pol), value) in expansion.coefficients.indexed_iter() {
            amn[[family, idx, pol]] = *value;
        }

        let columns = solutions.each_ref().map(faer_vector_to_ndarray);
        let offsets = block_offsets(&sites);
        let sphere_coefficients = sites
            .iter()
            .enumerate()
            .map(|(i, site)| {
                Array2::from_shape_fn((site.block_size(), 2), |(k, pol)| {
                    columns[pol][offsets[i] + k]
                })
            })
            .collect();

        KernelOutput {
            lmax: expansion.lmax,
            amn,
            converged: spheres_converged && expansion.converged,
            iterations,
            sphere_orders,
            sphere_coefficients,
        }
    }
}
