/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Iterative multipole (T-matrix superposition) kernel
//!
//! The kernel solves the coupled interaction equations for a cluster of
//! spheres and returns the scattered field of the whole cluster as an
//! outgoing vector spherical wave expansion about the cluster centroid.
//!
//! Everything here is nondimensional (lengths multiplied by the medium
//! wavevector, so k = 1) and uses the kernel's own axis convention, with the
//! incident plane wave travelling along +z. Callers go through the
//! [`MultipoleKernel`] trait, so the bundled [`TmatrixKernel`] can be replaced
//! by another implementation of the same contract.
//!
//! Basis conventions: `M_nm = ∇×(r z_n(kr) Y_nm)`, `N_nm = ∇×M_nm / k`, with
//! orthonormal `Y_nm` carrying the Condon-Shortley phase and time dependence
//! `e^{-iωt}`. Multipole `(n, m)` lives at flat index `n(n+1) + m - 1`.

pub mod cluster;
pub mod fields;
pub mod interaction;
pub mod kernel;
pub mod mie;
pub mod quadrature;
pub mod solver;
pub mod vswf;

pub use fields::tmatrix_fields;
pub use kernel::TmatrixKernel;
pub use mie::{mie_coefficients, sphere_order};
pub use quadrature::SphericalQuadrature;
pub use solver::{InteractionSolver, SolveOutcome};

use crate::utils::multipole_terms;
use ndarray::{Array2, Array3};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest multipole order the kernel's coefficient array can hold
pub const MAX_ORDER: usize = 70;

/// Length of the multipole axis of the returned coefficient array
pub const MAX_TERMS: usize = MAX_ORDER * MAX_ORDER + 2 * MAX_ORDER;

/// Strategy used to solve the interaction equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionMethod {
    /// Biconjugate-gradient (stabilized) Krylov iteration, selector 0
    BiconjugateGradient,
    /// Order-of-scattering fixed-point iteration, selector 1
    #[default]
    OrderOfScattering,
}

impl SolutionMethod {
    /// Integer selector of the kernel contract
    pub fn code(self) -> i32 {
        match self {
            SolutionMethod::BiconjugateGradient => 0,
            SolutionMethod::OrderOfScattering => 1,
        }
    }

    /// Method for an integer selector, if it is one the kernel knows
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SolutionMethod::BiconjugateGradient),
            1 => Some(SolutionMethod::OrderOfScattering),
            _ => None,
        }
    }
}

impl fmt::Display for SolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionMethod::BiconjugateGradient => write!(f, "biconjugate gradient"),
            SolutionMethod::OrderOfScattering => write!(f, "order of scattering"),
        }
    }
}

/// Inputs of one kernel invocation
///
/// Positions are centroid-relative, multiplied by the wavevector and given
/// in the kernel frame (z already flipped). Sizes are radii times the
/// wavevector.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelInput {
    /// Nondimensional x coordinates of the sphere centers
    pub x: Vec<f64>,
    /// Nondimensional y coordinates of the sphere centers
    pub y: Vec<f64>,
    /// Nondimensional z coordinates of the sphere centers (kernel frame)
    pub z: Vec<f64>,
    /// Real parts of the relative refractive indices
    pub m_real: Vec<f64>,
    /// Imaginary parts of the relative refractive indices
    pub m_imag: Vec<f64>,
    /// Nondimensional sphere radii (size parameters)
    pub size: Vec<f64>,
    /// Iteration cap for the interaction solve
    pub max_iterations: usize,
    /// Relative error tolerance of the interaction solve
    pub eps: f64,
    /// Truncation tolerance for single-sphere expansions
    pub qeps1: f64,
    /// Truncation tolerance for the cluster expansion
    pub qeps2: f64,
    /// Interaction solution strategy
    pub method: SolutionMethod,
    /// Reserved control pair, always `(0, 0)`
    pub control: (i32, i32),
}

impl KernelInput {
    /// Number of spheres described by the input
    pub fn sphere_count(&self) -> usize {
        self.size.len()
    }
}

/// Result of one kernel invocation
#[derive(Debug, Clone)]
pub struct KernelOutput {
    /// Converged cluster expansion order
    pub lmax: usize,
    /// Cluster coefficients, shape `(2, MAX_TERMS, 2)`
    ///
    /// Axis 0 selects the M / N wave family, axis 1 the multipole index and
    /// axis 2 the incident polarization basis state (x, y). Entries at or
    /// beyond `lmax² + 2·lmax` on axis 1 are scratch.
    pub amn: Array3<Complex64>,
    /// Whether the interaction solve and the expansion orders converged
    pub converged: bool,
    /// Iterations spent on the slower of the two polarization solves
    pub iterations: usize,
    /// Expansion order of every sphere
    pub sphere_orders: Vec<usize>,
    /// Scattered coefficients of every sphere, shape `(2·terms, 2)`
    pub sphere_coefficients: Vec<Array2<Complex64>>,
}

impl KernelOutput {
    /// An unconverged output with no usable coefficients
    pub fn unconverged(sphere_orders: Vec<usize>, iterations: usize) -> Self {
        Self {
            lmax: 0,
            amn: Array3::zeros((2, MAX_TERMS, 2)),
            converged: false,
            iterations,
            sphere_orders,
            sphere_coefficients: Vec::new(),
        }
    }

    /// Number of valid entries on the multipole axis
    pub fn limit(&self) -> usize {
        multipole_terms(self.lmax)
    }
}

/// The numerical kernel contract
///
/// Implementations must be safe to call from several threads at once; each
/// call owns its inputs and allocates its own outputs.
pub trait MultipoleKernel: Send + Sync {
    /// Solve the interaction equations and build the cluster expansion
    fn amncalc(&self, input: &KernelInput) -> KernelOutput;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_codes() {
        assert_eq!(SolutionMethod::BiconjugateGradient.code(), 0);
        assert_eq!(SolutionMethod::OrderOfScattering.code(), 1);
        assert_eq!(SolutionMethod::from_code(1), Some(SolutionMethod::OrderOfScattering));
        assert_eq!(SolutionMethod::from_code(2), None);
        assert_eq!(SolutionMethod::default(), SolutionMethod::OrderOfScattering);
    }

    #[test]
    fn test_method_serde_names() {
        let json = serde_json::to_string(&SolutionMethod::BiconjugateGradient).unwrap();
        assert_eq!(json, "\"biconjugate_gradient\"");
    }

    #[test]
    fn test_array_capacity() {
        assert_eq!(MAX_TERMS, multipole_terms(MAX_ORDER));
        let out = KernelOutput::unconverged(vec![3], 7);
        assert_eq!(out.amn.shape(), &[2, MAX_TERMS, 2]);
        assert!(!out.converged);
    }
}
