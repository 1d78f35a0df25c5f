/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Interaction equation solver
//!
//! Solves `s = b + G s` for the scattered coefficients `s` of all spheres,
//! where `G` carries the sphere responses times the translation operators
//! and `b` holds the responses to the incident wave alone.

use super::SolutionMethod;
use crate::utils::linear_algebra::{
    all_finite, axpy, difference_norm, inner_product, vector_norm,
};
use crate::utils::Result;
use faer::{col, Mat};
use log::{debug, warn};
use num_complex::Complex64;
use rayon::prelude::*;

/// Smallest magnitude accepted for a Krylov scalar before breakdown
const BREAKDOWN: f64 = 1e-300;

/// Outcome of one interaction solve
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Scattered coefficients of all spheres, concatenated
    pub solution: col::Col<Complex64>,
    /// Whether the relative error fell below the tolerance
    pub converged: bool,
    /// Iterations performed
    pub iterations: usize,
    /// Relative error at exit
    pub residual: f64,
}

/// Solver for the coupled interaction equations
#[derive(Debug, Clone)]
pub struct InteractionSolver {
    /// Method to use for solving the equations
    method: SolutionMethod,
    /// Relative convergence tolerance
    tolerance: f64,
    /// Maximum number of iterations
    max_iterations: usize,
}

impl InteractionSolver {
    /// Create a new solver with the specified method
    ///
    /// # Arguments
    ///
    /// * `method` - Method to use for solving the equations
    ///
    /// # Returns
    ///
    /// A new solver with tolerance `1e-6` and at most 100 iterations
    pub fn new(method: SolutionMethod) -> Self {
        Self {
            method,
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }

    /// Set the relative convergence tolerance
    pub fn set_tolerance(&mut self, tolerance: f64) -> &mut Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the maximum number of iterations
    pub fn set_max_iterations(&mut self, max_iterations: usize) -> &mut Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Solve `s = rhs + coupling · s`
    ///
    /// # Arguments
    ///
    /// * `coupling` - The square coupling matrix `G`
    /// * `rhs` - The directly excited coefficients `b`
    ///
    /// # Returns
    ///
    /// The solution with its convergence diagnostics. Numerical breakdown
    /// and non-finite iterates are reported as non-convergence.
    pub fn solve(&self, coupling: &Mat<Complex64>, rhs: &col::Col<Complex64>) -> SolveOutcome {
        let result = match self.method {
            SolutionMethod::OrderOfScattering => self.solve_order_of_scattering(coupling, rhs),
            SolutionMethod::BiconjugateGradient => self.solve_bicgstab(coupling, rhs),
        };

        match result {
            Ok(outcome) => {
                debug!(
                    "{} solve: {} iterations, relative error {:.3e}, converged {}",
                    self.method, outcome.iterations, outcome.residual, outcome.converged
                );
                outcome
            }
            Err(e) => {
                warn!("{} solve failed: {}", self.method, e);
                SolveOutcome {
                    solution: rhs.clone(),
                    converged: false,
                    iterations: 0,
                    residual: f64::INFINITY,
                }
            }
        }
    }

    /// Fixed-point iteration `s ← b + G s`, one scattering order per step
    fn solve_order_of_scattering(
        &self,
        coupling: &Mat<Complex64>,
        rhs: &col::Col<Complex64>,
    ) -> Result<SolveOutcome> {
        let mut s = rhs.clone();
        if vector_norm(rhs) == 0.0 {
            return Ok(converged_outcome(s, 0, 0.0));
        }

        let mut residual = f64::INFINITY;
        for iter in 1..=self.max_iterations {
            let mut next = apply_coupling(coupling, &s);
            axpy(Complex64::new(1.0, 0.0), rhs, &mut next);

            residual = difference_norm(&next, &s) / vector_norm(&next);
            s = next;

            if !all_finite(&s) || !residual.is_finite() {
                return Ok(failed_outcome(s, iter, residual));
            }
            if residual < self.tolerance {
                return Ok(converged_outcome(s, iter, residual));
            }
        }

        Ok(failed_outcome(s, self.max_iterations, residual))
    }

    /// Stabilized biconjugate gradient on `(I - G) s = b`
    fn solve_bicgstab(
        &self,
        coupling: &Mat<Complex64>,
        rhs: &col::Col<Complex64>,
    ) -> Result<SolveOutcome> {
        let n = rhs.nrows();
        let b_norm = vector_norm(rhs);
        let mut x = rhs.clone();
        if b_norm == 0.0 {
            return Ok(converged_outcome(x, 0, 0.0));
        }

        // r = b - (I - G) x with x = b
        let mut r = apply_coupling(coupling, &x);
        let mut residual = vector_norm(&r) / b_norm;
        if residual < self.tolerance {
            return Ok(converged_outcome(x, 0, residual));
        }

        let r_hat = r.clone();
        let mut p = col::Col::<Complex64>::zeros(n);
        let mut v = col::Col::<Complex64>::zeros(n);
        let mut rho_prev = Complex64::new(1.0, 0.0);
        let mut alpha = Complex64::new(1.0, 0.0);
        let mut omega = Complex64::new(1.0, 0.0);

        for iter in 1..=self.max_iterations {
            let rho = inner_product(&r_hat, &r)?;
            if rho.norm() < BREAKDOWN {
                debug!("BiCGSTAB breakdown (rho ≈ 0) at iteration {}", iter);
                return Ok(failed_outcome(x, iter, residual));
            }

            if iter == 1 {
                p = r.clone();
            } else {
                let beta = (rho / rho_prev) * (alpha / omega);
                for i in 0..n {
                    p[i] = r[i] + beta * (p[i] - omega * v[i]);
                }
            }

            v = apply_system(coupling, &p);
            let denom = inner_product(&r_hat, &v)?;
            if denom.norm() < BREAKDOWN {
                debug!("BiCGSTAB breakdown (r̂·v ≈ 0) at iteration {}", iter);
                return Ok(failed_outcome(x, iter, residual));
            }
            alpha = rho / denom;

            let mut s = r.clone();
            axpy(-alpha, &v, &mut s);
            let s_norm = vector_norm(&s) / b_norm;
            if s_norm < self.tolerance {
                axpy(alpha, &p, &mut x);
                return Ok(converged_outcome(x, iter, s_norm));
            }

            let t = apply_system(coupling, &s);
            let tt = inner_product(&t, &t)?;
            if tt.norm() < BREAKDOWN {
                debug!("BiCGSTAB breakdown (t·t ≈ 0) at iteration {}", iter);
                return Ok(failed_outcome(x, iter, residual));
            }
            omega = inner_product(&t, &s)? / tt;

            axpy(alpha, &p, &mut x);
            axpy(omega, &s, &mut x);

            r = s;
            axpy(-omega, &t, &mut r);

            residual = vector_norm(&r) / b_norm;
            if !residual.is_finite() || !all_finite(&x) {
                return Ok(failed_outcome(x, iter, residual));
            }
            if residual < self.tolerance {
                return Ok(converged_outcome(x, iter, residual));
            }
            if omega.norm() < BREAKDOWN {
                debug!("BiCGSTAB stagnation (ω ≈ 0) at iteration {}", iter);
                return Ok(failed_outcome(x, iter, residual));
            }

            rho_prev = rho;
        }

        Ok(failed_outcome(x, self.max_iterations, residual))
    }
}

fn converged_outcome(solution: col::Col<Complex64>, iterations: usize, residual: f64) -> SolveOutcome {
    SolveOutcome {
        solution,
        converged: true,
        iterations,
        residual,
    }
}

fn failed_outcome(solution: col::Col<Complex64>, iterations: usize, residual: f64) -> SolveOutcome {
    SolveOutcome {
        solution,
        converged: false,
        iterations,
        residual,
    }
}

/// Row-parallel matrix-vector product `G x`
pub fn apply_coupling(coupling: &Mat<Complex64>, x: &col::Col<Complex64>) -> col::Col<Complex64> {
    let n = coupling.nrows();
    let m = coupling.ncols().min(x.nrows());

    let rows: Vec<Complex64> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut sum = Complex64::new(0.0, 0.0);
            for j in 0..m {
                sum += coupling[(i, j)] * x[j];
            }
            sum
        })
        .collect();

    let mut out = col::Col::<Complex64>::zeros(n);
    for (i, value) in rows.into_iter().enumerate() {
        out[i] = value;
    }
    out
}

/// System operator `(I - G) x`
fn apply_system(coupling: &Mat<Complex64>, x: &col::Col<Complex64>) -> col::Col<Complex64> {
    let gx = apply_coupling(coupling, x);
    let mut out = x.clone();
    axpy(Complex64::new(-1.0, 0.0), &gx, &mut out);
    out
}
