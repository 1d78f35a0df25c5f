/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Multiple-sphere scattering by the T-matrix superposition method
//!
//! The pipeline for one calculation is strictly sequential:
//! validity guards, coordinate transform, kernel solve, coefficient
//! truncation and validation, then field reconstruction. Every stage either
//! hands a valid value to the next or ends the calculation with a typed
//! error; nothing is retried.

use super::errors::{Result, ScatteringError, UnrealizableReason};
use super::ScatteringTheory;
use crate::config::MultisphereConfig;
use crate::optics::Optics;
use crate::scatterer::{Scatterer, Spheres};
use crate::target::{Target, VectorField};
use crate::tmatrix::{
    tmatrix_fields, KernelInput, KernelOutput, MultipoleKernel, TmatrixKernel,
};
use crate::utils::multipole_terms;
use log::{debug, info};
use ndarray::{s, Array3};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Largest sphere size parameter the kernel is asked to handle
pub const MAX_SIZE_PARAMETER: f64 = 1e3;

/// Largest nondimensional centroid-relative coordinate
pub const MAX_SEPARATION: f64 = 1e4;

/// T-matrix superposition theory for clusters of spheres
///
/// Generic over the numerical kernel so that another implementation of the
/// kernel contract can be substituted.
#[derive(Debug, Clone)]
pub struct Multisphere<K = TmatrixKernel> {
    config: MultisphereConfig,
    kernel: K,
}

impl Multisphere<TmatrixKernel> {
    /// Create the theory with the bundled kernel
    pub fn new(config: MultisphereConfig) -> Self {
        Self {
            config,
            kernel: TmatrixKernel,
        }
    }
}

impl Default for Multisphere<TmatrixKernel> {
    fn default() -> Self {
        Self::new(MultisphereConfig::default())
    }
}

impl<K: MultipoleKernel> Multisphere<K> {
    /// Create the theory with a specific kernel
    pub fn with_kernel(config: MultisphereConfig, kernel: K) -> Self {
        Self { config, kernel }
    }

    /// Solver settings
    pub fn config(&self) -> &MultisphereConfig {
        &self.config
    }

    /// The numerical kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Reject spheres the kernel cannot handle
    fn check_spheres(&self, spheres: &Spheres, optics: &Optics) -> Result<()> {
        if spheres.is_empty() {
            return Err(ScatteringError::InvalidParameter(
                "sphere cluster has no spheres".to_string(),
            ));
        }

        let k = optics.wavevec();
        for (i, sphere) in spheres.scatterers.iter().enumerate() {
            if !(sphere.r.is_finite() && sphere.r > 0.0) {
                return Err(ScatteringError::unrealizable(
                    self.name(),
                    sphere,
                    UnrealizableReason::NonPositiveRadius { sphere: i },
                ));
            }
            if sphere.r * k > MAX_SIZE_PARAMETER {
                return Err(ScatteringError::unrealizable(
                    self.name(),
                    sphere,
                    UnrealizableReason::RadiusTooLarge { sphere: i },
                ));
            }
        }
        Ok(())
    }

    /// Nondimensional kernel input for a cluster
    ///
    /// Centers are taken relative to the centroid and multiplied by the
    /// wavevector, with z negated because the kernel propagates along +z.
    /// Indices are relative to the medium and radii become size
    /// parameters. Fails when the cluster is too spread out.
    pub fn kernel_input(&self, spheres: &Spheres, optics: &Optics) -> Result<KernelInput> {
        let k = optics.wavevec();
        let centroid = spheres.centroid();
        let centers: Vec<_> = spheres
            .centers()
            .into_iter()
            .map(|c| (c - centroid) * k)
            .collect();

        if centers.iter().any(|c| !(c.max_abs() <= MAX_SEPARATION)) {
            return Err(ScatteringError::unrealizable(
                self.name(),
                spheres,
                UnrealizableReason::SeparationTooLarge,
            ));
        }

        let relative: Vec<Complex64> = spheres.indices().iter().map(|n| n / optics.index).collect();

        Ok(KernelInput {
            x: centers.iter().map(|c| c.x).collect(),
            y: centers.iter().map(|c| c.y).collect(),
            z: centers.iter().map(|c| -c.z).collect(),
            m_real: relative.iter().map(|m| m.re).collect(),
            m_imag: relative.iter().map(|m| m.im).collect(),
            size: spheres.radii().iter().map(|r| r * k).collect(),
            max_iterations: self.config.max_iterations,
            eps: self.config.relative_tolerance,
            qeps1: self.config.single_sphere_truncation_tol,
            qeps2: self.config.cluster_truncation_tol,
            method: self.config.method,
            control: (0, 0),
        })
    }

    /// Run the kernel and keep only its valid coefficients
    fn solve(&self, input: &KernelInput) -> Result<(usize, Array3<Complex64>)> {
        let output = self.kernel.amncalc(input);
        if !output.converged {
            return Err(ScatteringError::ConvergenceFailure {
                max_iterations: self.config.max_iterations,
                method: self.config.method,
            });
        }
        debug!(
            "kernel converged: lmax {}, {} iterations",
            output.lmax, output.iterations
        );
        let amn = truncate_coefficients(&output)?;
        Ok((output.lmax, amn))
    }

    fn spheres<'a>(&self, scatterer: &'a Scatterer) -> Result<&'a Spheres> {
        match scatterer {
            Scatterer::Spheres(spheres) => Ok(spheres),
            other => Err(ScatteringError::TheoryNotCompatible {
                theory: self.name().to_string(),
                scatterer: other.to_string(),
            }),
        }
    }
}

/// Clip kernel coefficients to the converged order and screen them
///
/// Keeps the first `lmax² + 2·lmax` entries of the multipole axis; the rest
/// is kernel scratch and is never read.
pub fn truncate_coefficients(output: &KernelOutput) -> Result<Array3<Complex64>> {
    let limit = multipole_terms(output.lmax);
    if limit > output.amn.shape()[1] {
        return Err(ScatteringError::InvalidParameter(format!(
            "kernel order {} exceeds its coefficient array",
            output.lmax
        )));
    }

    let amn = output.amn.slice(s![.., 0..limit, ..]).to_owned();
    if amn.iter().any(|c| !(c.re.is_finite() && c.im.is_finite())) {
        return Err(ScatteringError::ExpansionNaN);
    }
    Ok(amn)
}

impl<K: MultipoleKernel> ScatteringTheory for Multisphere<K> {
    fn name(&self) -> &'static str {
        "Multisphere"
    }

    fn raw_field(
        &self,
        scatterer: &Scatterer,
        optics: &Optics,
        target: &dyn Target,
    ) -> Result<VectorField> {
        let spheres = self.spheres(scatterer)?;
        self.check_spheres(spheres, optics)?;
        let input = self.kernel_input(spheres, optics)?;

        let (lmax, amn) = self.solve(&input)?;

        let positions = target.positions_kr_theta_phi(spheres.centroid(), optics.wavevec());
        let fields = tmatrix_fields(positions.view(), amn.view(), lmax, optics.polarization);
        if fields.iter().any(|c| !(c.re.is_finite() && c.im.is_finite())) {
            return Err(ScatteringError::unrealizable(
                self.name(),
                spheres,
                UnrealizableReason::NonFiniteField,
            ));
        }

        info!(
            "Multisphere: {} spheres, lmax {}, {} field points",
            spheres.len(),
            lmax,
            fields.nrows()
        );

        let phase =
            Complex64::from_polar(1.0, -2.0 * PI * spheres.z_mean() / optics.med_wavelen());
        Ok(target.from_1d(fields)? * phase)
    }
}
