/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Target geometries: where fields are sampled
//!
//! A target supplies sample positions, can re-express them in spherical
//! coordinates about any origin and maps flat per-point results back onto
//! its own layout.

pub mod errors;
pub mod field;
pub mod grid;

pub use errors::{Result, TargetError};
pub use field::{FieldRecord, VectorField};
pub use grid::{DetectorGrid, DetectorPoints};

use crate::scatterer::Vector3D;
use ndarray::Array2;
use num_complex::Complex64;

/// A set of sample points at which fields are requested
pub trait Target: Send + Sync {
    /// Cartesian sample positions in flat (row-major) order
    fn positions(&self) -> Vec<Vector3D>;

    /// Native layout of the sample points
    fn shape(&self) -> Vec<usize>;

    /// Number of sample points
    fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// Whether the target has no sample points
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample positions as `(k·r, θ, φ)` rows about `origin`
    ///
    /// # Arguments
    ///
    /// * `origin` - New origin, usually the scatterer centroid
    /// * `wavevec` - Wavevector used to nondimensionalize the radius
    fn positions_kr_theta_phi(&self, origin: Vector3D, wavevec: f64) -> Array2<f64> {
        let positions = self.positions();
        let mut out = Array2::<f64>::zeros((positions.len(), 3));
        for (i, p) in positions.iter().enumerate() {
            let (r, theta, phi) = (*p - origin).to_spherical();
            out[(i, 0)] = r * wavevec;
            out[(i, 1)] = theta;
            out[(i, 2)] = phi;
        }
        out
    }

    /// Map flat `(points, 3)` values back onto the native layout
    fn from_1d(&self, flat: Array2<Complex64>) -> Result<VectorField> {
        VectorField::from_flat(flat, &self.shape())
    }
}
