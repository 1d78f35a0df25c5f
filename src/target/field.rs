/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Complex vector fields sampled on a target geometry

use super::errors::{Result, TargetError};
use ndarray::{Array2, ArrayD, Axis, IxDyn};
use num_complex::Complex64;
use serde::Serialize;
use std::ops::Mul;

/// A complex 3-vector per sample point, stored in the target's native layout
///
/// The underlying array has the target's shape followed by a trailing axis
/// of length 3 holding the x, y and z components.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    values: ArrayD<Complex64>,
}

impl VectorField {
    /// Wrap an array whose last axis holds the three components
    pub fn new(values: ArrayD<Complex64>) -> Result<Self> {
        if values.shape().last() != Some(&3) {
            return Err(TargetError::NotAVectorField(values.shape().to_vec()));
        }
        Ok(Self { values })
    }

    /// Reshape a flat `(points, 3)` array into `shape` + `[3]`
    pub fn from_flat(flat: Array2<Complex64>, shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if flat.nrows() != expected {
            return Err(TargetError::LengthMismatch {
                expected,
                actual: flat.nrows(),
            });
        }
        if flat.ncols() != 3 {
            return Err(TargetError::NotAVectorField(flat.shape().to_vec()));
        }

        let mut full_shape = shape.to_vec();
        full_shape.push(3);
        let data: Vec<Complex64> = flat.iter().copied().collect();
        let values = ArrayD::from_shape_vec(IxDyn(&full_shape), data).map_err(|_| {
            TargetError::LengthMismatch {
                expected,
                actual: flat.nrows(),
            }
        })?;
        Ok(Self { values })
    }

    /// The full array, target shape followed by the component axis
    pub fn values(&self) -> &ArrayD<Complex64> {
        &self.values
    }

    /// Shape of the target (without the component axis)
    pub fn shape(&self) -> &[usize] {
        let s = self.values.shape();
        &s[..s.len() - 1]
    }

    /// Number of sample points
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// Whether the field has no sample points
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One Cartesian component (0 = x, 1 = y, 2 = z) in the target layout
    pub fn component(&self, index: usize) -> ArrayD<Complex64> {
        let last = self.values.ndim() - 1;
        self.values.index_axis(Axis(last), index).to_owned()
    }

    /// The field flattened to `(points, 3)`
    pub fn to_flat(&self) -> Array2<Complex64> {
        let n = self.len();
        let data: Vec<Complex64> = self.values.iter().copied().collect();
        Array2::from_shape_vec((n, 3), data).unwrap_or_else(|_| Array2::zeros((n, 3)))
    }

    /// Squared magnitude `|Ex|² + |Ey|² + |Ez|²` per sample point
    pub fn intensity(&self) -> ArrayD<f64> {
        let last = self.values.ndim() - 1;
        self.values.map(|v| v.norm_sqr()).sum_axis(Axis(last))
    }

    /// Whether every component of every point is finite
    pub fn is_finite(&self) -> bool {
        self.values
            .iter()
            .all(|v| v.re.is_finite() && v.im.is_finite())
    }
}

impl Mul<Complex64> for VectorField {
    type Output = VectorField;

    fn mul(mut self, factor: Complex64) -> VectorField {
        self.values.mapv_inplace(|v| v * factor);
        self
    }
}

/// Serializable summary used by the command line output
#[derive(Debug, Clone, Serialize)]
pub struct FieldRecord {
    /// Target shape
    pub shape: Vec<usize>,
    /// Real parts of (x, y, z) per point, flattened
    pub re: Vec<[f64; 3]>,
    /// Imaginary parts of (x, y, z) per point, flattened
    pub im: Vec<[f64; 3]>,
}

impl From<&VectorField> for FieldRecord {
    fn from(field: &VectorField) -> Self {
        let flat = field.to_flat();
        let re = flat
            .rows()
            .into_iter()
            .map(|r| [r[0].re, r[1].re, r[2].re])
            .collect();
        let im = flat
            .rows()
            .into_iter()
            .map(|r| [r[0].im, r[1].im, r[2].im])
            .collect();
        Self {
            shape: field.shape().to_vec(),
            re,
            im,
        }
    }
}
