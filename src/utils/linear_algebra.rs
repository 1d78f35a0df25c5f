/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Linear algebra utilities using the Faer library
//!
//! Conversions between ndarray and faer vectors and the handful of vector
//! reductions needed by the iterative interaction solvers.

use super::errors::{Result, UtilsError};
use faer::col;
use ndarray::Array1;
use num_complex::Complex64;
use rayon::prelude::*;

/// Vectors longer than this are reduced in parallel chunks
const PARALLEL_THRESHOLD: usize = 4096;
const CHUNK_SIZE: usize = 512;

/// Convert from ndarray::Array1<Complex64> to faer::col::Col<Complex64>
pub fn ndarray_to_faer_vector(array: &Array1<Complex64>) -> col::Col<Complex64> {
    let mut result = col::Col::<Complex64>::zeros(array.len());

    for (i, value) in array.iter().enumerate() {
        result[i] = *value;
    }

    result
}

/// Convert from faer::col::Col<Complex64> to ndarray::Array1<Complex64>
pub fn faer_vector_to_ndarray(vector: &col::Col<Complex64>) -> Array1<Complex64> {
    Array1::from_shape_fn(vector.nrows(), |i| vector[i])
}

/// Compute the conjugate dot product (inner product) `Σ conj(a_i) b_i`
pub fn inner_product(a: &col::Col<Complex64>, b: &col::Col<Complex64>) -> Result<Complex64> {
    if a.nrows() != b.nrows() {
        return Err(UtilsError::DimensionMismatch(format!(
            "inner product of vectors with lengths {} and {}",
            a.nrows(),
            b.nrows()
        )));
    }

    let n = a.nrows();

    if n > PARALLEL_THRESHOLD {
        let chunks = n.div_ceil(CHUNK_SIZE);
        let sum = (0..chunks)
            .into_par_iter()
            .map(|chunk| {
                let start = chunk * CHUNK_SIZE;
                let end = (start + CHUNK_SIZE).min(n);
                let mut partial = Complex64::new(0.0, 0.0);
                for i in start..end {
                    partial += a[i].conj() * b[i];
                }
                partial
            })
            .reduce(|| Complex64::new(0.0, 0.0), |x, y| x + y);
        return Ok(sum);
    }

    let mut result = Complex64::new(0.0, 0.0);
    for i in 0..n {
        result += a[i].conj() * b[i];
    }
    Ok(result)
}

/// Euclidean norm of a complex vector
pub fn vector_norm(v: &col::Col<Complex64>) -> f64 {
    let mut sum_squares = 0.0;
    for i in 0..v.nrows() {
        sum_squares += v[i].norm_sqr();
    }
    sum_squares.sqrt()
}

/// Euclidean norm of the difference of two vectors of equal length
pub fn difference_norm(a: &col::Col<Complex64>, b: &col::Col<Complex64>) -> f64 {
    let mut sum_squares = 0.0;
    for i in 0..a.nrows().min(b.nrows()) {
        sum_squares += (a[i] - b[i]).norm_sqr();
    }
    sum_squares.sqrt()
}

/// In-place update `y ← y + alpha·x`
pub fn axpy(alpha: Complex64, x: &col::Col<Complex64>, y: &mut col::Col<Complex64>) {
    for i in 0..y.nrows().min(x.nrows()) {
        y[i] += alpha * x[i];
    }
}

/// Whether every entry of the vector is finite
pub fn all_finite(v: &col::Col<Complex64>) -> bool {
    (0..v.nrows()).all(|i| v[i].re.is_finite() && v[i].im.is_finite())
}
