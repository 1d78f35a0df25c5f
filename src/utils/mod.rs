/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Numerical utilities shared by the scattering code
//!
//! Special functions, quadrature rules and small linear algebra helpers.

pub mod errors;
pub mod linear_algebra;
pub mod math;

pub use errors::{Result, UtilsError};
pub use math::{
    gauss_legendre, spherical_bessel_j_array, spherical_bessel_y_array, spherical_hankel_array,
    GaussLegendre, LegendreTable,
};

/// Number of multipole terms retained for a maximum order `lmax`
///
/// Orders run from 1 to `lmax` with `2n + 1` azimuthal indices each,
/// giving `lmax² + 2·lmax` terms.
pub fn multipole_terms(lmax: usize) -> usize {
    lmax * lmax + 2 * lmax
}

/// Flat index of the multipole `(n, m)` with `n ≥ 1` and `|m| ≤ n`
pub fn multipole_index(n: usize, m: i64) -> usize {
    ((n * (n + 1)) as i64 + m - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipole_indexing() {
        assert_eq!(multipole_terms(1), 3);
        assert_eq!(multipole_terms(3), 15);
        assert_eq!(multipole_index(1, -1), 0);
        assert_eq!(multipole_index(1, 1), 2);
        assert_eq!(multipole_index(2, -2), 3);
        // last index of order L is one less than the term count
        assert_eq!(multipole_index(4, 4), multipole_terms(4) - 1);
    }
}
