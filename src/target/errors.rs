/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the target module

use thiserror::Error;

/// Errors raised when mapping values onto a target geometry
#[derive(Error, Debug)]
pub enum TargetError {
    /// The number of values does not match the number of sample points
    #[error("Expected {expected} sample points, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The array does not carry three vector components on its last axis
    #[error("Vector field arrays need a trailing axis of length 3, got shape {0:?}")]
    NotAVectorField(Vec<usize>),

    /// Geometry parameters are unusable
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type for target operations
pub type Result<T> = std::result::Result<T, TargetError>;
