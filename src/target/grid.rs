/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Concrete target geometries

use super::errors::{Result, TargetError};
use super::Target;
use crate::scatterer::Vector3D;
use serde::{Deserialize, Serialize};

/// A regular rectangular detector grid in a plane of constant z
///
/// Point `(i, j)` sits at `center + ((i - (rows-1)/2)·dx, (j - (cols-1)/2)·dy, 0)`,
/// so the grid is symmetric about its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorGrid {
    /// Number of points along x and y
    pub shape: (usize, usize),
    /// Point spacing along x and y
    pub spacing: (f64, f64),
    /// Center of the grid
    pub center: Vector3D,
}

impl DetectorGrid {
    /// Create a grid centred on `center`
    pub fn new(shape: (usize, usize), spacing: (f64, f64), center: Vector3D) -> Result<Self> {
        if !(spacing.0 > 0.0 && spacing.1 > 0.0) {
            return Err(TargetError::InvalidGeometry(format!(
                "grid spacing must be positive, got {:?}",
                spacing
            )));
        }
        Ok(Self {
            shape,
            spacing,
            center,
        })
    }

    /// Create a grid whose first point sits at `corner`
    pub fn from_corner(shape: (usize, usize), spacing: (f64, f64), corner: Vector3D) -> Result<Self> {
        let half_x = (shape.0.saturating_sub(1)) as f64 * spacing.0 / 2.0;
        let half_y = (shape.1.saturating_sub(1)) as f64 * spacing.1 / 2.0;
        Self::new(
            shape,
            spacing,
            Vector3D::new(corner.x + half_x, corner.y + half_y, corner.z),
        )
    }

    /// Position of grid point `(i, j)`
    pub fn point(&self, i: usize, j: usize) -> Vector3D {
        let x0 = (self.shape.0.saturating_sub(1)) as f64 / 2.0;
        let y0 = (self.shape.1.saturating_sub(1)) as f64 / 2.0;
        Vector3D::new(
            self.center.x + (i as f64 - x0) * self.spacing.0,
            self.center.y + (j as f64 - y0) * self.spacing.1,
            self.center.z,
        )
    }
}

impl Target for DetectorGrid {
    fn positions(&self) -> Vec<Vector3D> {
        let (rows, cols) = self.shape;
        let mut out = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                out.push(self.point(i, j));
            }
        }
        out
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.shape.0, self.shape.1]
    }
}

/// An arbitrary list of sample points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorPoints {
    /// Sample positions
    pub points: Vec<Vector3D>,
}

impl DetectorPoints {
    /// Create a target from explicit points
    pub fn new(points: Vec<Vector3D>) -> Self {
        Self { points }
    }
}

impl Target for DetectorPoints {
    fn positions(&self) -> Vec<Vector3D> {
        self.points.clone()
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.points.len()]
    }
}
