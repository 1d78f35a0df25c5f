/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Scatterer descriptions
//!
//! A scatterer is either a single homogeneous sphere or a cluster of spheres
//! sharing one embedding medium. Both are plain data, immutable for the
//! duration of a calculation.

pub mod vector;

pub use vector::Vector3D;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A homogeneous sphere
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Complex refractive index of the sphere material
    pub n: Complex64,
    /// Radius, in the same length unit as the wavelength
    pub r: f64,
    /// Center position
    pub center: Vector3D,
}

impl Sphere {
    /// Create a sphere with a real refractive index
    pub fn new(n: f64, r: f64, center: Vector3D) -> Self {
        Self {
            n: Complex64::new(n, 0.0),
            r,
            center,
        }
    }

    /// Create a sphere with an absorbing (complex) refractive index
    pub fn with_complex_index(n: Complex64, r: f64, center: Vector3D) -> Self {
        Self { n, r, center }
    }
}

impl fmt::Display for Sphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sphere(n={}{:+}i, r={}, center={})",
            self.n.re, self.n.im, self.r, self.center
        )
    }
}

/// An ordered cluster of spheres (a sphere cluster)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spheres {
    /// Member spheres, in caller order
    pub scatterers: Vec<Sphere>,
}

impl Spheres {
    /// Create a cluster from its member spheres
    pub fn new(scatterers: Vec<Sphere>) -> Self {
        Self { scatterers }
    }

    /// Number of spheres in the cluster
    pub fn len(&self) -> usize {
        self.scatterers.len()
    }

    /// Whether the cluster has no spheres
    pub fn is_empty(&self) -> bool {
        self.scatterers.is_empty()
    }

    /// Centers of all spheres
    pub fn centers(&self) -> Vec<Vector3D> {
        self.scatterers.iter().map(|s| s.center).collect()
    }

    /// Radii of all spheres
    pub fn radii(&self) -> Vec<f64> {
        self.scatterers.iter().map(|s| s.r).collect()
    }

    /// Refractive indices of all spheres
    pub fn indices(&self) -> Vec<Complex64> {
        self.scatterers.iter().map(|s| s.n).collect()
    }

    /// Mean of the sphere centers
    pub fn centroid(&self) -> Vector3D {
        if self.scatterers.is_empty() {
            return Vector3D::origin();
        }
        let sum = self
            .scatterers
            .iter()
            .fold(Vector3D::origin(), |acc, s| acc + s.center);
        sum * (1.0 / self.scatterers.len() as f64)
    }

    /// Mean z coordinate of the sphere centers
    pub fn z_mean(&self) -> f64 {
        self.centroid().z
    }

    /// Radius of the smallest centroid-centred sphere enclosing every member
    pub fn bounding_radius(&self) -> f64 {
        let centroid = self.centroid();
        self.scatterers
            .iter()
            .map(|s| s.center.distance(&centroid) + s.r)
            .fold(0.0, f64::max)
    }
}

impl fmt::Display for Spheres {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Spheres[")?;
        for (i, s) in self.scatterers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", s)?;
        }
        write!(f, "]")
    }
}

/// Any scatterer the theories know how to describe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scatterer {
    /// A single sphere
    Sphere(Sphere),
    /// A cluster of spheres
    Spheres(Spheres),
}

impl Scatterer {
    /// Mean position of the scatterer's center(s)
    pub fn centroid(&self) -> Vector3D {
        match self {
            Scatterer::Sphere(s) => s.center,
            Scatterer::Spheres(c) => c.centroid(),
        }
    }

    /// Radius of a centroid-centred sphere enclosing the whole scatterer
    pub fn bounding_radius(&self) -> f64 {
        match self {
            Scatterer::Sphere(s) => s.r,
            Scatterer::Spheres(c) => c.bounding_radius(),
        }
    }
}

impl From<Sphere> for Scatterer {
    fn from(sphere: Sphere) -> Self {
        Scatterer::Sphere(sphere)
    }
}

impl From<Spheres> for Scatterer {
    fn from(spheres: Spheres) -> Self {
        Scatterer::Spheres(spheres)
    }
}

impl fmt::Display for Scatterer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scatterer::Sphere(s) => write!(f, "{}", s),
            Scatterer::Spheres(c) => write!(f, "{}", c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dimer() -> Spheres {
        Spheres::new(vec![
            Sphere::new(1.6, 0.5, Vector3D::new(-2.0, 0.0, 1.0)),
            Sphere::new(1.6, 0.5, Vector3D::new(2.0, 0.0, 3.0)),
        ])
    }

    #[test]
    fn test_cluster_aggregates() {
        let cluster = dimer();
        let centroid = cluster.centroid();
        assert_relative_eq!(centroid.x, 0.0);
        assert_relative_eq!(centroid.z, 2.0);
        assert_relative_eq!(cluster.z_mean(), 2.0);
        assert_eq!(cluster.radii(), vec![0.5, 0.5]);
        assert_eq!(cluster.indices()[1], Complex64::new(1.6, 0.0));
        assert_relative_eq!(cluster.bounding_radius(), 5.0_f64.sqrt() + 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_scatterer_serde() {
        let scatterer = Scatterer::from(dimer());
        let json = serde_json::to_string(&scatterer).unwrap();
        let back: Scatterer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scatterer);
        assert!(scatterer.to_string().starts_with("Spheres["));
    }
}
