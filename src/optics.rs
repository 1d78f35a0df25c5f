/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Optical context of a scattering calculation

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Illumination and embedding medium
///
/// The incident beam is a plane wave travelling along -z (from the
/// scatterer towards a detector at lower z), linearly polarized in the
/// x-y plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Optics {
    /// Vacuum wavelength
    pub wavelen: f64,
    /// Refractive index of the embedding medium
    pub index: f64,
    /// Polarization components along x and y
    pub polarization: [f64; 2],
}

impl Optics {
    /// Create an optical context
    pub fn new(wavelen: f64, index: f64, polarization: [f64; 2]) -> Self {
        Self {
            wavelen,
            index,
            polarization,
        }
    }

    /// Wavelength in the embedding medium
    pub fn med_wavelen(&self) -> f64 {
        self.wavelen / self.index
    }

    /// Wavevector magnitude in the medium, `2π / med_wavelen`
    pub fn wavevec(&self) -> f64 {
        2.0 * PI / self.med_wavelen()
    }

    /// Whether the context describes a physical illumination
    pub fn is_valid(&self) -> bool {
        let [px, py] = self.polarization;
        self.wavelen.is_finite()
            && self.wavelen > 0.0
            && self.index.is_finite()
            && self.index > 0.0
            && px.is_finite()
            && py.is_finite()
            && (px != 0.0 || py != 0.0)
    }
}

impl Default for Optics {
    fn default() -> Self {
        Self::new(0.66, 1.33, [1.0, 0.0])
    }
}
