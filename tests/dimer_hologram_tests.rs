/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! End-to-end dimer calculation on a full detector plane

use holoscat_rs::{
    compute_scattered_field, DetectorGrid, MultisphereConfig, Optics, Scatterer, Sphere, Spheres,
    Vector3D, VectorField,
};
use ndarray::{Array2, Ix2};
use num_complex::Complex64;

fn dimer() -> Scatterer {
    Scatterer::from(Spheres::new(vec![
        Sphere::new(1.6, 0.5, Vector3D::new(-2.0, 0.0, 0.0)),
        Sphere::new(1.6, 0.5, Vector3D::new(2.0, 0.0, 0.0)),
    ]))
}

fn component(field: &VectorField, index: usize) -> Array2<Complex64> {
    field.component(index).into_dimensionality::<Ix2>().unwrap()
}

#[test]
fn test_dimer_field_on_detector_plane() {
    let grid = DetectorGrid::new((200, 200), (0.1, 0.1), Vector3D::new(0.0, 0.0, -10.0)).unwrap();
    let optics = Optics::new(0.66, 1.33, [1.0, 0.0]);

    let field =
        compute_scattered_field(&dimer(), &optics, &grid, &MultisphereConfig::default()).unwrap();
    assert_eq!(field.shape(), &[200, 200]);
    assert!(field.is_finite());

    let [ex, ey, ez] = [0, 1, 2].map(|c| component(&field, c));
    let scale = field.values().iter().map(|c| c.norm()).fold(0.0, f64::max);
    assert!(scale > 0.0);
    let tolerance = 1e-4 * scale;

    // mirror x -> -x flips the incident polarization: Ex even, Ey and Ez odd
    // mirror y -> -y leaves it unchanged: Ey odd, Ex and Ez even
    let n = 200;
    for i in 0..n {
        for j in 0..n {
            let (mi, mj) = (n - 1 - i, n - 1 - j);
            assert!((ex[[i, j]] - ex[[mi, j]]).norm() < tolerance);
            assert!((ey[[i, j]] + ey[[mi, j]]).norm() < tolerance);
            assert!((ez[[i, j]] + ez[[mi, j]]).norm() < tolerance);

            assert!((ex[[i, j]] - ex[[i, mj]]).norm() < tolerance);
            assert!((ey[[i, j]] + ey[[i, mj]]).norm() < tolerance);
            assert!((ez[[i, j]] - ez[[i, mj]]).norm() < tolerance);
        }
    }

    // an x-polarized wave scatters mostly into the x component downstream
    let power = |c: &Array2<Complex64>| c.iter().map(|v| v.norm_sqr()).sum::<f64>();
    assert!(power(&ex) > power(&ey));
    assert!(power(&ex) > power(&ez));
}

#[test]
fn test_polarization_rotates_the_pattern() {
    let grid = DetectorGrid::new((9, 9), (0.5, 0.5), Vector3D::new(0.0, 0.0, -10.0)).unwrap();
    let config = MultisphereConfig::default();
    let x_pol = compute_scattered_field(&dimer(), &Optics::new(0.66, 1.33, [1.0, 0.0]), &grid, &config)
        .unwrap();
    let y_pol = compute_scattered_field(&dimer(), &Optics::new(0.66, 1.33, [0.0, 1.0]), &grid, &config)
        .unwrap();
    let diagonal =
        compute_scattered_field(&dimer(), &Optics::new(0.66, 1.33, [1.0, 1.0]), &grid, &config)
            .unwrap();

    // the field is linear in the polarization vector
    for ((a, b), c) in x_pol
        .values()
        .iter()
        .zip(y_pol.values().iter())
        .zip(diagonal.values().iter())
    {
        assert!((a + b - c).norm() <= 1e-10 * (a.norm() + b.norm()).max(1e-300));
    }
    // a dimer along x is not rotationally symmetric
    assert!(x_pol.intensity() != y_pol.intensity());
}
