/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use holoscat_rs::tmatrix::{mie_coefficients, tmatrix_fields, KernelInput, MultipoleKernel};
use holoscat_rs::{SolutionMethod, TmatrixKernel};
use ndarray::Array2;
use num_complex::Complex64;

fn dimer_input(method: SolutionMethod) -> KernelInput {
    KernelInput {
        x: vec![-3.0, 3.0],
        y: vec![0.0, 0.0],
        z: vec![0.0, 0.0],
        m_real: vec![1.2, 1.2],
        m_imag: vec![0.0, 0.0],
        size: vec![2.5, 2.5],
        max_iterations: 200,
        eps: 1e-6,
        qeps1: 1e-5,
        qeps2: 1e-8,
        method,
        control: (0, 0),
    }
}

fn kernel_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Kernel");
    group.sample_size(10);

    group.bench_function("dimer_order_of_scattering", |b| {
        let input = dimer_input(SolutionMethod::OrderOfScattering);
        b.iter(|| black_box(TmatrixKernel.amncalc(black_box(&input))))
    });

    group.bench_function("dimer_biconjugate_gradient", |b| {
        let input = dimer_input(SolutionMethod::BiconjugateGradient);
        b.iter(|| black_box(TmatrixKernel.amncalc(black_box(&input))))
    });

    group.finish();
}

fn field_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fields");

    group.bench_function("mie_coefficients", |b| {
        b.iter(|| black_box(mie_coefficients(black_box(25.0), Complex64::new(1.2, 0.01), 40)))
    });

    let output = TmatrixKernel.amncalc(&dimer_input(SolutionMethod::BiconjugateGradient));
    let limit = output.limit();
    let amn = output.amn.slice(ndarray::s![.., 0..limit, ..]).to_owned();
    let positions = Array2::from_shape_fn((1024, 3), |(i, j)| match j {
        0 => 80.0 + (i % 32) as f64,
        1 => 0.5 + 0.02 * (i / 32) as f64,
        _ => 0.1 * (i % 7) as f64,
    });

    group.bench_function("tmatrix_fields_1024_points", |b| {
        b.iter(|| {
            black_box(tmatrix_fields(
                positions.view(),
                amn.view(),
                output.lmax,
                [1.0, 0.0],
            ))
        })
    });

    group.finish();
}

criterion_group!(benches, kernel_benchmark, field_benchmark);
criterion_main!(benches);
