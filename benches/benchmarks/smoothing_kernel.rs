use criterion::{black_box, criterion_group, Criterion};

use cgmath::prelude::*;
use gradsph2d::sph::smoothing_kernel::*;
use gradsph2d::units::*;

fn bench_kernels(c: &mut Criterion) {
    let smoothing_length = black_box(1.0);

    let r_ab = black_box(Vector::new(1.0, 1.0) - Vector::new(0.5, 1.0));
    let r_sq = black_box(r_ab.magnitude2());
    let r = black_box(r_sq.sqrt());

    {
        let kernel = black_box(CubicSpline);
        c.bench_function("CubicSpline.evaluate", |b| b.iter(|| kernel.evaluate(r, smoothing_length)));
        c.bench_function("CubicSpline.gradient", |b| b.iter(|| kernel.gradient(r_ab, r, smoothing_length)));
        c.bench_function("CubicSpline.radius_deriv", |b| b.iter(|| kernel.radius_deriv(r, smoothing_length)));
    }
    {
        let kernel = black_box(QuarticSpline);
        c.bench_function("QuarticSpline.evaluate", |b| b.iter(|| kernel.evaluate(r, smoothing_length)));
        c.bench_function("QuarticSpline.gradient", |b| b.iter(|| kernel.gradient(r_ab, r, smoothing_length)));
    }
    {
        let kernel = black_box(QuinticSpline);
        c.bench_function("QuinticSpline.evaluate", |b| b.iter(|| kernel.evaluate(r, smoothing_length)));
        c.bench_function("QuinticSpline.gradient", |b| b.iter(|| kernel.gradient(r_ab, r, smoothing_length)));
    }
    {
        let kernel = black_box(ThomasCouchman);
        c.bench_function("ThomasCouchman.evaluate", |b| b.iter(|| kernel.evaluate(r, smoothing_length)));
        c.bench_function("ThomasCouchman.gradient", |b| b.iter(|| kernel.gradient(r_ab, r, smoothing_length)));
    }
    {
        let kernel = black_box(Gaussian);
        c.bench_function("Gaussian.evaluate", |b| b.iter(|| kernel.evaluate(r, smoothing_length)));
        c.bench_function("Gaussian.gradient", |b| b.iter(|| kernel.gradient(r_ab, r, smoothing_length)));
        c.bench_function("Gaussian.radius_deriv", |b| b.iter(|| kernel.radius_deriv(r, smoothing_length)));
    }
}

fn config() -> Criterion {
    Criterion::default()
        .warm_up_time(core::time::Duration::new(0, 100))
        .sample_size(1000)
        .significance_level(0.1)
}

criterion_group!(
    name = smoothing_kernel;
    config = config();
    targets = bench_kernels
);
