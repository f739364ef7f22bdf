use criterion::{black_box, criterion_group, Criterion};

use gradsph2d::{
    sph::{self, smoothing_kernel::CubicSpline, Estimator},
    units::*,
};

fn bench_estimate_forces(c: &mut Criterion) {
    {
        let mut cloud = sph::ParticleCloud::new(2.0, 10000.0, 100.0, sph::OptionalFields::default());
        cloud.add_fluid_rect(Point::new(0.0, 0.0), Vector::new(1.0, 1.0), 0.5);
        cloud.add_boundary_line(Point::new(-0.5, -0.05), Point::new(1.5, -0.05));

        let estimator = black_box(sph::ClassicEstimator::new(
            sph::TaitEquationOfState::new(100.0, 20.0),
            CubicSpline,
            sph::MonaghanViscosity::new(1.0, 2.0),
            cloud.properties.smoothing_length(),
        ));
        estimator.init(&mut cloud).unwrap();
        estimator.estimate_density(&mut cloud).unwrap();

        c.bench_function(
            &format!("ClassicEstimator.estimate_forces - cloud with {} particles", cloud.particles.num_particles()),
            |b| b.iter(|| estimator.estimate_forces(&mut cloud).unwrap()),
        );
    }
    {
        let mut cloud = sph::ParticleCloud::new(
            1.2,
            10000.0,
            100.0,
            sph::OptionalFields {
                grad_h_correction: true,
                ..Default::default()
            },
        );
        cloud.add_fluid_rect(Point::new(0.0, 0.0), Vector::new(1.0, 1.0), 0.5);
        cloud.add_boundary_line(Point::new(-0.5, -0.05), Point::new(1.5, -0.05));

        let estimator = black_box(sph::GradHEstimator::new(
            sph::TaitEquationOfState::new(100.0, 20.0),
            CubicSpline,
            sph::MonaghanViscosity::new(1.0, 2.0),
            1.2,
        ));
        estimator.init(&mut cloud).unwrap();
        estimator.estimate_density(&mut cloud).unwrap();

        c.bench_function(
            &format!("GradHEstimator.estimate_forces - cloud with {} particles", cloud.particles.num_particles()),
            |b| b.iter(|| estimator.estimate_forces(&mut cloud).unwrap()),
        );
    }
}

fn config() -> Criterion {
    Criterion::default().sample_size(50)
}

criterion_group!(
    name = estimate_forces;
    config = config();
    targets = bench_estimate_forces
);
