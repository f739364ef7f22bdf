use criterion::{black_box, criterion_group, Criterion};

use gradsph2d::{
    sph::{self, smoothing_kernel::CubicSpline, Estimator},
    units::*,
};

fn bench_estimate_density(c: &mut Criterion) {
    {
        let mut cloud = sph::ParticleCloud::new(
            2.0,     // smoothing factor
            10000.0, // #particles/m²
            100.0,   // water in 2d
            sph::OptionalFields::default(),
        );
        cloud.add_fluid_rect(Point::new(0.0, 0.0), Vector::new(1.0, 1.0), 0.5);
        cloud.add_boundary_line(Point::new(-0.5, -0.05), Point::new(1.5, -0.05));

        let estimator = black_box(sph::ClassicEstimator::new(
            sph::TaitEquationOfState::new(100.0, 20.0),
            CubicSpline,
            sph::NullViscosity,
            cloud.properties.smoothing_length(),
        ));

        c.bench_function(
            &format!("ClassicEstimator.estimate_density - cloud with {} particles", cloud.particles.num_particles()),
            |b| b.iter(|| estimator.estimate_density(&mut cloud).unwrap()),
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
            sph::NullViscosity,
            1.2,
        ));
        // first call walks every width to its root, the benched calls re-solve warm
        estimator.estimate_density(&mut cloud).unwrap();

        c.bench_function(
            &format!("GradHEstimator.estimate_density - cloud with {} particles", cloud.particles.num_particles()),
            |b| b.iter(|| estimator.estimate_density(&mut cloud).unwrap()),
        );
    }
}

fn config() -> Criterion {
    Criterion::default().sample_size(50)
}

criterion_group!(
    name = estimate_density;
    config = config();
    targets = bench_estimate_density
);
