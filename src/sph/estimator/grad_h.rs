use super::super::artificial_viscosity::ArtificialViscosity;
use super::super::equation_of_state::EquationOfState;
use super::super::particles::{FieldSnapshot, ParticleCloud, Particles};
use super::super::smoothing_kernel::Kernel;
use super::{EstimateError, Estimator, WidthSolveFailure};
use crate::math::{bisection, newton_raphson, small_number};
use crate::parallel::{AutoPartitioner, Partitioner};
use crate::units::*;
use cgmath::prelude::*;
use rayon::prelude::*;

// Variable width estimator. Every particle solves for the width that pins the mass inside
// its own kernel support, and the resulting coupling between width and density enters the
// force terms through the Ω correction factors, as in "Cosmological smoothed particle
// hydrodynamics simulations: the entropy equation", Springel & Hernquist 2002, MNRAS 333.
// https://doi.org/10.1046/j.1365-8711.2002.05445.x
pub struct GradHEstimator<TEos, TKernel, TViscosity, TPartitioner = AutoPartitioner> {
    eos: TEos,
    kernel: TKernel,
    viscosity: TViscosity,
    partitioner: TPartitioner,
    /// Coupling η between width and local spacing, h = η (m / ρ)^(1/D).
    pub coupling: Real,
    /// Density residual below which a particle's width solve counts as converged.
    pub width_tolerance: Real,
    /// Iteration budget of the per-particle width solve.
    pub max_width_iterations: usize,
}

impl<TEos, TKernel, TViscosity> GradHEstimator<TEos, TKernel, TViscosity> {
    pub fn new(eos: TEos, kernel: TKernel, viscosity: TViscosity, coupling: Real) -> GradHEstimator<TEos, TKernel, TViscosity> {
        Self::with_partitioner(eos, kernel, viscosity, coupling, AutoPartitioner)
    }
}

impl<TEos, TKernel, TViscosity, TPartitioner> GradHEstimator<TEos, TKernel, TViscosity, TPartitioner> {
    pub fn with_partitioner(
        eos: TEos,
        kernel: TKernel,
        viscosity: TViscosity,
        coupling: Real,
        partitioner: TPartitioner,
    ) -> GradHEstimator<TEos, TKernel, TViscosity, TPartitioner> {
        GradHEstimator {
            eos,
            kernel,
            viscosity,
            partitioner,
            coupling,
            width_tolerance: small_number(),
            max_width_iterations: 30,
        }
    }
}

impl<TEos, TKernel, TViscosity, TPartitioner> Estimator for GradHEstimator<TEos, TKernel, TViscosity, TPartitioner>
where
    TEos: EquationOfState + std::marker::Sync,
    TKernel: Kernel + std::marker::Sync,
    TViscosity: ArtificialViscosity + std::marker::Sync,
    TPartitioner: Partitioner,
{
    fn init(&self, cloud: &mut ParticleCloud) -> Result<(), EstimateError> {
        super::validate_particles(&cloud.particles, &self.eos, &self.viscosity)?;
        super::check_positive_width(self.coupling)?;

        let particles = &mut cloud.particles;
        let grad_h_factors = super::require_field_mut("grad_h_factors", &mut particles.grad_h_factors)?;
        let thermal_energies = particles.thermal_energies.as_deref();
        for a in 0..particles.positions.len() {
            if !particles.fixed[a] {
                continue;
            }
            particles.smoothing_lengths[a] = self.coupling * (particles.masses[a] / particles.densities[a]).powf(1.0 / DIM as Real);
            grad_h_factors[a] = 1.0;
            let eps_a = thermal_energies.map_or(0.0, |eps| eps[a]);
            particles.pressures[a] = self.eos.pressure(particles.densities[a], eps_a);
            particles.sound_speeds[a] = self.eos.sound_speed(particles.densities[a], eps_a);
        }
        Ok(())
    }

    fn estimate_density(&self, cloud: &mut ParticleCloud) -> Result<(), EstimateError> {
        microprofile::scope!("GradHEstimator", "estimate_density");
        super::validate_particles(&cloud.particles, &self.eos, &self.viscosity)?;
        super::check_positive_width(self.coupling)?;
        super::check_positive_widths(&cloud.particles.smoothing_lengths)?;

        let kernel = &self.kernel;
        let eos = &self.eos;
        let coupling = self.coupling;
        let width_tolerance = self.width_tolerance;
        let max_width_iterations = self.max_width_iterations;
        let particles = &mut cloud.particles;
        let grad_h_factors = super::require_field_mut("grad_h_factors", &mut particles.grad_h_factors)?;

        // width, density, pressure and sound speed
        let failures: Vec<WidthSolveFailure> = {
            let positions = &particles.positions[..];
            let masses = &particles.masses[..];
            let thermal_energies = particles.thermal_energies.as_deref();

            self.partitioner
                .blockify(
                    (
                        &mut particles.smoothing_lengths,
                        &mut particles.densities,
                        grad_h_factors,
                        &mut particles.pressures,
                        &mut particles.sound_speeds,
                        positions,
                        masses,
                        &particles.fixed,
                    )
                        .into_par_iter()
                        .enumerate(),
                )
                .filter_map(|(a, (h_a, rho_a, omega_a, p_a, cs_a, &ra, &m_a, &is_fixed))| {
                    if is_fixed {
                        return None;
                    }
                    // Solve ζ(h) = 0 for the width, where ζ(h) = Rho(h) - ρ(h) is the gap
                    // between the density the width should resolve, Rho(h) = m (η / h)^D,
                    // and the density the kernel sum measures at that width.
                    let mut evaluate = |h: Real| {
                        *rho_a = 0.0;
                        let mut omega_sum = 0.0;
                        Particles::foreach_neighbor_particle(
                            positions,
                            kernel.radius(h),
                            ra,
                            #[inline(always)]
                            |b, r_sq, _r_ab| {
                                let r = r_sq.sqrt();
                                *rho_a += masses[b] * kernel.evaluate(r, h);
                                omega_sum += masses[b] * kernel.radius_deriv(r, h);
                            },
                        );
                        let target_rho_a = m_a * (coupling / h).powi(DIM as i32);
                        let d_target_rho_dh_a = -(DIM as Real) * target_rho_a / h;
                        *omega_a = 1.0 - omega_sum / d_target_rho_dh_a;
                        (target_rho_a - *rho_a, d_target_rho_dh_a - omega_sum)
                    };
                    let seed = *h_a;
                    let result = newton_raphson(
                        h_a,
                        |h| {
                            let (zeta, dzeta_dh) = evaluate(h);
                            // ζ stays finite at negative widths and picks up roots there
                            // with no physical meaning. Damp any step that would cross
                            // zero to half the current width by reporting the matching
                            // secant slope instead of the true derivative.
                            let next_h = h - zeta / dzeta_dh;
                            if next_h.is_finite() && next_h > 0.0 {
                                (zeta, dzeta_dh)
                            } else {
                                (zeta, 2.0 * zeta / h)
                            }
                        },
                        width_tolerance,
                        max_width_iterations,
                    );
                    let result = match result {
                        Ok(()) => Ok(()),
                        // retry on a sign-change bracket around the seed before giving up
                        Err(error) => {
                            match bracketed_width_root(seed, |h| evaluate(h).0, width_tolerance, max_width_iterations) {
                                Some(root) => {
                                    *h_a = root;
                                    // settle ρ and Ω at the accepted width
                                    evaluate(root);
                                    Ok(())
                                }
                                None => Err(error),
                            }
                        }
                    };
                    let eps_a = thermal_energies.map_or(0.0, |eps| eps[a]);
                    *p_a = eos.pressure(*rho_a, eps_a);
                    *cs_a = eos.sound_speed(*rho_a, eps_a);
                    match result {
                        Ok(()) => {
                            // the damp and the bracket keep every accepted width on the positive axis
                            debug_assert!(h_a.is_finite() && *h_a > 0.0);
                            None
                        }
                        Err(error) => {
                            // keep the last width iterate, but a correction factor from a
                            // non-converged solve would poison the forces
                            *omega_a = 1.0;
                            Some(WidthSolveFailure {
                                particle: a,
                                width: *h_a,
                                error,
                            })
                        }
                    }
                })
                .collect()
        };
        if !failures.is_empty() {
            log::warn!(
                "kernel width solve failed for {} of {} particles",
                failures.len(),
                particles.positions.len()
            );
            return Err(EstimateError::WidthSolve(failures));
        }

        // velocity divergence and curl, for every particle of clouds that carry the fields
        if let (Some(velocity_divergences), Some(velocity_curls)) = (&mut particles.velocity_divergences, &mut particles.velocity_curls) {
            let positions = &particles.positions[..];
            let velocities = &particles.velocities[..];
            let masses = &particles.masses[..];
            let densities = &particles.densities[..];
            let smoothing_lengths = &particles.smoothing_lengths[..];

            self.partitioner
                .blockify((velocity_divergences, velocity_curls, positions, velocities, densities, smoothing_lengths).into_par_iter())
                .for_each(|(div_a, curl_a, &ra, &va, &rho_a, &h_a)| {
                    let va_over_rho_sq = va / (rho_a * rho_a);
                    *div_a = 0.0;
                    *curl_a = 0.0;
                    Particles::foreach_neighbor_particle(
                        positions,
                        kernel.radius(h_a),
                        ra,
                        #[inline(always)]
                        |b, r_sq, r_ab| {
                            let r = r_sq.sqrt();
                            let grad_aba = kernel.gradient(r_ab, r, h_a);
                            let grad_abb = kernel.gradient(r_ab, r, smoothing_lengths[b]);
                            let vb_over_rho_sq = velocities[b] / (densities[b] * densities[b]);
                            *div_a += masses[b] * (va_over_rho_sq.dot(grad_aba) + vb_over_rho_sq.dot(grad_abb));
                            *curl_a -= masses[b] * (va_over_rho_sq.perp_dot(grad_aba) + vb_over_rho_sq.perp_dot(grad_abb));
                        },
                    );
                    *div_a *= rho_a;
                    *curl_a *= rho_a;
                });
        }

        Ok(())
    }

    fn estimate_forces(&self, cloud: &mut ParticleCloud) -> Result<(), EstimateError> {
        microprofile::scope!("GradHEstimator", "estimate_forces");
        super::validate_particles(&cloud.particles, &self.eos, &self.viscosity)?;
        super::check_positive_widths(&cloud.particles.smoothing_lengths)?;

        let kernel = &self.kernel;
        let viscosity = &self.viscosity;
        let gravity = cloud.gravity;
        let particles = &mut cloud.particles;
        let grad_h_factors = super::require_field("grad_h_factors", &particles.grad_h_factors)?;

        let fields = FieldSnapshot {
            positions: &particles.positions,
            velocities: &particles.velocities,
            masses: &particles.masses,
            smoothing_lengths: &particles.smoothing_lengths,
            densities: &particles.densities,
            pressures: &particles.pressures,
            sound_speeds: &particles.sound_speeds,
            velocity_divergences: particles.velocity_divergences.as_deref(),
            velocity_curls: particles.velocity_curls.as_deref(),
            thermal_energies: particles.thermal_energies.as_deref(),
            viscosity_switches: particles.viscosity_switches.as_deref(),
            grad_h_factors: Some(grad_h_factors),
        };

        // acceleration, and thermal heating for clouds that carry energy fields
        match &mut particles.thermal_energy_rates {
            Some(thermal_energy_rates) => {
                self.partitioner
                    .blockify(
                        (&mut particles.accelerations, thermal_energy_rates, fields.positions, &particles.fixed)
                            .into_par_iter()
                            .enumerate(),
                    )
                    .for_each(|(a, (dv_dt_a, deps_dt_a, &ra, &is_fixed))| {
                        if is_fixed {
                            return;
                        }
                        *dv_dt_a = gravity;
                        *deps_dt_a = 0.0;
                        let h_a = fields.smoothing_lengths[a];
                        let pa_term = fields.pressures[a] / (grad_h_factors[a] * fields.densities[a] * fields.densities[a]);
                        let va = fields.velocities[a];
                        Particles::foreach_neighbor_particle(
                            fields.positions,
                            kernel.radius(h_a),
                            ra,
                            #[inline(always)]
                            |b, r_sq, r_ab| {
                                let r = r_sq.sqrt();
                                let pi_ab = viscosity.kinematic(&fields, a, b, r_sq, r_ab);
                                let grad_aba = kernel.gradient(r_ab, r, h_a);
                                let grad_abb = kernel.gradient(r_ab, r, fields.smoothing_lengths[b]);
                                let grad_ab = 0.5 * (grad_aba + grad_abb);
                                let pb_term = fields.pressures[b] / (grad_h_factors[b] * fields.densities[b] * fields.densities[b]);
                                let v_ab = va - fields.velocities[b];
                                *dv_dt_a -= fields.masses[b] * (pa_term * grad_aba + pb_term * grad_abb + pi_ab * grad_ab);
                                *deps_dt_a += fields.masses[b] * (pa_term * grad_aba.dot(v_ab) + pi_ab * grad_ab.dot(v_ab));
                            },
                        );
                    });
            }
            None => {
                self.partitioner
                    .blockify(
                        (&mut particles.accelerations, fields.positions, &particles.fixed)
                            .into_par_iter()
                            .enumerate(),
                    )
                    .for_each(|(a, (dv_dt_a, &ra, &is_fixed))| {
                        if is_fixed {
                            return;
                        }
                        *dv_dt_a = gravity;
                        let h_a = fields.smoothing_lengths[a];
                        let pa_term = fields.pressures[a] / (grad_h_factors[a] * fields.densities[a] * fields.densities[a]);
                        Particles::foreach_neighbor_particle(
                            fields.positions,
                            kernel.radius(h_a),
                            ra,
                            #[inline(always)]
                            |b, r_sq, r_ab| {
                                let r = r_sq.sqrt();
                                let pi_ab = viscosity.kinematic(&fields, a, b, r_sq, r_ab);
                                let grad_aba = kernel.gradient(r_ab, r, h_a);
                                let grad_abb = kernel.gradient(r_ab, r, fields.smoothing_lengths[b]);
                                let grad_ab = 0.5 * (grad_aba + grad_abb);
                                let pb_term = fields.pressures[b] / (grad_h_factors[b] * fields.densities[b] * fields.densities[b]);
                                *dv_dt_a -= fields.masses[b] * (pa_term * grad_aba + pb_term * grad_abb + pi_ab * grad_ab);
                            },
                        );
                    });
            }
        }

        // viscosity switch rates
        if let Some(viscosity_switch_rates) = &mut particles.viscosity_switch_rates {
            self.partitioner
                .blockify((viscosity_switch_rates, &particles.fixed).into_par_iter().enumerate())
                .for_each(|(a, (dalpha_dt_a, &is_fixed))| {
                    if is_fixed {
                        return;
                    }
                    *dalpha_dt_a = viscosity.switch_deriv(&fields, a);
                });
        }

        Ok(())
    }
}

// Fallback for seeds the damped Newton iteration cannot recover from. Expands a
// geometric bracket around the seed on the positive axis until the density residual
// changes sign, then collapses it with false position. The residual is positive for
// vanishing widths (the target density outgrows the kernel's central weight) and
// negative once the support spans the neighborhood's mass, so a sign change sits a
// few octaves out whenever a physical root exists at all.
fn bracketed_width_root(seed: Real, mut f: impl FnMut(Real) -> Real, eps: Real, max_iter: usize) -> Option<Real> {
    const MAX_BRACKET_OCTAVES: usize = 16;

    let mut min_h = seed;
    let mut max_h = seed;
    let mut min_f = f(min_h);
    let mut max_f = min_f;
    for _ in 0..MAX_BRACKET_OCTAVES {
        if min_f.signum() != max_f.signum() {
            return bisection(&mut min_h, &mut max_h, &mut f, eps, max_iter).ok().map(|()| min_h);
        }
        min_h *= 0.5;
        max_h *= 2.0;
        min_f = f(min_h);
        max_f = f(max_h);
    }
    None
}
