use cgmath::prelude::*;

use super::particles::FieldSnapshot;
use crate::units::{Real, Vector};

pub trait ArtificialViscosity {
    // kinematic dissipation term Π_ab for a particle pair, entering the momentum and
    // thermal estimates next to the pressure terms. `r_ab` points from b towards a.
    fn kinematic(&self, fields: &FieldSnapshot, a: usize, b: usize, r_sq: Real, r_ab: Vector) -> Real;

    // rate of change of the per-particle switch α (zero for models without an evolving switch)
    fn switch_deriv(&self, fields: &FieldSnapshot, a: usize) -> Real;

    // whether the model reads velocity divergence (and curl), i.e. whether particles need those fields
    fn requires_velocity_derivatives(&self) -> bool {
        false
    }

    // whether the model evolves a per-particle switch α, i.e. whether particles need a switch field
    fn requires_viscosity_switch(&self) -> bool {
        false
    }
}

/// No artificial dissipation at all. Only useful for static configurations or for testing
/// the conservative parts of an estimator in isolation.
#[derive(Copy, Clone)]
pub struct NullViscosity;

impl ArtificialViscosity for NullViscosity {
    #[inline]
    fn kinematic(&self, _fields: &FieldSnapshot, _a: usize, _b: usize, _r_sq: Real, _r_ab: Vector) -> Real {
        0.0
    }

    #[inline]
    fn switch_deriv(&self, _fields: &FieldSnapshot, _a: usize) -> Real {
        0.0
    }
}

// Standard α-β artificial viscosity as in "Smoothed Particle Hydrodynamics",
// Monaghan 1992, Annu. Rev. Astron. Astrophys. 30, section 4.1.
// Pairs only dissipate while approaching each other, so rarefaction stays untouched.
pub struct MonaghanViscosity {
    pub alpha: Real,   // linear bulk strength, typically 1
    pub beta: Real,    // quadratic (von Neumann-Richtmyer like) strength, typically 2
    pub epsilon: Real, // guards μ_ab against the singularity of nearly coincident pairs
}

impl MonaghanViscosity {
    pub fn new(alpha: Real, beta: Real) -> MonaghanViscosity {
        MonaghanViscosity {
            alpha,
            beta,
            epsilon: 0.01,
        }
    }
}

impl ArtificialViscosity for MonaghanViscosity {
    #[inline]
    fn kinematic(&self, fields: &FieldSnapshot, a: usize, b: usize, r_sq: Real, r_ab: Vector) -> Real {
        let approach = (fields.velocities[a] - fields.velocities[b]).dot(r_ab);
        if approach >= 0.0 {
            return 0.0;
        }
        let h_ab = 0.5 * (fields.smoothing_lengths[a] + fields.smoothing_lengths[b]);
        let cs_ab = 0.5 * (fields.sound_speeds[a] + fields.sound_speeds[b]);
        let rho_ab = 0.5 * (fields.densities[a] + fields.densities[b]);
        let mu_ab = h_ab * approach / (r_sq + self.epsilon * h_ab * h_ab);
        (-self.alpha * cs_ab * mu_ab + self.beta * mu_ab * mu_ab) / rho_ab
    }

    #[inline]
    fn switch_deriv(&self, _fields: &FieldSnapshot, _a: usize) -> Real {
        0.0
    }
}

// Time-dependent viscosity strength as in "A Switch to Reduce SPH Viscosity",
// Morris & Monaghan 1997, J. Comput. Phys. 136.
// Every particle carries its own α that decays towards `alpha_min` over a few sound
// crossing times of the kernel support and is driven up again by compression. The
// pair term is the α-β form with ᾱ_ab averaged from the two switches and β = 2ᾱ_ab.
pub struct MorrisMonaghanViscosity {
    pub alpha_min: Real,   // floor the switch decays towards, typically 0.1
    pub alpha_max: Real,   // cap for the compression driven growth, typically 2
    pub epsilon: Real,     // guards μ_ab against the singularity of nearly coincident pairs
    pub decay_sigma: Real, // σ in the decay time τ = h / (σ c), typically 0.1
}

impl MorrisMonaghanViscosity {
    pub fn new(alpha_min: Real, alpha_max: Real) -> MorrisMonaghanViscosity {
        MorrisMonaghanViscosity {
            alpha_min,
            alpha_max,
            epsilon: 0.01,
            decay_sigma: 0.1,
        }
    }
}

impl ArtificialViscosity for MorrisMonaghanViscosity {
    #[inline]
    fn kinematic(&self, fields: &FieldSnapshot, a: usize, b: usize, r_sq: Real, r_ab: Vector) -> Real {
        let approach = (fields.velocities[a] - fields.velocities[b]).dot(r_ab);
        if approach >= 0.0 {
            return 0.0;
        }
        let alpha_ab = match fields.viscosity_switches {
            Some(switches) => 0.5 * (switches[a] + switches[b]),
            None => self.alpha_min,
        };
        let h_ab = 0.5 * (fields.smoothing_lengths[a] + fields.smoothing_lengths[b]);
        let cs_ab = 0.5 * (fields.sound_speeds[a] + fields.sound_speeds[b]);
        let rho_ab = 0.5 * (fields.densities[a] + fields.densities[b]);
        let mu_ab = h_ab * approach / (r_sq + self.epsilon * h_ab * h_ab);
        (-alpha_ab * cs_ab * mu_ab + 2.0 * alpha_ab * mu_ab * mu_ab) / rho_ab
    }

    #[inline]
    fn switch_deriv(&self, fields: &FieldSnapshot, a: usize) -> Real {
        let (switches, divergences) = match (fields.viscosity_switches, fields.velocity_divergences) {
            (Some(switches), Some(divergences)) => (switches, divergences),
            _ => return 0.0,
        };
        let alpha = switches[a];
        let decay_time = fields.smoothing_lengths[a] / (self.decay_sigma * fields.sound_speeds[a]);
        let source = (-divergences[a]).max(0.0) * (self.alpha_max - alpha);
        (self.alpha_min - alpha) / decay_time + source
    }

    fn requires_velocity_derivatives(&self) -> bool {
        true
    }

    fn requires_viscosity_switch(&self) -> bool {
        true
    }
}
