use cgmath::prelude::*;

use crate::units::*;

/// Optional per-particle field groups a cloud carries.
///
/// Estimators and strategies check these capabilities up front and skip or reject work
/// accordingly; the hot loops never test field presence per particle.
#[derive(Debug, Default, Copy, Clone)]
pub struct OptionalFields {
    /// Velocity divergence and curl estimates.
    pub velocity_derivatives: bool,
    /// Specific thermal energy and its rate.
    pub thermal_energy: bool,
    /// Evolving artificial viscosity switch and its rate.
    pub viscosity_switch: bool,
    /// Grad-h coupling correction Ω.
    pub grad_h_correction: bool,
}

pub struct Particles {
    pub positions: Vec<Point>,
    pub velocities: Vec<Vector>,
    pub accelerations: Vec<Vector>, // dv/dt
    pub masses: Vec<Real>,
    pub smoothing_lengths: Vec<Real>, // kernel widths h, per-particle under the grad-h estimator
    pub densities: Vec<Real>,         // local densities ρ
    pub pressures: Vec<Real>,
    pub sound_speeds: Vec<Real>,
    pub fixed: Vec<bool>, // boundary/shadow particles, hold prescribed values

    pub velocity_divergences: Option<Vec<Real>>,
    pub velocity_curls: Option<Vec<Real>>, // 2D curl is a scalar
    pub thermal_energies: Option<Vec<Real>>, // ε
    pub thermal_energy_rates: Option<Vec<Real>>, // dε/dt
    pub viscosity_switches: Option<Vec<Real>>, // α
    pub viscosity_switch_rates: Option<Vec<Real>>, // dα/dt
    pub grad_h_factors: Option<Vec<Real>>, // Ω
}

impl Particles {
    fn new(optional_fields: OptionalFields) -> Particles {
        let optional = |enabled: bool| if enabled { Some(Vec::new()) } else { None };
        Particles {
            positions: Vec::new(),
            velocities: Vec::new(),
            accelerations: Vec::new(),
            masses: Vec::new(),
            smoothing_lengths: Vec::new(),
            densities: Vec::new(),
            pressures: Vec::new(),
            sound_speeds: Vec::new(),
            fixed: Vec::new(),

            velocity_divergences: optional(optional_fields.velocity_derivatives),
            velocity_curls: optional(optional_fields.velocity_derivatives),
            thermal_energies: optional(optional_fields.thermal_energy),
            thermal_energy_rates: optional(optional_fields.thermal_energy),
            viscosity_switches: optional(optional_fields.viscosity_switch),
            viscosity_switch_rates: optional(optional_fields.viscosity_switch),
            grad_h_factors: optional(optional_fields.grad_h_correction),
        }
    }

    pub fn num_particles(&self) -> usize {
        self.positions.len()
    }

    pub fn num_fixed_particles(&self) -> usize {
        self.fixed.iter().filter(|&&fixed| fixed).count()
    }

    fn reserve(&mut self, additional: usize) {
        self.positions.reserve(additional);
        self.velocities.reserve(additional);
        self.accelerations.reserve(additional);
        self.masses.reserve(additional);
        self.smoothing_lengths.reserve(additional);
        self.densities.reserve(additional);
        self.pressures.reserve(additional);
        self.sound_speeds.reserve(additional);
        self.fixed.reserve(additional);
    }

    /// Invokes `f(b, r_sq, r_ab)` for every particle within `search_radius` of `ra`, where
    /// `r_ab = ra - positions[b]`. A particle scanning its own neighborhood is handed itself
    /// as well; kernel gradients vanish there. Coincident distinct particles are not skipped.
    ///
    /// Plain linear scan. Callers only see the callback contract, so an acceleration
    /// structure can replace this without touching any estimation pass.
    #[inline(always)]
    pub(super) fn foreach_neighbor_particle(positions: &[Point], search_radius: Real, ra: Point, mut f: impl FnMut(usize, Real, Vector)) {
        let search_radius_sq = search_radius * search_radius;
        for (b, rb) in positions.iter().enumerate() {
            let r_ab = ra - rb;
            let r_sq = r_ab.magnitude2();
            if r_sq > search_radius_sq {
                continue;
            }
            f(b, r_sq, r_ab);
        }
    }
}

/// Read-only view of the per-particle input fields of one estimation pass.
///
/// Strategies receive this instead of `&Particles` so that passes can hold mutable borrows
/// of their output arrays at the same time. Output arrays (accelerations, rates) are absent.
#[derive(Copy, Clone)]
pub struct FieldSnapshot<'a> {
    pub positions: &'a [Point],
    pub velocities: &'a [Vector],
    pub masses: &'a [Real],
    pub smoothing_lengths: &'a [Real],
    pub densities: &'a [Real],
    pub pressures: &'a [Real],
    pub sound_speeds: &'a [Real],
    pub velocity_divergences: Option<&'a [Real]>,
    pub velocity_curls: Option<&'a [Real]>,
    pub thermal_energies: Option<&'a [Real]>,
    pub viscosity_switches: Option<&'a [Real]>,
    pub grad_h_factors: Option<&'a [Real]>,
}

/// Bulk properties of the resting fluid, fixed at cloud construction.
pub struct ConstantFluidProperties {
    smoothing_length: Real, // typically expressed as 'h'
    particle_density: Real, // #particles/m² for resting fluid
    fluid_density: Real,    // kg/m² for the resting fluid (ρ, rho)
}

impl ConstantFluidProperties {
    fn new(smoothing_factor: Real, particle_density: Real, fluid_density: Real) -> ConstantFluidProperties {
        let smoothing_length = 2.0 * Self::particle_radius_from_particle_density(particle_density) * smoothing_factor;
        ConstantFluidProperties {
            smoothing_length,
            particle_density,
            fluid_density,
        }
    }

    /// Seed kernel width, derived from the particle density and the smoothing factor.
    pub fn smoothing_length(&self) -> Real {
        self.smoothing_length
    }

    pub fn fluid_density(&self) -> Real {
        self.fluid_density
    }

    pub fn particle_mass(&self) -> Real {
        self.fluid_density / self.particle_density
    }

    fn particle_radius_from_particle_density(particle_density: Real) -> Real {
        // density is per m²
        0.5 / particle_density.sqrt()
    }

    fn num_particles_per_meter(&self) -> Real {
        self.particle_density.sqrt()
    }
}

/// A cloud of SPH particles together with its bulk properties and ambient body force.
pub struct ParticleCloud {
    pub particles: Particles,
    pub properties: ConstantFluidProperties,
    pub gravity: Vector, // global gravity force in m/s² (== N/kg)
}

impl ParticleCloud {
    pub fn new(
        smoothing_factor: Real,
        particle_density: Real, // #particles/m² for resting fluid
        fluid_density: Real,    // kg/m² for the resting fluid
        optional_fields: OptionalFields,
    ) -> ParticleCloud {
        ParticleCloud {
            particles: Particles::new(optional_fields),
            properties: ConstantFluidProperties::new(smoothing_factor, particle_density, fluid_density),
            gravity: Vector::new(0.0, -9.81),
        }
    }

    /// Fills an axis aligned rectangle with fluid particles on a jittered lattice.
    /// `jitter_amount`: 0 for a perfect lattice. >1 and particles are no longer in a strict lattice.
    pub fn add_fluid_rect(&mut self, bottom_left: Point, size: Vector, jitter_amount: Real) {
        // size.x * size.y * particle_density particles, but discretized per axis
        let num_particles_per_meter = self.properties.num_particles_per_meter();
        let num_particles_x = std::cmp::max(1, (size.x * num_particles_per_meter) as usize);
        let num_particles_y = std::cmp::max(1, (size.y * num_particles_per_meter) as usize);
        self.particles.reserve(num_particles_x * num_particles_y);

        let step = (size.x / (num_particles_x as Real)).min(size.y / (num_particles_y as Real));
        let jitter_factor = step * jitter_amount;
        for y in 0..num_particles_y {
            for x in 0..num_particles_x {
                let jitter = (rand::random::<Vector>() * 0.5 + Vector::new(0.5, 0.5)) * jitter_factor;
                let position = bottom_left + jitter + Vector::new(step * (x as Real), step * (y as Real));
                self.push_particle(position, false);
            }
        }
    }

    /// Adds a line of fixed particles acting as a boundary.
    pub fn add_boundary_line(&mut self, start: Point, end: Point) {
        let distance = start.distance(end);
        let num_particles_per_meter = self.properties.num_particles_per_meter();
        let num_particles = std::cmp::max(1, (distance * num_particles_per_meter) as usize);
        self.particles.reserve(num_particles);
        let step = (end - start) / (num_particles as Real);

        let mut position = start;
        for _ in 0..num_particles {
            self.push_particle(position, true);
            position += step;
        }
    }

    fn push_particle(&mut self, position: Point, fixed: bool) {
        let particles = &mut self.particles;
        particles.positions.push(position);
        particles.velocities.push(Zero::zero());
        particles.accelerations.push(Zero::zero());
        particles.masses.push(self.properties.particle_mass());
        particles.smoothing_lengths.push(self.properties.smoothing_length);
        particles.densities.push(self.properties.fluid_density);
        particles.pressures.push(0.0);
        particles.sound_speeds.push(0.0);
        particles.fixed.push(fixed);

        if let Some(velocity_divergences) = &mut particles.velocity_divergences {
            velocity_divergences.push(0.0);
        }
        if let Some(velocity_curls) = &mut particles.velocity_curls {
            velocity_curls.push(0.0);
        }
        if let Some(thermal_energies) = &mut particles.thermal_energies {
            thermal_energies.push(0.0);
        }
        if let Some(thermal_energy_rates) = &mut particles.thermal_energy_rates {
            thermal_energy_rates.push(0.0);
        }
        if let Some(viscosity_switches) = &mut particles.viscosity_switches {
            viscosity_switches.push(1.0);
        }
        if let Some(viscosity_switch_rates) = &mut particles.viscosity_switch_rates {
            viscosity_switch_rates.push(0.0);
        }
        if let Some(grad_h_factors) = &mut particles.grad_h_factors {
            grad_h_factors.push(1.0);
        }
    }
}
