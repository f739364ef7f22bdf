pub use classic::ClassicEstimator;
pub use grad_h::GradHEstimator;

mod classic;
mod grad_h;

// ------------------------------------------------------

use super::artificial_viscosity::ArtificialViscosity;
use super::equation_of_state::EquationOfState;
use super::particles::{ParticleCloud, Particles};
use crate::math::NewtonRaphsonError;
use crate::units::Real;

/// A particle whose kernel width solve gave up, along with the width it was left at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthSolveFailure {
    pub particle: usize,
    pub width: Real,
    pub error: NewtonRaphsonError,
}

/// Why an estimation pass refused to run or could not complete.
#[derive(Debug)]
pub enum EstimateError {
    /// A configured or seeded kernel width is not positive.
    NonPositiveWidth { width: Real },
    /// The cloud lacks an optional field the configured strategies read or write.
    MissingField { field: &'static str },
    /// A per-particle field array went out of sync with the positions array.
    FieldLengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The kernel width solve did not converge for these particles. They keep their
    /// last width iterate and their grad-h correction is reset to one.
    WidthSolve(Vec<WidthSolveFailure>),
}

impl std::fmt::Display for EstimateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimateError::NonPositiveWidth { width } => write!(f, "kernel width must be positive, got {}", width),
            EstimateError::MissingField { field } => write!(f, "particle cloud does not carry the {} field", field),
            EstimateError::FieldLengthMismatch { field, expected, actual } => {
                write!(f, "field {} holds {} entries, expected {}", field, actual, expected)
            }
            EstimateError::WidthSolve(failures) => write!(f, "kernel width solve failed for {} particle(s)", failures.len()),
        }
    }
}

impl std::error::Error for EstimateError {}

/// Common interface of the smoothing estimators.
///
/// Object safe, so applications can pick an estimator at runtime and drive it through
/// `&dyn Estimator`. The expected call order is `init` once after seeding the cloud,
/// then `estimate_density` followed by `estimate_forces` per step.
pub trait Estimator {
    /// Writes width, pressure and sound speed of fixed particles once up front.
    /// Fixed particles are skipped by the estimation passes and keep these values.
    fn init(&self, cloud: &mut ParticleCloud) -> Result<(), EstimateError>;

    /// Estimates density, pressure and sound speed, and the velocity divergence and
    /// curl for clouds that carry those fields.
    fn estimate_density(&self, cloud: &mut ParticleCloud) -> Result<(), EstimateError>;

    /// Estimates accelerations, and the thermal energy and viscosity switch rates for
    /// clouds that carry those fields. Expects densities from `estimate_density`.
    fn estimate_forces(&self, cloud: &mut ParticleCloud) -> Result<(), EstimateError>;
}

// Shared validation run by every estimation pass before it touches any particle data,
// so that a failing pass leaves the cloud exactly as it was.
fn validate_particles(particles: &Particles, eos: &impl EquationOfState, viscosity: &impl ArtificialViscosity) -> Result<(), EstimateError> {
    check_field_lengths(particles)?;
    check_paired_fields(particles)?;
    if eos.requires_thermal_energy() {
        require_field("thermal_energies", &particles.thermal_energies)?;
    }
    if viscosity.requires_velocity_derivatives() {
        require_field("velocity_divergences", &particles.velocity_divergences)?;
    }
    if viscosity.requires_viscosity_switch() {
        require_field("viscosity_switches", &particles.viscosity_switches)?;
    }
    Ok(())
}

fn check_field_lengths(particles: &Particles) -> Result<(), EstimateError> {
    fn check(field: &'static str, actual: usize, expected: usize) -> Result<(), EstimateError> {
        if actual == expected {
            Ok(())
        } else {
            Err(EstimateError::FieldLengthMismatch { field, expected, actual })
        }
    }
    fn check_optional(field: &'static str, values: &Option<Vec<Real>>, expected: usize) -> Result<(), EstimateError> {
        match values {
            Some(values) => check(field, values.len(), expected),
            None => Ok(()),
        }
    }

    let expected = particles.positions.len();
    check("velocities", particles.velocities.len(), expected)?;
    check("accelerations", particles.accelerations.len(), expected)?;
    check("masses", particles.masses.len(), expected)?;
    check("smoothing_lengths", particles.smoothing_lengths.len(), expected)?;
    check("densities", particles.densities.len(), expected)?;
    check("pressures", particles.pressures.len(), expected)?;
    check("sound_speeds", particles.sound_speeds.len(), expected)?;
    check("fixed", particles.fixed.len(), expected)?;
    check_optional("velocity_divergences", &particles.velocity_divergences, expected)?;
    check_optional("velocity_curls", &particles.velocity_curls, expected)?;
    check_optional("thermal_energies", &particles.thermal_energies, expected)?;
    check_optional("thermal_energy_rates", &particles.thermal_energy_rates, expected)?;
    check_optional("viscosity_switches", &particles.viscosity_switches, expected)?;
    check_optional("viscosity_switch_rates", &particles.viscosity_switch_rates, expected)?;
    check_optional("grad_h_factors", &particles.grad_h_factors, expected)?;
    Ok(())
}

// The optional fields come in value/rate pairs that are filled by different passes;
// a cloud carrying one half of a pair is malformed.
fn check_paired_fields(particles: &Particles) -> Result<(), EstimateError> {
    let pairs = [
        ("velocity_divergences", particles.velocity_divergences.is_some(), "velocity_curls", particles.velocity_curls.is_some()),
        ("thermal_energies", particles.thermal_energies.is_some(), "thermal_energy_rates", particles.thermal_energy_rates.is_some()),
        (
            "viscosity_switches",
            particles.viscosity_switches.is_some(),
            "viscosity_switch_rates",
            particles.viscosity_switch_rates.is_some(),
        ),
    ];
    for (first_field, first_present, second_field, second_present) in pairs {
        if first_present && !second_present {
            return Err(EstimateError::MissingField { field: second_field });
        }
        if second_present && !first_present {
            return Err(EstimateError::MissingField { field: first_field });
        }
    }
    Ok(())
}

fn require_field<'a>(field: &'static str, values: &'a Option<Vec<Real>>) -> Result<&'a [Real], EstimateError> {
    match values {
        Some(values) => Ok(values),
        None => Err(EstimateError::MissingField { field }),
    }
}

fn require_field_mut<'a>(field: &'static str, values: &'a mut Option<Vec<Real>>) -> Result<&'a mut [Real], EstimateError> {
    match values {
        Some(values) => Ok(values),
        None => Err(EstimateError::MissingField { field }),
    }
}

fn check_positive_width(width: Real) -> Result<(), EstimateError> {
    if width > 0.0 {
        Ok(())
    } else {
        Err(EstimateError::NonPositiveWidth { width })
    }
}

fn check_positive_widths(widths: &[Real]) -> Result<(), EstimateError> {
    for &width in widths {
        check_positive_width(width)?;
    }
    Ok(())
}
