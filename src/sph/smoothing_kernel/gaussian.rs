use std::f64::consts::PI;

use super::kernel::Kernel;
use crate::units::Real;

/// Gaussian smoothing kernel.
///
/// Infinitely smooth. Truncated where the unit profile underflows to zero, so the reported
/// support radius is sqrt(-ln(MIN_POSITIVE)).
#[derive(Copy, Clone)]
pub struct Gaussian;

impl Kernel for Gaussian {
    #[inline]
    fn normalizer(&self, dim: usize) -> Real {
        1.0 / PI.sqrt().powi(dim as i32)
    }

    #[inline]
    fn unit_radius(&self) -> Real {
        (-Real::MIN_POSITIVE.ln()).sqrt()
    }

    #[inline]
    fn unit_value(&self, q: Real) -> Real {
        (-q * q).exp()
    }

    #[inline]
    fn unit_deriv(&self, q: Real) -> Real {
        -2.0 * q * (-q * q).exp()
    }
}

generate_kernel_tests!(Gaussian);
