use std::f64::consts::PI;

use super::kernel::Kernel;
use crate::units::Real;

/// Quintic spline smoothing kernel (M6), support radius 3h.
#[derive(Copy, Clone)]
pub struct QuinticSpline;

impl Kernel for QuinticSpline {
    #[inline]
    fn normalizer(&self, dim: usize) -> Real {
        match dim {
            1 => 1.0 / 120.0,
            2 => 7.0 / (478.0 * PI),
            3 => 1.0 / (120.0 * PI),
            _ => unreachable!(),
        }
    }

    #[inline]
    fn unit_radius(&self) -> Real {
        3.0
    }

    #[inline]
    fn unit_value(&self, q: Real) -> Real {
        if q < 1.0 {
            (3.0 - q).powi(5) - 6.0 * (2.0 - q).powi(5) + 15.0 * (1.0 - q).powi(5)
        } else if q < 2.0 {
            (3.0 - q).powi(5) - 6.0 * (2.0 - q).powi(5)
        } else if q < 3.0 {
            (3.0 - q).powi(5)
        } else {
            0.0
        }
    }

    #[inline]
    fn unit_deriv(&self, q: Real) -> Real {
        if q < 1.0 {
            -5.0 * (3.0 - q).powi(4) + 30.0 * (2.0 - q).powi(4) - 75.0 * (1.0 - q).powi(4)
        } else if q < 2.0 {
            -5.0 * (3.0 - q).powi(4) + 30.0 * (2.0 - q).powi(4)
        } else if q < 3.0 {
            -5.0 * (3.0 - q).powi(4)
        } else {
            0.0
        }
    }
}

generate_kernel_tests!(QuinticSpline);
