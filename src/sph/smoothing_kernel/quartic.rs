use std::f64::consts::PI;

use super::kernel::Kernel;
use crate::units::Real;

/// Quartic spline smoothing kernel (M5), support radius 2.5h.
#[derive(Copy, Clone)]
pub struct QuarticSpline;

impl Kernel for QuarticSpline {
    #[inline]
    fn normalizer(&self, dim: usize) -> Real {
        match dim {
            1 => 1.0 / 24.0,
            2 => 96.0 / (1199.0 * PI),
            3 => 1.0 / (20.0 * PI),
            _ => unreachable!(),
        }
    }

    #[inline]
    fn unit_radius(&self) -> Real {
        2.5
    }

    #[inline]
    fn unit_value(&self, q: Real) -> Real {
        if q < 0.5 {
            (2.5 - q).powi(4) - 5.0 * (1.5 - q).powi(4) + 10.0 * (0.5 - q).powi(4)
        } else if q < 1.5 {
            (2.5 - q).powi(4) - 5.0 * (1.5 - q).powi(4)
        } else if q < 2.5 {
            (2.5 - q).powi(4)
        } else {
            0.0
        }
    }

    #[inline]
    fn unit_deriv(&self, q: Real) -> Real {
        if q < 0.5 {
            -4.0 * (2.5 - q).powi(3) + 20.0 * (1.5 - q).powi(3) - 40.0 * (0.5 - q).powi(3)
        } else if q < 1.5 {
            -4.0 * (2.5 - q).powi(3) + 20.0 * (1.5 - q).powi(3)
        } else if q < 2.5 {
            -4.0 * (2.5 - q).powi(3)
        } else {
            0.0
        }
    }
}

generate_kernel_tests!(QuarticSpline);
