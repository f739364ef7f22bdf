use std::f64::consts::PI;

use super::kernel::Kernel;
use crate::units::Real;

/// Cubic spline smoothing kernel (M4).
///
/// Classic cubic spline kernel from "J. Monaghan, Smoothed Particle Hydrodynamics, Annual
/// Review of Astronomy and Astrophysics, 30 (1992), pp. 543-574", support radius 2h.
#[derive(Copy, Clone)]
pub struct CubicSpline;

impl Kernel for CubicSpline {
    #[inline]
    fn normalizer(&self, dim: usize) -> Real {
        match dim {
            1 => 2.0 / 3.0,
            2 => 10.0 / (7.0 * PI),
            3 => 1.0 / PI,
            _ => unreachable!(),
        }
    }

    #[inline]
    fn unit_radius(&self) -> Real {
        2.0
    }

    #[inline]
    fn unit_value(&self, q: Real) -> Real {
        if q < 1.0 {
            0.25 * (2.0 - q).powi(3) - (1.0 - q).powi(3)
        } else if q < 2.0 {
            0.25 * (2.0 - q).powi(3)
        } else {
            0.0
        }
    }

    #[inline]
    fn unit_deriv(&self, q: Real) -> Real {
        if q < 1.0 {
            -0.75 * (2.0 - q).powi(2) + 3.0 * (1.0 - q).powi(2)
        } else if q < 2.0 {
            -0.75 * (2.0 - q).powi(2)
        } else {
            0.0
        }
    }
}

generate_kernel_tests!(CubicSpline);
