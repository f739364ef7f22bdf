use super::cubic::CubicSpline;
use super::kernel::Kernel;
use crate::units::Real;

/// Cubic spline kernel with the modified derivative from "P. Thomas, H. Couchman, Simulating
/// the formation of a cluster of galaxies, MNRAS 257 (1992), pp. 11-31".
///
/// Value and normalization are the plain cubic spline's; the derivative is clamped to -1 near
/// q = 0, so the gradient between close particle pairs no longer fades out.
#[derive(Copy, Clone)]
pub struct ThomasCouchman;

impl Kernel for ThomasCouchman {
    #[inline]
    fn normalizer(&self, dim: usize) -> Real {
        CubicSpline.normalizer(dim)
    }

    #[inline]
    fn unit_radius(&self) -> Real {
        CubicSpline.unit_radius()
    }

    #[inline]
    fn unit_value(&self, q: Real) -> Real {
        CubicSpline.unit_value(q)
    }

    #[inline]
    fn unit_deriv(&self, q: Real) -> Real {
        if q < 2.0 / 3.0 {
            -1.0
        } else if q < 1.0 {
            (2.25 * q - 3.0) * q
        } else if q < 2.0 {
            -0.75 * (2.0 - q).powi(2)
        } else {
            0.0
        }
    }
}

// The modified derivative is deliberately inconsistent with the kernel value, so the width
// derivative cannot be checked against finite differences of evaluate().
generate_kernel_tests!(ThomasCouchman, false);
