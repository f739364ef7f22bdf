use crate::units::{Real, Vector, DIM};

/// SPH smoothing kernel.
///
/// Only radially symmetric kernels are supported. A kernel is defined by its dimensionless
/// unit-width profile triad (normalization weight, support radius, value and derivative over
/// q = r / h); every width-dependent form derives from it:
/// W(r, h) = h^-D * normalizer(D) * unit_value(r / h)
pub trait Kernel: Copy {
    const DIVISION_EPSILON: Real = 1.0e-10;

    /// Normalization weight for the given spatial dimension (1 to 3).
    fn normalizer(&self, dim: usize) -> Real;

    /// Support radius of the unit-width kernel. The profile vanishes for q >= unit_radius.
    fn unit_radius(&self) -> Real;

    /// Dimensionless profile at q = r / h. Continuous across piece boundaries.
    fn unit_value(&self, q: Real) -> Real;

    /// Derivative of the dimensionless profile. Continuous across piece boundaries.
    fn unit_deriv(&self, q: Real) -> Real;

    /// Support radius at width `h`, the search radius for neighbor sums.
    #[inline]
    fn radius(&self, h: Real) -> Real {
        self.unit_radius() * h
    }

    /// Evaluates the kernel for a distance `r` at width `h`.
    #[inline]
    fn evaluate(&self, r: Real, h: Real) -> Real {
        let h_inv = 1.0 / h;
        h_inv.powi(DIM as i32) * self.normalizer(DIM) * self.unit_value(r * h_inv)
    }

    /// Evaluates the kernel gradient with respect to the first particle of a pair.
    /// `r_ab`: Displacement from particle b to particle a, so ra - rb. Not normalized!
    /// `r`:    Length of r_ab.
    /// At vanishing distance the direction is undefined and the gradient is zero.
    #[inline]
    fn gradient(&self, r_ab: Vector, r: Real, h: Real) -> Vector {
        let h_inv = 1.0 / h;
        let q = r * h_inv;
        if q < Self::DIVISION_EPSILON {
            return cgmath::Zero::zero();
        }
        h_inv.powi(DIM as i32 + 2) * self.normalizer(DIM) * (self.unit_deriv(q) / q) * r_ab
    }

    /// Evaluates the derivative of the kernel with respect to its width, dW/dh.
    #[inline]
    fn radius_deriv(&self, r: Real, h: Real) -> Real {
        let h_inv = 1.0 / h;
        let q = r * h_inv;
        h_inv.powi(DIM as i32 + 1) * self.normalizer(DIM) * (-(DIM as Real) * self.unit_value(q) - q * self.unit_deriv(q))
    }
}

// Expands to the shared property test suite for a kernel type, invoked at the bottom of every
// kernel implementation file. Kernels with a modified profile derivative pass `false` to skip
// the cross-check of the width derivative against finite differences of the value.
macro_rules! generate_kernel_tests {
    ($kernel_type:ident) => {
        generate_kernel_tests!($kernel_type, true);
    };
    ($kernel_type:ident, $consistent_derivative:expr) => {
    };
}
