use crate::units::Real;

/// Threshold under which floating point values are treated as zero.
/// Cube root of the machine epsilon, the usual tolerance for iterative root finders.
pub fn small_number() -> Real {
    Real::EPSILON.cbrt()
}

pub fn is_small(value: Real) -> bool {
    value.abs() <= small_number()
}

/// Why a Newton-Raphson iteration gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewtonRaphsonError {
    /// No root within tolerance after the configured number of steps.
    MaxIterExceeded,
    /// The derivative vanished, the next step is undefined.
    ZeroDerivative,
}

impl std::fmt::Display for NewtonRaphsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NewtonRaphsonError::MaxIterExceeded => write!(f, "newton-raphson exceeded its iteration limit"),
            NewtonRaphsonError::ZeroDerivative => write!(f, "newton-raphson hit a vanishing derivative"),
        }
    }
}

impl std::error::Error for NewtonRaphsonError {}

/// Why a bisection iteration gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BisectionError {
    /// No root within tolerance after the configured number of steps.
    MaxIterExceeded,
    /// Residuals at both bracket ends share a sign, the bracket encloses no root.
    NoSignChange,
}

impl std::fmt::Display for BisectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BisectionError::MaxIterExceeded => write!(f, "bisection exceeded its iteration limit"),
            BisectionError::NoSignChange => write!(f, "bisection bracket does not enclose a sign change"),
        }
    }
}

impl std::error::Error for BisectionError {}

/// Finds a root of `f` starting from the estimate in `x`.
///
/// `f` returns the residual and its derivative at the passed estimate.
/// On success `x` holds a root whose residual is within `eps`,
/// on failure it holds the last iterate.
pub fn newton_raphson(
    x: &mut Real,
    mut f: impl FnMut(Real) -> (Real, Real),
    eps: Real,
    max_iter: usize,
) -> Result<(), NewtonRaphsonError> {
    for _ in 0..max_iter {
        let (residual, derivative) = f(*x);
        if residual.abs() <= eps {
            return Ok(());
        }
        if derivative.abs() <= eps {
            return Err(NewtonRaphsonError::ZeroDerivative);
        }
        *x -= residual / derivative;
    }
    Err(NewtonRaphsonError::MaxIterExceeded)
}

/// Finds a root of `f` inside the bracket `[min_x, max_x]` with the false-position method.
///
/// On success the bracket collapses onto a root whose residual is within `eps`.
/// The bracket must enclose a sign change unless one of its ends already is a root.
pub fn bisection(
    min_x: &mut Real,
    max_x: &mut Real,
    mut f: impl FnMut(Real) -> Real,
    eps: Real,
    max_iter: usize,
) -> Result<(), BisectionError> {
    debug_assert!(*min_x <= *max_x, "invalid bracket");

    let mut min_f = f(*min_x);
    if min_f.abs() <= eps {
        *max_x = *min_x;
        return Ok(());
    }
    let mut max_f = f(*max_x);
    if max_f.abs() <= eps {
        *min_x = *max_x;
        return Ok(());
    }

    for _ in 0..max_iter {
        if min_f.signum() == max_f.signum() {
            return Err(BisectionError::NoSignChange);
        }
        // Secant through the bracket ends.
        let x = *min_x - min_f * (*max_x - *min_x) / (max_f - min_f);
        let y = f(x);
        if y.abs() <= eps {
            *min_x = x;
            *max_x = x;
            return Ok(());
        }
        if y.signum() == min_f.signum() {
            *min_x = x;
            min_f = y;
        } else {
            *max_x = x;
            max_f = y;
        }
    }
    Err(BisectionError::MaxIterExceeded)
}
