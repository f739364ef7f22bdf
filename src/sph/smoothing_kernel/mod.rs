/// Smoothing Kernels.
pub use self::cubic::CubicSpline;
pub use self::gaussian::Gaussian;
pub use self::kernel::Kernel;
pub use self::quartic::QuarticSpline;
pub use self::quintic::QuinticSpline;
pub use self::thomas_couchman::ThomasCouchman;

#[macro_use]
mod kernel;

mod cubic;
mod gaussian;
mod quartic;
mod quintic;
mod thomas_couchman;
