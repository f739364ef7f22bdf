pub use self::artificial_viscosity::*;
pub use self::equation_of_state::*;
pub use self::estimator::*;
pub use self::particles::*;

pub mod smoothing_kernel;

mod artificial_viscosity;
mod equation_of_state;
mod estimator;
mod particles;
