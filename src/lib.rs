pub mod math;
pub mod parallel;
pub mod sph;
pub mod units;
