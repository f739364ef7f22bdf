pub mod estimate_density;
pub mod estimate_forces;
pub mod smoothing_kernel;
