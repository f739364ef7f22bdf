pub type Real = f64;
pub type Point = cgmath::Point2<Real>;
pub type Vector = cgmath::Vector2<Real>;

// Spatial dimension. Kernel normalization tables carry 1D-3D constants, everything else is 2D.
pub const DIM: usize = 2;
