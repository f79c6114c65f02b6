//! Type aliases and numerical constants.

use nalgebra::{Dyn, OMatrix, OVector};

/// Raw user or item identifier as it appears in the input files.
pub type RawId = i64;

/// Type alias for a dynamically-sized real matrix.
pub type DMatrix = OMatrix<f64, Dyn, Dyn>;

/// Type alias for a dynamically-sized real vector.
pub type DVector = OVector<f64, Dyn>;

/// Numerical constants shared by the estimators and approximators.
pub mod constants {
    /// Number of points in the blend weight grid (0, 0.05, ..., 1).
    pub const BLEND_GRID_POINTS: usize = 21;

    /// Step size of the central finite-difference derivative.
    pub const FINITE_DIFFERENCE_STEP: f64 = 0.01;

    /// Constant every parameter of the gradient factorization starts from.
    pub const PARAMETER_INITIAL_VALUE: f64 = 0.825;

    /// Seed of the nonnegative factorization initialization.
    pub const NMF_SEED: u64 = 77;

    /// Small positive value guarding the multiplicative update denominators.
    pub const NMF_DENOMINATOR_EPSILON: f64 = 1e-10;
}
