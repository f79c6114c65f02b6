//! Cost function interface for the gradient factorization.
//!
//! The optimizer only needs loss values: derivatives are estimated by
//! central finite differences, which avoids deriving the analytic gradient of
//! the factorization loss.
//!
//! # Batch derivative
//!
//! For a batch of parameter indices `B` with indicator vector `e_B`, the
//! estimated derivative is the single scalar
//!
//! ```text
//! ( f(x + h·e_B) - f(x - h·e_B) ) / (2h)
//! ```
//!
//! which costs two loss evaluations per batch regardless of batch size. The
//! same scalar is applied to every parameter of the batch.

use std::fmt::Debug;

use ratingfill_core::{
    error::OptimizerResult,
    matrix::ObservedCell,
    types::DVector,
};

use crate::parameters::FactorShape;

/// Objective minimized by the optimizer.
pub trait CostFunction: Debug {
    /// Number of parameters the cost expects.
    fn dimension(&self) -> usize;

    /// Evaluates the cost at `params`.
    fn cost(&self, params: &DVector) -> OptimizerResult<f64>;

    /// Central finite-difference derivative along the batch direction `e_B`.
    ///
    /// # Default Implementation
    ///
    /// Perturbs every index of `batch` by `±step` at once and evaluates the
    /// cost twice.
    fn batch_derivative_fd(
        &self,
        params: &DVector,
        batch: &[usize],
        step: f64,
    ) -> OptimizerResult<f64> {
        let mut plus = params.clone();
        let mut minus = params.clone();
        for &k in batch {
            plus[k] += step;
            minus[k] -= step;
        }
        let f_plus = self.cost(&plus)?;
        let f_minus = self.cost(&minus)?;
        Ok((f_plus - f_minus) / (step + step))
    }
}

/// Squared-error loss of a factorization restricted to observed cells.
///
/// ```text
/// f(x) = Σ_{(i,j) observed} ( (W·H)[i,j] - Z[i,j] )²
/// ```
///
/// Binds the factor layout and the known cells explicitly; nothing is read
/// from outside the context.
#[derive(Debug, Clone, Copy)]
pub struct LossContext<'a> {
    shape: FactorShape,
    cells: &'a [ObservedCell],
}

impl<'a> LossContext<'a> {
    /// Creates the loss over `cells` for the given layout.
    pub fn new(shape: FactorShape, cells: &'a [ObservedCell]) -> Self {
        Self { shape, cells }
    }

    /// Factor layout.
    pub fn shape(&self) -> FactorShape {
        self.shape
    }

    /// Observed cells the loss is evaluated on.
    pub fn cells(&self) -> &'a [ObservedCell] {
        self.cells
    }
}

impl CostFunction for LossContext<'_> {
    fn dimension(&self) -> usize {
        self.shape.len()
    }

    fn cost(&self, params: &DVector) -> OptimizerResult<f64> {
        self.shape.check(params)?;
        Ok(self
            .cells
            .iter()
            .map(|c| {
                let diff = self.shape.predict(params, c.row, c.col) - c.value;
                diff * diff
            })
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ratingfill_core::error::OptimizerError;

    #[derive(Debug)]
    struct Quadratic;

    impl CostFunction for Quadratic {
        fn dimension(&self) -> usize {
            3
        }

        fn cost(&self, params: &DVector) -> OptimizerResult<f64> {
            Ok(params.norm_squared())
        }
    }

    #[test]
    fn test_batch_derivative_quadratic() {
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        // d/dt |x + t e_B|² at t = 0 is 2 Σ_{k∈B} x_k, exact for central differences.
        let d = Quadratic.batch_derivative_fd(&x, &[0, 2], 0.01).unwrap();
        assert_relative_eq!(d, 8.0, epsilon = 1e-9);

        let single = Quadratic.batch_derivative_fd(&x, &[1], 0.01).unwrap();
        assert_relative_eq!(single, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loss_on_exact_factorization() {
        let shape = FactorShape::new(2, 2, 1).unwrap();
        // W = [1, 2]ᵀ, H = [3, 4]: W·H = [[3, 4], [6, 8]]
        let params = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let cells = vec![ObservedCell::new(0, 1, 4.0), ObservedCell::new(1, 0, 6.0)];
        let loss = LossContext::new(shape, &cells);

        assert_eq!(loss.dimension(), 4);
        assert_relative_eq!(loss.cost(&params).unwrap(), 0.0);

        let cells_off = vec![ObservedCell::new(1, 1, 5.0)];
        let loss_off = LossContext::new(shape, &cells_off);
        assert_relative_eq!(loss_off.cost(&params).unwrap(), 9.0);
    }

    #[test]
    fn test_loss_dimension_mismatch() {
        let shape = FactorShape::new(2, 2, 1).unwrap();
        let cells = vec![ObservedCell::new(0, 0, 1.0)];
        let loss = LossContext::new(shape, &cells);
        assert!(matches!(
            loss.cost(&DVector::zeros(5)),
            Err(OptimizerError::DimensionMismatch { .. })
        ));
    }
}
