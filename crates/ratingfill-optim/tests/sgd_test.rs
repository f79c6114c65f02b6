//! Integration tests for the gradient factorization optimizer

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use ratingfill_core::{matrix::ObservedCell, types::DVector};
use ratingfill_optim::{CostFunction, FactorShape, LossContext, SGDConfig, TerminationReason, SGD};

fn small_problem() -> (FactorShape, Vec<ObservedCell>) {
    let shape = FactorShape::new(3, 2, 1).unwrap();
    let cells = vec![
        ObservedCell::new(0, 0, 5.0),
        ObservedCell::new(1, 1, 3.0),
        ObservedCell::new(2, 0, 4.0),
    ];
    (shape, cells)
}

#[test]
fn test_zero_learning_rate_keeps_seed_vector() {
    let (shape, cells) = small_problem();
    let loss = LossContext::new(shape, &cells);
    let x0 = shape.constant(0.825);

    let sgd = SGD::new(
        SGDConfig::new()
            .with_learning_rate(0.0)
            .with_batch_size(shape.len())
            .with_epochs(1),
    );
    let result = sgd.optimize(&loss, &x0).unwrap();

    assert_eq!(result.updates, 1);
    assert_eq!(result.termination, TerminationReason::MaxEpochs);
    let bits = |v: &DVector| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&result.parameters), bits(&x0));
}

#[test]
fn test_sgd_reduces_training_loss() {
    let (shape, cells) = small_problem();
    let loss = LossContext::new(shape, &cells);
    let x0 = shape.constant(0.825);

    let sgd = SGD::new(
        SGDConfig::new()
            .with_learning_rate(0.02)
            .with_batch_size(1)
            .with_epochs(200),
    );
    let result = sgd.optimize(&loss, &x0).unwrap();

    assert!(!result.diverged());
    assert!(result.value < 0.1 * result.initial_value);
    assert_eq!(result.loss_history.len(), 200);
    assert_eq!(result.function_evaluations, 1 + 200 * (5 * 2 + 1));
}

#[test]
fn test_same_seed_same_result() {
    let (shape, cells) = small_problem();
    let loss = LossContext::new(shape, &cells);
    let x0 = shape.constant(0.825);
    let config = SGDConfig::new().with_batch_size(2).with_epochs(10).with_seed(7);

    let a = SGD::new(config.clone()).optimize(&loss, &x0).unwrap();
    let b = SGD::new(config).optimize(&loss, &x0).unwrap();
    assert_eq!(a.parameters, b.parameters);
}

#[test]
fn test_oversized_batch_makes_no_update() {
    let (shape, cells) = small_problem();
    let loss = LossContext::new(shape, &cells);
    let x0 = shape.constant(0.825);

    let sgd = SGD::new(SGDConfig::new().with_batch_size(shape.len() + 1).with_epochs(3));
    let result = sgd.optimize(&loss, &x0).unwrap();
    assert_eq!(result.updates, 0);
    assert_eq!(result.parameters, x0);
}

proptest! {
    #[test]
    fn prop_split_flatten_round_trip(
        n_rows in 1_usize..6,
        n_cols in 1_usize..6,
        rank in 1_usize..4,
        seed in any::<u32>(),
    ) {
        let shape = FactorShape::new(n_rows, n_cols, rank).unwrap();
        let params = DVector::from_fn(shape.len(), |i, _| {
            f64::from(seed.wrapping_mul(2_654_435_761).wrapping_add(i as u32) % 1000) / 100.0
        });

        let (w, h) = shape.split(&params).unwrap();
        let back = shape.flatten(&w, &h).unwrap();
        prop_assert_eq!(back, params);
    }

    #[test]
    fn prop_loss_is_non_negative(value in -3.0_f64..3.0) {
        let (shape, cells) = small_problem();
        let loss = LossContext::new(shape, &cells);
        prop_assert!(loss.cost(&shape.constant(value)).unwrap() >= 0.0);
    }
}
