//! Tests for regret matching: current strategy, average strategy and
//! sampling from a distribution.

use approx::assert_abs_diff_eq;

use gin_cfr::regret::{normalized_positive, sample, uniform};
use gin_cfr::store::InfoSetNode;

fn node_with_regret(regret: &[f64]) -> InfoSetNode {
    let mut node = InfoSetNode::new(regret.len());
    node.add_regret(regret);
    node
}

fn assert_distribution(strategy: &[f64]) {
    assert!(strategy.iter().all(|p| *p >= 0.0), "negative entry in {:?}", strategy);
    assert_abs_diff_eq!(strategy.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
}

// ---------------------------------------------------------------------------
// Current strategy
// ---------------------------------------------------------------------------

#[test]
fn positive_regret_takes_all_mass() {
    assert_eq!(normalized_positive(&[3.0, -1.0, 0.0]), vec![1.0, 0.0, 0.0]);
    assert_eq!(node_with_regret(&[3.0, -1.0, 0.0]).current_strategy(), vec![1.0, 0.0, 0.0]);
}

#[test]
fn zero_regret_is_uniform() {
    let strategy = node_with_regret(&[0.0, 0.0, 0.0]).current_strategy();
    for p in &strategy {
        assert_abs_diff_eq!(*p, 1.0 / 3.0, epsilon = 1e-15);
    }
}

#[test]
fn all_negative_regret_is_uniform() {
    assert_eq!(normalized_positive(&[-2.0, -0.5]), vec![0.5, 0.5]);
}

#[test]
fn regret_is_floored_at_zero() {
    let mut node = InfoSetNode::new(2);
    node.add_regret(&[-5.0, 1.0]);
    node.add_regret(&[2.0, 0.0]);
    // -5 was floored to 0 before the +2 arrived
    assert_eq!(node.regret_sum(), &[2.0, 1.0]);
    let strategy = node.current_strategy();
    assert_abs_diff_eq!(strategy[0], 2.0 / 3.0, epsilon = 1e-12);
    assert_distribution(&strategy);
}

#[test]
fn proportional_to_positive_regret() {
    let strategy = normalized_positive(&[1.0, 3.0, -7.0, 0.0]);
    assert_eq!(strategy, vec![0.25, 0.75, 0.0, 0.0]);
}

// ---------------------------------------------------------------------------
// Average strategy
// ---------------------------------------------------------------------------

#[test]
fn average_weights_by_reach() {
    let mut node = InfoSetNode::new(2);
    node.accumulate(&[1.0, 0.0], 0.25);
    node.accumulate(&[0.0, 1.0], 0.75);
    assert_eq!(node.strategy_sum(), &[0.25, 0.75]);
    assert_eq!(node.average_strategy(), vec![0.25, 0.75]);
}

#[test]
fn unvisited_average_is_uniform() {
    assert_eq!(InfoSetNode::new(4).average_strategy(), uniform(4));
}

#[test]
fn negative_drift_is_clamped_on_read() {
    let mut node = InfoSetNode::new(3);
    node.add_strategy_weight(&[2.0, -1e-12, 2.0]);
    assert_eq!(node.average_strategy(), vec![0.5, 0.0, 0.5]);
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

#[test]
fn sample_walks_cumulative_distribution() {
    let dist = [0.2, 0.5, 0.3];
    assert_eq!(sample(&dist, 0.0), 0);
    assert_eq!(sample(&dist, 0.19), 0);
    assert_eq!(sample(&dist, 0.21), 1);
    assert_eq!(sample(&dist, 0.69), 1);
    assert_eq!(sample(&dist, 0.71), 2);
}

#[test]
fn last_action_absorbs_residue() {
    // sums to slightly less than 1
    let dist = [0.1, 0.2, 0.3, 0.39999999];
    assert_eq!(sample(&dist, 0.9999999999), 3);
}

#[test]
fn zero_probability_actions_never_sampled() {
    let dist = [0.0, 1.0, 0.0];
    for i in 0..100 {
        assert_eq!(sample(&dist, i as f64 / 100.0), 1);
    }
}
