//! Unit tests for position sizing and protective levels

use approx::assert_relative_eq;
use goldfinch::config::RiskConfig;
use goldfinch::models::market::SymbolConstraints;
use goldfinch::models::signal::Direction;
use goldfinch::risk::{protective_levels, quantize, size, RiskError};
use proptest::prelude::*;

fn constraints(min_volume: f64, max_volume: f64, volume_step: f64) -> SymbolConstraints {
    SymbolConstraints {
        min_volume,
        max_volume,
        volume_step,
        point_size: 0.01,
    }
}

fn risk(risk_fraction: f64) -> RiskConfig {
    RiskConfig {
        risk_fraction,
        ..RiskConfig::default()
    }
}

#[test]
fn test_small_account_clamps_to_minimum() {
    // raw = 10000 * 0.001 / 2000 = 0.005
    let volume = size(10_000.0, 2000.0, &constraints(0.01, 10.0, 0.01), &risk(0.001)).unwrap();
    assert_relative_eq!(volume, 0.01);
}

#[test]
fn test_large_account_clamps_to_maximum() {
    let volume = size(1e9, 2000.0, &constraints(0.01, 10.0, 0.01), &risk(0.001)).unwrap();
    assert_relative_eq!(volume, 10.0);
}

#[test]
fn test_volume_snaps_to_step() {
    // raw = 100000 * 0.001 / 2000 = 0.05
    let volume = size(100_000.0, 2000.0, &constraints(0.01, 10.0, 0.01), &risk(0.001)).unwrap();
    assert_eq!(volume, 0.05);

    // raw = 0.0537 rounds down to 0.05
    let volume = size(107_400.0, 2000.0, &constraints(0.01, 10.0, 0.01), &risk(0.001)).unwrap();
    assert_eq!(volume, 0.05);
}

#[test]
fn test_rounding_ties_go_to_even_step() {
    assert_eq!(quantize(1.25, 0.5), 1.0);
    assert_eq!(quantize(1.75, 0.5), 2.0);
    assert_eq!(quantize(0.3, 0.1), 0.3);

    // raw = 5 * 0.5 / 2 = 1.25, halfway between 1.0 and 1.5
    let volume = size(5.0, 2.0, &constraints(0.5, 10.0, 0.5), &risk(0.5)).unwrap();
    assert_eq!(volume, 1.0);
}

#[test]
fn test_zero_minimum_never_yields_zero() {
    let volume = size(1.0, 2000.0, &constraints(0.0, 10.0, 0.01), &risk(0.001)).unwrap();
    assert_eq!(volume, 0.01);
}

#[test]
fn test_inverted_range_is_invalid() {
    let result = size(10_000.0, 2000.0, &constraints(5.0, 1.0, 0.01), &risk(0.001));
    assert!(matches!(result, Err(RiskError::InvalidConstraints(_))));
}

#[test]
fn test_non_positive_step_is_invalid() {
    for step in [0.0, -0.01] {
        let result = size(10_000.0, 2000.0, &constraints(0.01, 10.0, step), &risk(0.001));
        assert!(matches!(result, Err(RiskError::InvalidConstraints(_))));
    }
}

#[test]
fn test_range_without_step_multiple_is_invalid() {
    let result = size(10_000.0, 2000.0, &constraints(0.011, 0.019, 0.01), &risk(0.001));
    assert!(matches!(result, Err(RiskError::InvalidConstraints(_))));
}

#[test]
fn test_bad_inputs_are_rejected() {
    let c = constraints(0.01, 10.0, 0.01);
    assert!(matches!(size(10_000.0, 0.0, &c, &risk(0.001)), Err(RiskError::InvalidInput(_))));
    assert!(matches!(size(-1.0, 2000.0, &c, &risk(0.001)), Err(RiskError::InvalidInput(_))));
    assert!(matches!(size(10_000.0, f64::NAN, &c, &risk(0.001)), Err(RiskError::InvalidInput(_))));
}

#[test]
fn test_protective_levels_by_direction() {
    let config = RiskConfig::default();

    let long = protective_levels(Direction::Long, 2000.0, 10.0, &config);
    assert_relative_eq!(long.stop_loss, 1985.0);
    assert_relative_eq!(long.take_profit, 2030.0);

    let short = protective_levels(Direction::Short, 2000.0, 10.0, &config);
    assert_relative_eq!(short.stop_loss, 2015.0);
    assert_relative_eq!(short.take_profit, 1970.0);
}

proptest! {
    #[test]
    fn sizing_is_idempotent_and_in_range(
        equity in 0.0f64..1e7,
        price in 0.5f64..50_000.0,
        fraction in 0.0001f64..0.1,
    ) {
        let c = constraints(0.01, 50.0, 0.01);
        let first = size(equity, price, &c, &risk(fraction)).unwrap();
        let second = size(equity, price, &c, &risk(fraction)).unwrap();

        prop_assert_eq!(first.to_bits(), second.to_bits());
        prop_assert!(first >= 0.01 && first <= 50.0);
        let steps = first / 0.01;
        prop_assert!((steps - steps.round()).abs() < 1e-6);
    }
}
