//! Unit tests for the indicator engine

use crate::test_utils::{base_time, candles_from_closes, linear_closes, v_shape_closes};
use goldfinch::config::IndicatorConfig;
use goldfinch::indicators::{compute, IndicatorError};
use proptest::prelude::*;

#[test]
fn test_compute_rejects_short_history() {
    let candles = candles_from_closes(&linear_closes(49, 100.0, 1.0));
    let result = compute(&candles, &IndicatorConfig::default());
    assert_eq!(
        result,
        Err(IndicatorError::InsufficientData {
            required: 50,
            available: 49
        })
    );
}

#[test]
fn test_compute_minimum_history_defines_last_bar() {
    let candles = candles_from_closes(&v_shape_closes(25, 50));
    let frame = compute(&candles, &IndicatorConfig::default()).unwrap();

    assert_eq!(frame.len(), candles.len());
    assert_eq!(frame.last_defined_index(), Some(49));
    assert!(!frame.bars()[48].is_defined());

    let last = frame.bars()[49];
    assert_eq!(last.open_time, candles[49].open_time);
    assert_eq!(last.close, candles[49].close);
    let rsi = last.rsi.unwrap();
    assert!((0.0..=100.0).contains(&rsi));
    assert!(last.atr.unwrap() >= 0.0);
}

#[test]
fn test_compute_rejects_unordered_candles() {
    let mut candles = candles_from_closes(&linear_closes(60, 100.0, 1.0));
    candles[30].open_time = base_time();
    assert_eq!(
        compute(&candles, &IndicatorConfig::default()),
        Err(IndicatorError::Unordered { index: 30 })
    );
}

#[test]
fn test_compute_rejects_invalid_config() {
    let config = IndicatorConfig {
        sma_short: 50,
        sma_long: 20,
        ..IndicatorConfig::default()
    };
    let candles = candles_from_closes(&linear_closes(60, 100.0, 1.0));
    assert!(matches!(
        compute(&candles, &config),
        Err(IndicatorError::InvalidConfig(_))
    ));
}

proptest! {
    #[test]
    fn short_series_always_insufficient(len in 0usize..50) {
        let candles = candles_from_closes(&linear_closes(len, 100.0, 0.25));
        let is_insufficient = matches!(
            compute(&candles, &IndicatorConfig::default()),
            Err(IndicatorError::InsufficientData { .. })
        );
        prop_assert!(is_insufficient);
    }
}
