//! Unit tests for EMA indicator

use crate::test_utils::{candles_from_closes, linear_closes};
use approx::assert_relative_eq;
use goldfinch::indicators::trend::calculate_ema;

#[test]
fn test_ema_insufficient_data() {
    let candles = candles_from_closes(&linear_closes(10, 100.0, 0.1));
    assert!(calculate_ema(&candles, 20).iter().all(Option::is_none));
}

#[test]
fn test_ema_sufficient_data() {
    let candles = candles_from_closes(&linear_closes(50, 100.0, 0.1));
    let ema = calculate_ema(&candles, 12);
    assert_eq!(ema.len(), 50);
    assert!(ema[10].is_none());
    let last = ema[49].unwrap();
    assert!(last.is_finite());
    // Lags a rising series
    assert!(last < candles[49].close);
}

#[test]
fn test_ema_of_constant_series() {
    let candles = candles_from_closes(&[5.0; 30]);
    let ema = calculate_ema(&candles, 10);
    assert_relative_eq!(ema[29].unwrap(), 5.0);
}

#[test]
fn test_faster_ema_leads_a_trend() {
    let rising = candles_from_closes(&linear_closes(50, 100.0, 0.1));
    assert!(calculate_ema(&rising, 12)[49].unwrap() > calculate_ema(&rising, 26)[49].unwrap());

    let falling = candles_from_closes(&linear_closes(50, 100.0, -0.1));
    assert!(calculate_ema(&falling, 12)[49].unwrap() < calculate_ema(&falling, 26)[49].unwrap());
}
