//! Unit tests for ATR indicator

use crate::test_utils::{candles_from_closes, linear_closes};
use approx::assert_relative_eq;
use goldfinch::indicators::volatility::{calculate_atr, true_range_series};

#[test]
fn test_atr_warmup() {
    let candles = candles_from_closes(&linear_closes(20, 100.0, 0.0));
    let atr = calculate_atr(&candles, 14);
    assert!(atr[..14].iter().all(Option::is_none));
    assert!(atr[14].is_some());
}

#[test]
fn test_atr_constant_range() {
    // Every bar spans close ± 1 with no gaps
    let candles = candles_from_closes(&[100.0; 20]);
    let atr = calculate_atr(&candles, 5);
    assert_relative_eq!(atr[19].unwrap(), 2.0);
}

#[test]
fn test_atr_includes_gaps() {
    let candles = candles_from_closes(&[100.0, 105.0, 110.0]);
    let tr = true_range_series(&candles);
    assert_eq!(tr[0], None);
    // high 106, low 104, previous close 100
    assert_relative_eq!(tr[1].unwrap(), 6.0);

    let atr = calculate_atr(&candles, 2);
    assert_relative_eq!(atr[2].unwrap(), 6.0);
}

#[test]
fn test_atr_non_negative() {
    let candles = candles_from_closes(&linear_closes(40, 300.0, -3.0));
    assert!(calculate_atr(&candles, 14).into_iter().flatten().all(|v| v >= 0.0));
}
