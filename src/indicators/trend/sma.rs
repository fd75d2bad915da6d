//! SMA (Simple Moving Average) indicator

use crate::common::math;
use crate::models::indicators::Candle;

/// Trailing mean of closes over `period` bars.
///
/// The first `period - 1` entries are undefined.
pub fn calculate_sma(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let closes: Vec<Option<f64>> = candles.iter().map(|c| Some(c.close)).collect();
    math::sma_series(&closes, period)
}
