//! ATR (Average True Range) indicator

use crate::common::math;
use crate::models::indicators::Candle;

/// True range per bar; undefined for the first bar, which has no prior close
pub fn true_range_series(candles: &[Candle]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(candles.len());
    if candles.is_empty() {
        return out;
    }
    out.push(None);
    for pair in candles.windows(2) {
        out.push(Some(math::true_range(pair[1].high, pair[1].low, pair[0].close)));
    }
    out
}

/// Calculate ATR (Average True Range)
///
/// Trailing simple mean of the true range over `period` bars. The first
/// `period` entries are undefined.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    math::sma_series(&true_range_series(candles), period)
}
