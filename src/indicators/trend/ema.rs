//! EMA (Exponential Moving Average) indicator

use crate::common::math;
use crate::models::indicators::Candle;

/// EMA of closes, seeded with the SMA of the first `span` closes
pub fn calculate_ema(candles: &[Candle], span: usize) -> Vec<Option<f64>> {
    let closes: Vec<Option<f64>> = candles.iter().map(|c| Some(c.close)).collect();
    math::ema_series(&closes, span)
}
