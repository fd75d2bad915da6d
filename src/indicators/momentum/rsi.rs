//! RSI (Relative Strength Index) indicator

use crate::common::math;
use crate::models::indicators::Candle;

/// Calculate RSI for every bar
///
/// RSI = 100 - (100 / (1 + RS))
/// RS = Average Gain / Average Loss over the trailing `period` close deltas
///
/// The first `period` entries are undefined (bar 0 has no delta). When the
/// average loss is zero the value saturates at 100.
pub fn calculate_rsi(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(candles.len());
    let mut losses = Vec::with_capacity(candles.len());
    gains.push(None);
    losses.push(None);

    for pair in candles.windows(2) {
        let change = pair[1].close - pair[0].close;
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }
    gains.truncate(candles.len());
    losses.truncate(candles.len());

    let avg_gains = math::sma_series(&gains, period);
    let avg_losses = math::sma_series(&losses, period);

    avg_gains
        .into_iter()
        .zip(avg_losses)
        .map(|(gain, loss)| Some(rsi_value(gain?, loss?)))
        .collect()
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
}
