//! MACD (Moving Average Convergence Divergence) indicator

use crate::common::math;
use crate::indicators::trend::calculate_ema;
use crate::models::indicators::Candle;

/// MACD line and its signal line, one entry per candle
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

/// Calculate MACD indicator
///
/// MACD = EMA(fast) - EMA(slow)
/// Signal = EMA(signal_span) of MACD
///
/// The MACD line is defined from bar `slow - 1`; the signal line from bar
/// `slow + signal_span - 2`.
pub fn calculate_macd(
    candles: &[Candle],
    fast_span: usize,
    slow_span: usize,
    signal_span: usize,
) -> MacdSeries {
    let fast = calculate_ema(candles, fast_span);
    let slow = calculate_ema(candles, slow_span);

    let macd: Vec<Option<f64>> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = math::ema_series(&macd, signal_span);

    MacdSeries { macd, signal }
}

