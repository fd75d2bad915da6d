//! Builds the full indicator frame for a candle window

use crate::config::IndicatorConfig;
use crate::indicators::error::IndicatorError;
use crate::indicators::momentum::{calculate_macd, calculate_rsi};
use crate::indicators::trend::calculate_sma;
use crate::indicators::volatility::calculate_atr;
use crate::models::indicators::{Candle, IndicatorBar, IndicatorFrame};

/// Compute every configured indicator over `candles`.
///
/// Fails with [`IndicatorError::InsufficientData`] when the series is shorter
/// than [`IndicatorConfig::required_bars`], so the most recent bar of a
/// returned frame always carries every indicator.
pub fn compute(candles: &[Candle], config: &IndicatorConfig) -> Result<IndicatorFrame, IndicatorError> {
    config.validate()?;

    let required = config.required_bars();
    if candles.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            available: candles.len(),
        });
    }

    if let Some(index) = candles
        .windows(2)
        .position(|pair| pair[1].open_time <= pair[0].open_time)
    {
        return Err(IndicatorError::Unordered { index: index + 1 });
    }

    let sma_short = calculate_sma(candles, config.sma_short);
    let sma_long = calculate_sma(candles, config.sma_long);
    let rsi = calculate_rsi(candles, config.rsi_period);
    let macd = calculate_macd(candles, config.macd_fast, config.macd_slow, config.macd_signal);
    let atr = calculate_atr(candles, config.atr_period);

    let bars = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| IndicatorBar {
            open_time: candle.open_time,
            close: candle.close,
            sma_short: sma_short[i],
            sma_long: sma_long[i],
            rsi: rsi[i],
            macd: macd.macd[i],
            macd_signal: macd.signal[i],
            atr: atr[i],
        })
        .collect();

    Ok(IndicatorFrame::new(bars))
}
