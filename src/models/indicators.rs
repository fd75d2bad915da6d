use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar. Series are ordered by strictly increasing `open_time`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        open_time: DateTime<Utc>,
    ) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Indicator values for a single bar.
///
/// `None` marks a value whose trailing window is not yet full.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorBar {
    pub open_time: DateTime<Utc>,
    pub close: f64,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub atr: Option<f64>,
}

impl IndicatorBar {
    /// A bar with every indicator undefined
    pub fn empty(open_time: DateTime<Utc>, close: f64) -> Self {
        Self {
            open_time,
            close,
            sma_short: None,
            sma_long: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            atr: None,
        }
    }

    /// True when every indicator on this bar is defined
    pub fn is_defined(&self) -> bool {
        self.sma_short.is_some()
            && self.sma_long.is_some()
            && self.rsi.is_some()
            && self.macd.is_some()
            && self.macd_signal.is_some()
            && self.atr.is_some()
    }
}

/// Indicator series aligned bar-for-bar with the candles it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    bars: Vec<IndicatorBar>,
}

impl IndicatorFrame {
    pub fn new(bars: Vec<IndicatorBar>) -> Self {
        Self { bars }
    }

    pub fn bars(&self) -> &[IndicatorBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Index of the most recent bar with every indicator defined
    pub fn last_defined_index(&self) -> Option<usize> {
        self.bars.iter().rposition(IndicatorBar::is_defined)
    }

    /// Most recent bar with every indicator defined
    pub fn last_defined(&self) -> Option<&IndicatorBar> {
        self.last_defined_index().map(|i| &self.bars[i])
    }
}
