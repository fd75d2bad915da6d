//! Exit conditions for held positions

use std::fmt;

use crate::config::SignalConfig;
use crate::models::indicators::{IndicatorBar, IndicatorFrame};
use crate::models::signal::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Overbought,
    Oversold,
    MomentumReversal,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CloseReason::Overbought => "oscillator overbought",
            CloseReason::Oversold => "oscillator oversold",
            CloseReason::MomentumReversal => "momentum reversal",
        };
        f.write_str(s)
    }
}

/// Why a position held in `held` direction should be closed at `bar`, if it
/// should.
///
/// LONG: oscillator above `overbought`, or momentum line below its signal.
/// SHORT: oscillator below `oversold`, or momentum line above its signal.
pub fn close_reason(
    bar: &IndicatorBar,
    held: Direction,
    config: &SignalConfig,
) -> Option<CloseReason> {
    let (rsi, macd, macd_signal) = (bar.rsi?, bar.macd?, bar.macd_signal?);

    match held {
        Direction::Long if rsi > config.overbought => Some(CloseReason::Overbought),
        Direction::Long if macd < macd_signal => Some(CloseReason::MomentumReversal),
        Direction::Short if rsi < config.oversold => Some(CloseReason::Oversold),
        Direction::Short if macd > macd_signal => Some(CloseReason::MomentumReversal),
        _ => None,
    }
}

/// Close check against the last fully defined bar of `frame`.
///
/// A frame without any defined bar never closes anything.
pub fn should_close(frame: &IndicatorFrame, held: Direction, config: &SignalConfig) -> bool {
    frame
        .last_defined()
        .and_then(|bar| close_reason(bar, held, config))
        .is_some()
}
