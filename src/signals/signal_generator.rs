//! Moving-average crossover signals with oscillator and momentum vetoes

use tracing::debug;

use crate::config::SignalConfig;
use crate::indicators::IndicatorError;
use crate::models::indicators::{IndicatorBar, IndicatorFrame};
use crate::models::position::PositionBook;
use crate::models::signal::{Direction, Signal};
use crate::signals::close::{close_reason, should_close};

/// Lean of the short moving average against the long one on a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    /// `None` while either moving average is undefined. Exact equality is
    /// `Neutral`.
    pub fn of(bar: &IndicatorBar) -> Option<Bias> {
        let (short, long) = (bar.sma_short?, bar.sma_long?);
        Some(if short > long {
            Bias::Bullish
        } else if short < long {
            Bias::Bearish
        } else {
            Bias::Neutral
        })
    }
}

/// Filter that collapsed a candidate entry to HOLD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Veto {
    Overbought,
    Oversold,
    MomentumAgainst,
}

/// Full outcome of an evaluation, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub signal: Signal,
    pub candidate: Option<Direction>,
    pub veto: Option<Veto>,
}

struct Tail<'a> {
    previous: Bias,
    current: Bias,
    bar: &'a IndicatorBar,
    rsi: f64,
    macd: f64,
    macd_signal: f64,
}

pub struct SignalGenerator {
    config: SignalConfig,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Entry signal (BUY, SELL or HOLD) from the last fully defined bar
    pub fn evaluate(&self, frame: &IndicatorFrame) -> Result<Signal, IndicatorError> {
        Ok(self.assess(frame)?.signal)
    }

    /// Like [`evaluate`](Self::evaluate), but reports CLOSE when there is no
    /// entry candidate and a held position meets its close condition
    pub fn evaluate_with_book(
        &self,
        frame: &IndicatorFrame,
        book: &PositionBook,
    ) -> Result<Signal, IndicatorError> {
        let assessment = self.assess(frame)?;
        if assessment.candidate.is_some() {
            return Ok(assessment.signal);
        }

        let closing = frame.last_defined().is_some_and(|bar| {
            book.iter()
                .any(|p| close_reason(bar, p.direction, &self.config).is_some())
        });
        Ok(if closing { Signal::Close } else { Signal::Hold })
    }

    pub fn should_close(&self, frame: &IndicatorFrame, held: Direction) -> bool {
        should_close(frame, held, &self.config)
    }

    pub fn assess(&self, frame: &IndicatorFrame) -> Result<Assessment, IndicatorError> {
        let tail = Self::tail(frame)?;

        let candidate = match (tail.previous, tail.current) {
            (previous, Bias::Bullish) if previous != Bias::Bullish => Some(Direction::Long),
            (previous, Bias::Bearish) if previous != Bias::Bearish => Some(Direction::Short),
            _ => None,
        };

        let Some(direction) = candidate else {
            return Ok(Assessment {
                signal: Signal::Hold,
                candidate: None,
                veto: None,
            });
        };

        let veto = self.veto(direction, &tail);
        if let Some(veto) = veto {
            debug!(
                candidate = %direction,
                veto = ?veto,
                rsi = tail.rsi,
                macd = tail.macd,
                macd_signal = tail.macd_signal,
                bar = %tail.bar.open_time,
                "{} candidate vetoed: {:?}",
                direction,
                veto
            );
        }

        Ok(Assessment {
            signal: if veto.is_some() {
                Signal::Hold
            } else {
                Signal::from(direction)
            },
            candidate,
            veto,
        })
    }

    // Oscillator first, then momentum. A momentum line exactly on its
    // signal line confirms neither side.
    fn veto(&self, candidate: Direction, tail: &Tail<'_>) -> Option<Veto> {
        match candidate {
            Direction::Long => {
                if tail.rsi > self.config.overbought {
                    Some(Veto::Overbought)
                } else if !(tail.macd > tail.macd_signal) {
                    Some(Veto::MomentumAgainst)
                } else {
                    None
                }
            }
            Direction::Short => {
                if tail.rsi < self.config.oversold {
                    Some(Veto::Oversold)
                } else if !(tail.macd < tail.macd_signal) {
                    Some(Veto::MomentumAgainst)
                } else {
                    None
                }
            }
        }
    }

    fn tail(frame: &IndicatorFrame) -> Result<Tail<'_>, IndicatorError> {
        let bars = frame.bars();
        let insufficient = || IndicatorError::InsufficientData {
            required: 2,
            available: bars.iter().filter(|b| b.is_defined()).count(),
        };

        let index = frame
            .last_defined_index()
            .filter(|&i| i > 0)
            .ok_or_else(insufficient)?;
        let (previous, current) = (&bars[index - 1], &bars[index]);

        let (Some(previous_bias), Some(current_bias), Some(rsi), Some(macd), Some(macd_signal)) = (
            Bias::of(previous),
            Bias::of(current),
            current.rsi,
            current.macd,
            current.macd_signal,
        ) else {
            return Err(insufficient());
        };

        Ok(Tail {
            previous: previous_bias,
            current: current_bias,
            bar: current,
            rsi,
            macd,
            macd_signal,
        })
    }
}
