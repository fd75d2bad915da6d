//! Indicator engine: candle series in, aligned indicator series out.
//!
//! Everything here is a pure function of its inputs. No clock, no I/O.

pub mod engine;
pub mod error;

pub mod momentum;
pub mod trend;
pub mod volatility;

pub use engine::compute;
pub use error::IndicatorError;
