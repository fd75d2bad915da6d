//! Shared data models spanning the engine layers.

pub mod cycle;
pub mod indicators;
pub mod market;
pub mod order;
pub mod position;
pub mod signal;

pub use cycle::{CycleError, CycleResult, CycleStep};
pub use indicators::{Candle, IndicatorBar, IndicatorFrame};
pub use market::{AccountInfo, SymbolConstraints, Timeframe};
pub use order::{CloseReceipt, OrderReceipt, OrderRequest};
pub use position::{Position, PositionBook};
pub use signal::{Direction, Signal};
