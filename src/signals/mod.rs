//! Signal evaluation: entry signals and exit conditions.

pub mod close;
pub mod signal_generator;

pub use close::{close_reason, should_close, CloseReason};
pub use signal_generator::{Assessment, Bias, SignalGenerator, Veto};
