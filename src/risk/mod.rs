//! Position sizing and admission control

pub mod admission;
pub mod error;
pub mod sizing;

pub use admission::admit;
pub use error::RiskError;
pub use sizing::{protective_levels, quantize, size, ProtectiveLevels};
