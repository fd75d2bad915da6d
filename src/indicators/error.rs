use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: {available} bars available, {required} required")]
    InsufficientData { required: usize, available: usize },
    #[error("candles out of order at index {index}")]
    Unordered { index: usize },
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}
