//! Broker gateway interface.
//!
//! The controller reaches the broker only through [`BrokerGateway`]. Every
//! call returns an explicit result; callers branch on [`BrokerError`]
//! instead of unwinding.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::models::indicators::Candle;
use crate::models::market::{AccountInfo, SymbolConstraints, Timeframe};
use crate::models::order::{CloseReceipt, OrderReceipt, OrderRequest};
use crate::models::position::Position;

/// Why the broker refused an order or close
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidVolume,
    InsufficientMargin,
    Requote,
    MarketClosed,
    PositionNotFound,
    Other { code: i64, message: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidVolume => f.write_str("invalid volume"),
            RejectReason::InsufficientMargin => f.write_str("insufficient margin"),
            RejectReason::Requote => f.write_str("requote"),
            RejectReason::MarketClosed => f.write_str("market closed"),
            RejectReason::PositionNotFound => f.write_str("position not found"),
            RejectReason::Other { code, message } => write!(f, "{} (code {})", message, code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("broker gateway unavailable: {0}")]
    Unavailable(String),
    #[error("broker gateway not initialized")]
    NotInitialized,
    #[error("symbol {0} not found")]
    SymbolNotFound(String),
    #[error("rejected by broker: {0}")]
    Rejected(RejectReason),
}

impl BrokerError {
    /// Connectivity failures that may clear up by the next cycle
    pub fn is_transient(&self) -> bool {
        matches!(self, BrokerError::Unavailable(_))
    }
}

#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// Confirm the gateway is connected and ready to trade
    async fn initialize(&self) -> Result<(), BrokerError>;

    /// Most recent `count` candles, oldest first
    async fn get_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>, BrokerError>;

    async fn get_account_info(&self) -> Result<AccountInfo, BrokerError>;

    async fn get_open_positions(&self, symbol: &str) -> Result<Vec<Position>, BrokerError>;

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderReceipt, BrokerError>;

    async fn close_position(&self, position_id: u64) -> Result<CloseReceipt, BrokerError>;

    async fn get_symbol_constraints(&self, symbol: &str) -> Result<SymbolConstraints, BrokerError>;

    /// Release the broker session
    async fn shutdown(&self) {}
}
