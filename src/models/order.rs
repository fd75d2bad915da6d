use serde::{Deserialize, Serialize};

use super::signal::Direction;

/// A market order to open a new position. Built fresh for every dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    pub volume: f64,
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Broker acknowledgement of an accepted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub broker_reference: u64,
    pub fill_price: f64,
}

/// Broker acknowledgement of a closed position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseReceipt {
    pub position_id: u64,
    pub close_price: f64,
}
