use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::Direction;

/// An open position as reported by the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: u64,
    pub symbol: String,
    pub direction: Direction,
    pub volume: f64,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub profit: f64,
    pub opened_at: DateTime<Utc>,
}

/// Snapshot of the open positions for one symbol, split by direction.
///
/// Built fresh from the broker every cycle and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionBook {
    long: Vec<Position>,
    short: Vec<Position>,
}

impl PositionBook {
    /// Partition `positions`, keeping only those on `symbol`
    pub fn from_positions(symbol: &str, positions: Vec<Position>) -> Self {
        let (long, short): (Vec<_>, Vec<_>) = positions
            .into_iter()
            .filter(|p| p.symbol == symbol)
            .partition(|p| p.direction == Direction::Long);
        Self { long, short }
    }

    pub fn positions(&self, direction: Direction) -> &[Position] {
        match direction {
            Direction::Long => &self.long,
            Direction::Short => &self.short,
        }
    }

    pub fn count(&self, direction: Direction) -> usize {
        self.positions(direction).len()
    }

    /// All positions, longs first
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.long.iter().chain(self.short.iter())
    }

    pub fn len(&self) -> usize {
        self.long.len() + self.short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long.is_empty() && self.short.is_empty()
    }
}
