use serde::{Deserialize, Serialize};
use std::fmt;

/// Stance of a position or entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("LONG"),
            Direction::Short => f.write_str("SHORT"),
        }
    }
}

/// Outcome of one signal evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
    Close,
}

impl Signal {
    /// Direction of the new position this signal asks for, if any
    pub fn entry_direction(&self) -> Option<Direction> {
        match self {
            Signal::Buy => Some(Direction::Long),
            Signal::Sell => Some(Direction::Short),
            Signal::Hold | Signal::Close => None,
        }
    }
}

impl From<Direction> for Signal {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Long => Signal::Buy,
            Direction::Short => Signal::Sell,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
            Signal::Close => "CLOSE",
        };
        f.write_str(s)
    }
}
