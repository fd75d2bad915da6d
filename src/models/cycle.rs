//! Per-cycle outcome records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::order::OrderRequest;
use super::signal::Signal;

/// Step of the control loop a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStep {
    Fetch,
    Compute,
    Decide,
    Dispatch,
}

impl fmt::Display for CycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CycleStep::Fetch => "fetch",
            CycleStep::Compute => "compute",
            CycleStep::Decide => "decide",
            CycleStep::Dispatch => "dispatch",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleError {
    pub step: CycleStep,
    pub message: String,
}

/// What a single cycle did. Used for logging and events only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub signal: Option<Signal>,
    pub orders_issued: Vec<OrderRequest>,
    pub positions_closed: Vec<u64>,
    pub errors: Vec<CycleError>,
}

impl CycleResult {
    pub fn new(cycle: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            cycle,
            started_at,
            signal: None,
            orders_issued: Vec::new(),
            positions_closed: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_error(&mut self, step: CycleStep, message: impl Into<String>) {
        self.errors.push(CycleError {
            step,
            message: message.into(),
        });
    }

    /// True when market data could not be fetched and nothing was dispatched
    pub fn is_skipped(&self) -> bool {
        self.errors.iter().any(|e| e.step == CycleStep::Fetch)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
