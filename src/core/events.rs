//! Typed events published by the controller and the account monitor

use std::fmt;

use crate::models::cycle::CycleResult;
use crate::models::market::AccountInfo;

/// Capacity of the controller's broadcast channel. Slow subscribers that
/// fall further behind than this miss events rather than stall the loop.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    Stopping,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControllerState::Idle => "IDLE",
            ControllerState::Running => "RUNNING",
            ControllerState::Stopping => "STOPPING",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    StateChanged(ControllerState),
    CycleCompleted(CycleResult),
    AccountUpdate(AccountInfo),
}
