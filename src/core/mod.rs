//! Execution control loop and its companions

pub mod controller;
pub mod error;
pub mod events;
pub mod monitor;

pub use controller::{ControllerHandle, ExecutionController};
pub use error::ControllerError;
pub use events::{ControllerEvent, ControllerState, EVENT_CHANNEL_CAPACITY};
pub use monitor::AccountMonitor;
