//! Goldfinch: signal and execution control loop for a single-instrument
//! trading account.
//!
//! Candles pulled from a [`services::broker::BrokerGateway`] flow through the
//! indicator engine, the signal generator and the risk policy; the
//! [`core::controller::ExecutionController`] dispatches the resulting closes
//! and entries back to the gateway and reports to a
//! [`services::notifier::Notifier`].

pub mod common;
pub mod config;
pub mod core;
pub mod indicators;
pub mod logging;
pub mod models;
pub mod risk;
pub mod services;
pub mod signals;
