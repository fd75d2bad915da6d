//! Foreground account reader.
//!
//! Polls the broker for balance and equity on its own schedule and publishes
//! the readings on the controller's event channel. It shares nothing with
//! the trading loop except the gateway.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::events::ControllerEvent;
use crate::services::broker::BrokerGateway;

pub struct AccountMonitor {
    gateway: Arc<dyn BrokerGateway>,
    events: broadcast::Sender<ControllerEvent>,
    interval: Duration,
}

impl AccountMonitor {
    pub fn new(
        gateway: Arc<dyn BrokerGateway>,
        events: broadcast::Sender<ControllerEvent>,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            events,
            interval,
        }
    }

    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut failing = false;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.gateway.get_account_info().await {
                Ok(account) => {
                    if failing {
                        info!("Account refresh recovered");
                        failing = false;
                    }
                    debug!(balance = account.balance, equity = account.equity, profit = account.profit, "Account refreshed");
                    let _ = self.events.send(ControllerEvent::AccountUpdate(account));
                }
                // Warn once per outage, the refresh interval is short
                Err(e) if !failing => {
                    warn!(error = %e, "Account refresh failed");
                    failing = true;
                }
                Err(e) => debug!(error = %e, "Account refresh still failing"),
            }
        }
        debug!("Account monitor stopped");
    }

    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(token).await })
    }
}
