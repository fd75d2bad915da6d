//! Test doubles and fixtures for the control loop
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use goldfinch::config::BotConfig;
use goldfinch::models::{
    AccountInfo, Candle, CloseReceipt, OrderReceipt, OrderRequest, Position, SymbolConstraints,
    Timeframe,
};
use goldfinch::services::{
    BrokerError, BrokerGateway, EventKind, Notification, Notifier, PaperBroker, RejectReason,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const SYMBOL: &str = "XAUUSDm";

pub fn test_config() -> BotConfig {
    BotConfig {
        symbol: SYMBOL.to_string(),
        poll_interval: Duration::from_millis(10),
        account_refresh: Duration::from_millis(10),
        ..BotConfig::default()
    }
}

pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            Candle::new(
                close,
                close + 1.0,
                close - 1.0,
                close,
                1000.0,
                start + ChronoDuration::minutes(15 * i as i64),
            )
        })
        .collect()
}

/// Steady rise: bullish bias throughout, oscillator pinned at 100
pub fn uptrend_candles(count: usize) -> Vec<Candle> {
    let closes: Vec<f64> = (0..count).map(|i| 2000.0 + i as f64).collect();
    candles_from_closes(&closes)
}

/// 63 bars whose 20/50 averages cross upwards on the final bar with the
/// oscillator near 62 and momentum above its signal line (last close 1981)
pub fn bullish_crossover_candles() -> Vec<Candle> {
    candles_from_closes(&v_shape_closes(40, 63))
}

/// Mirror image of [`bullish_crossover_candles`] (last close 2019)
pub fn bearish_crossover_candles() -> Vec<Candle> {
    let closes: Vec<f64> = v_shape_closes(40, 63).into_iter().map(|c| 4000.0 - c).collect();
    candles_from_closes(&closes)
}

fn v_shape_closes(decline: usize, total: usize) -> Vec<f64> {
    let mut level = 2000.0;
    (0..total)
        .map(|i| {
            if i < decline {
                level -= 1.0;
            } else {
                level += 1.0;
            }
            let wiggle = if i % 2 == 1 { 2.0 } else { -2.0 };
            level + wiggle
        })
        .collect()
}

pub async fn paper_broker(candles: Vec<Candle>) -> PaperBroker {
    let broker = PaperBroker::new(SYMBOL, SymbolConstraints::default(), 10_000.0);
    broker.set_candles(candles).await;
    broker
}

/// Collects every notification for later inspection
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.notifications().into_iter().map(|n| n.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Candles,
    Positions,
    Account,
    Submit(OrderRequest),
    Close(u64),
}

/// Paper broker wrapper that records every call and can refuse chosen
/// closes or account reads
pub struct ScriptedGateway {
    pub inner: PaperBroker,
    calls: Mutex<Vec<Call>>,
    refused_closes: Mutex<HashSet<u64>>,
    account_offline: AtomicBool,
}

impl ScriptedGateway {
    pub fn new(inner: PaperBroker) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            refused_closes: Mutex::new(HashSet::new()),
            account_offline: AtomicBool::new(false),
        }
    }

    pub fn refuse_account_reads(&self) {
        self.account_offline.store(true, Ordering::SeqCst);
    }

    pub fn refuse_close(&self, position_id: u64) {
        self.refused_closes.lock().unwrap().insert(position_id);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Broker actions only, in the order they were issued
    pub fn dispatches(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Submit(_) | Call::Close(_)))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BrokerGateway for ScriptedGateway {
    async fn initialize(&self) -> Result<(), BrokerError> {
        self.inner.initialize().await
    }

    async fn get_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>, BrokerError> {
        self.record(Call::Candles);
        self.inner.get_candles(symbol, timeframe, count).await
    }

    async fn get_account_info(&self) -> Result<AccountInfo, BrokerError> {
        self.record(Call::Account);
        if self.account_offline.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable("account service offline".to_string()));
        }
        self.inner.get_account_info().await
    }

    async fn get_open_positions(&self, symbol: &str) -> Result<Vec<Position>, BrokerError> {
        self.record(Call::Positions);
        self.inner.get_open_positions(symbol).await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderReceipt, BrokerError> {
        self.record(Call::Submit(order.clone()));
        self.inner.submit_order(order).await
    }

    async fn close_position(&self, position_id: u64) -> Result<CloseReceipt, BrokerError> {
        self.record(Call::Close(position_id));
        if self.refused_closes.lock().unwrap().contains(&position_id) {
            return Err(BrokerError::Rejected(RejectReason::Requote));
        }
        self.inner.close_position(position_id).await
    }

    async fn get_symbol_constraints(&self, symbol: &str) -> Result<SymbolConstraints, BrokerError> {
        self.inner.get_symbol_constraints(symbol).await
    }
}
