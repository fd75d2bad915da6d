//! In-memory broker for dry runs and tests.
//!
//! Fills every accepted order at the latest close, tracks open positions and
//! marks them to market on each query. Failures can be injected to exercise
//! the controller's recovery paths.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::indicators::Candle;
use crate::models::market::{AccountInfo, SymbolConstraints, Timeframe};
use crate::models::order::{CloseReceipt, OrderReceipt, OrderRequest};
use crate::models::position::Position;
use crate::models::signal::Direction;
use crate::services::broker::{BrokerError, BrokerGateway, RejectReason};

struct PaperState {
    reachable: bool,
    balance: f64,
    candles: Vec<Candle>,
    replay: VecDeque<Candle>,
    positions: Vec<Position>,
    next_id: u64,
    failing_fetches: usize,
    pending_rejection: Option<RejectReason>,
}

impl PaperState {
    fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    fn mark_to_market(&mut self) {
        let Some(price) = self.last_close() else {
            return;
        };
        for position in &mut self.positions {
            position.profit = unrealized(position, price);
        }
    }
}

fn unrealized(position: &Position, price: f64) -> f64 {
    let move_per_unit = match position.direction {
        Direction::Long => price - position.entry_price,
        Direction::Short => position.entry_price - price,
    };
    move_per_unit * position.volume
}

#[derive(Clone)]
pub struct PaperBroker {
    symbol: String,
    constraints: SymbolConstraints,
    state: Arc<RwLock<PaperState>>,
}

impl PaperBroker {
    pub fn new(symbol: impl Into<String>, constraints: SymbolConstraints, balance: f64) -> Self {
        Self {
            symbol: symbol.into(),
            constraints,
            state: Arc::new(RwLock::new(PaperState {
                reachable: true,
                balance,
                candles: Vec::new(),
                replay: VecDeque::new(),
                positions: Vec::new(),
                next_id: 1,
                failing_fetches: 0,
                pending_rejection: None,
            })),
        }
    }

    pub async fn set_candles(&self, candles: Vec<Candle>) {
        self.state.write().await.candles = candles;
    }

    pub async fn push_candle(&self, candle: Candle) {
        self.state.write().await.candles.push(candle);
    }

    /// Queue candles that are released one per candle fetch, so successive
    /// cycles see the market move forward
    pub async fn queue_replay(&self, candles: impl IntoIterator<Item = Candle>) {
        self.state.write().await.replay.extend(candles);
    }

    /// Make the next `count` candle fetches fail as if the broker were
    /// unreachable
    pub async fn fail_next_fetches(&self, count: usize) {
        self.state.write().await.failing_fetches = count;
    }

    pub async fn reject_next_order(&self, reason: RejectReason) {
        self.state.write().await.pending_rejection = Some(reason);
    }

    pub async fn set_reachable(&self, reachable: bool) {
        self.state.write().await.reachable = reachable;
    }

    /// Register an already open position, bypassing order validation
    pub async fn open_position(&self, direction: Direction, volume: f64, entry_price: f64) -> u64 {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;
        state.positions.push(Position {
            id,
            symbol: self.symbol.clone(),
            direction,
            volume,
            entry_price,
            stop_loss: None,
            take_profit: None,
            profit: 0.0,
            opened_at: Utc::now(),
        });
        id
    }

    pub async fn positions(&self) -> Vec<Position> {
        let mut state = self.state.write().await;
        state.mark_to_market();
        state.positions.clone()
    }

    async fn ensure_reachable(&self) -> Result<(), BrokerError> {
        if self.state.read().await.reachable {
            Ok(())
        } else {
            Err(BrokerError::Unavailable("paper broker offline".to_string()))
        }
    }

    fn ensure_symbol(&self, symbol: &str) -> Result<(), BrokerError> {
        if symbol == self.symbol {
            Ok(())
        } else {
            Err(BrokerError::SymbolNotFound(symbol.to_string()))
        }
    }

    fn volume_is_valid(&self, volume: f64) -> bool {
        let c = &self.constraints;
        let steps = volume / c.volume_step;
        volume >= c.min_volume && volume <= c.max_volume && (steps - steps.round()).abs() < 1e-6
    }
}

#[async_trait]
impl BrokerGateway for PaperBroker {
    async fn initialize(&self) -> Result<(), BrokerError> {
        self.ensure_reachable().await?;
        debug!(symbol = %self.symbol, "Paper broker ready");
        Ok(())
    }

    async fn get_candles(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Candle>, BrokerError> {
        self.ensure_symbol(symbol)?;
        let mut state = self.state.write().await;
        if !state.reachable {
            return Err(BrokerError::Unavailable("paper broker offline".to_string()));
        }
        if state.failing_fetches > 0 {
            state.failing_fetches -= 1;
            return Err(BrokerError::Unavailable("simulated fetch failure".to_string()));
        }
        if let Some(next) = state.replay.pop_front() {
            state.candles.push(next);
        }

        let start = state.candles.len().saturating_sub(count);
        Ok(state.candles[start..].to_vec())
    }

    async fn get_account_info(&self) -> Result<AccountInfo, BrokerError> {
        self.ensure_reachable().await?;
        let mut state = self.state.write().await;
        state.mark_to_market();
        let profit: f64 = state.positions.iter().map(|p| p.profit).sum();
        Ok(AccountInfo {
            balance: state.balance,
            equity: state.balance + profit,
            profit,
        })
    }

    async fn get_open_positions(&self, symbol: &str) -> Result<Vec<Position>, BrokerError> {
        self.ensure_reachable().await?;
        let mut state = self.state.write().await;
        state.mark_to_market();
        Ok(state
            .positions
            .iter()
            .filter(|p| p.symbol == symbol)
            .cloned()
            .collect())
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderReceipt, BrokerError> {
        self.ensure_reachable().await?;
        self.ensure_symbol(&order.symbol)?;

        let mut state = self.state.write().await;
        if let Some(reason) = state.pending_rejection.take() {
            return Err(BrokerError::Rejected(reason));
        }
        if !self.volume_is_valid(order.volume) {
            return Err(BrokerError::Rejected(RejectReason::InvalidVolume));
        }

        let fill_price = state.last_close().unwrap_or(order.price);
        let id = state.next_id;
        state.next_id += 1;
        state.positions.push(Position {
            id,
            symbol: order.symbol.clone(),
            direction: order.direction,
            volume: order.volume,
            entry_price: fill_price,
            stop_loss: Some(order.stop_loss),
            take_profit: Some(order.take_profit),
            profit: 0.0,
            opened_at: Utc::now(),
        });
        debug!(id, direction = %order.direction, volume = order.volume, fill_price, "Paper order filled");

        Ok(OrderReceipt {
            broker_reference: id,
            fill_price,
        })
    }

    async fn close_position(&self, position_id: u64) -> Result<CloseReceipt, BrokerError> {
        self.ensure_reachable().await?;

        let mut state = self.state.write().await;
        let Some(index) = state.positions.iter().position(|p| p.id == position_id) else {
            return Err(BrokerError::Rejected(RejectReason::PositionNotFound));
        };
        if let Some(reason) = state.pending_rejection.take() {
            return Err(BrokerError::Rejected(reason));
        }

        let position = state.positions.remove(index);
        let close_price = state.last_close().unwrap_or(position.entry_price);
        state.balance += unrealized(&position, close_price);

        Ok(CloseReceipt {
            position_id,
            close_price,
        })
    }

    async fn get_symbol_constraints(&self, symbol: &str) -> Result<SymbolConstraints, BrokerError> {
        self.ensure_reachable().await?;
        self.ensure_symbol(symbol)?;
        Ok(self.constraints)
    }
}
