//! Execution controller: the FETCH → COMPUTE → DECIDE → DISPATCH → SLEEP loop.
//!
//! The broker is the only source of truth for positions and account state;
//! every cycle starts from a fresh snapshot and nothing is carried over except
//! the cycle counter. Cancellation is observed only while sleeping between
//! cycles, so a dispatched order always gets its notification.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::BotConfig;
use crate::core::error::ControllerError;
use crate::core::events::{ControllerEvent, ControllerState, EVENT_CHANNEL_CAPACITY};
use crate::indicators::{self, IndicatorError};
use crate::models::cycle::{CycleResult, CycleStep};
use crate::models::indicators::{Candle, IndicatorFrame};
use crate::models::market::SymbolConstraints;
use crate::models::order::OrderRequest;
use crate::models::position::{Position, PositionBook};
use crate::models::signal::Signal;
use crate::risk::{admit, protective_levels, quantize, size};
use crate::services::broker::{BrokerError, BrokerGateway};
use crate::services::notifier::{Notification, Notifier};
use crate::signals::{close_reason, CloseReason, SignalGenerator};

/// Market data gathered by FETCH
struct Snapshot {
    candles: Vec<Candle>,
    book: PositionBook,
}

/// Broker actions chosen by DECIDE, in dispatch order
#[derive(Default)]
struct Plan {
    closes: Vec<(Position, CloseReason)>,
    entry: Option<OrderRequest>,
}

pub struct ExecutionController {
    config: BotConfig,
    gateway: Arc<dyn BrokerGateway>,
    notifier: Arc<dyn Notifier>,
    generator: SignalGenerator,
    events: broadcast::Sender<ControllerEvent>,
    state: watch::Sender<ControllerState>,
    cycles: AtomicU64,
}

impl ExecutionController {
    pub fn new(
        config: BotConfig,
        gateway: Arc<dyn BrokerGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state, _) = watch::channel(ControllerState::Idle);
        Self {
            generator: SignalGenerator::new(config.signal.clone()),
            config,
            gateway,
            notifier,
            events,
            state,
            cycles: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Sender side of the event channel, for companions such as the
    /// account monitor that publish alongside the controller
    pub fn event_sender(&self) -> broadcast::Sender<ControllerEvent> {
        self.events.clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }

    /// Number of cycles started so far
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    fn set_state(&self, state: ControllerState) {
        self.state.send_replace(state);
        info!(symbol = %self.config.symbol, state = %state, "Controller state: {}", state);
        let _ = self.events.send(ControllerEvent::StateChanged(state));
    }

    /// Confirm the broker is reachable and the symbol resolves, then announce
    /// startup. Either failure is fatal and reported to the notifier.
    pub async fn initialize(&self) -> Result<SymbolConstraints, ControllerError> {
        let symbol = &self.config.symbol;

        let constraints = match self.connect().await {
            Ok(constraints) => constraints,
            Err(e) => {
                error!(symbol = %symbol, error = %e, "Controller initialization failed");
                self.notifier.notify(Notification::error(
                    None,
                    format!("Initialization failed for {}: {}", symbol, e),
                ));
                return Err(ControllerError::Initialization(e.to_string()));
            }
        };

        info!(
            symbol = %symbol,
            timeframe = %self.config.timeframe,
            min_volume = constraints.min_volume,
            max_volume = constraints.max_volume,
            volume_step = constraints.volume_step,
            "Broker gateway initialized for {}",
            symbol
        );

        let account = match self.gateway.get_account_info().await {
            Ok(account) => Some(account),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Could not read account at startup");
                None
            }
        };
        self.notifier.notify(Notification::startup(symbol, account.as_ref()));
        if let Some(account) = account {
            self.notifier.notify(Notification::account_update(&account));
        }

        Ok(constraints)
    }

    async fn connect(&self) -> Result<SymbolConstraints, BrokerError> {
        self.gateway.initialize().await?;
        self.gateway.get_symbol_constraints(&self.config.symbol).await
    }

    /// Run until `token` is cancelled.
    ///
    /// Claims IDLE → RUNNING, falling back to IDLE without publishing a
    /// state change if initialization fails, and moves RUNNING → STOPPING →
    /// IDLE once cancellation is observed at a sleep boundary.
    pub async fn run(&self, token: CancellationToken) -> Result<(), ControllerError> {
        let claimed = self.state.send_if_modified(|state| {
            if *state == ControllerState::Idle {
                *state = ControllerState::Running;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(ControllerError::AlreadyRunning);
        }

        let constraints = match self.initialize().await {
            Ok(constraints) => constraints,
            Err(e) => {
                // RUNNING was never announced
                self.state.send_replace(ControllerState::Idle);
                return Err(e);
            }
        };
        info!(symbol = %self.config.symbol, state = %ControllerState::Running, "Controller state: RUNNING");
        let _ = self.events.send(ControllerEvent::StateChanged(ControllerState::Running));

        loop {
            let result = self.run_cycle(&constraints).await;
            let _ = self.events.send(ControllerEvent::CycleCompleted(result));

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        self.set_state(ControllerState::Stopping);
        self.notifier.notify(Notification::shutdown(&self.config.symbol));
        self.set_state(ControllerState::Idle);
        Ok(())
    }

    /// Run the controller on its own task. The task cancels `token` when it
    /// ends, so anything sharing the token winds down with it.
    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> ControllerHandle {
        let state = self.watch_state();
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            let result = self.run(task_token.clone()).await;
            task_token.cancel();
            result
        });
        ControllerHandle { token, state, task }
    }

    /// One full FETCH → COMPUTE → DECIDE → DISPATCH pass. Never fails:
    /// problems are logged, notified and recorded on the result.
    pub async fn run_cycle(&self, constraints: &SymbolConstraints) -> CycleResult {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let span = info_span!("cycle", cycle, symbol = %self.config.symbol);
        self.cycle(cycle, constraints).instrument(span).await
    }

    async fn cycle(&self, cycle: u64, constraints: &SymbolConstraints) -> CycleResult {
        let mut result = CycleResult::new(cycle, Utc::now());

        let snapshot = match self.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let message = if e.is_transient() {
                    format!("market data unavailable, retrying next cycle: {}", e)
                } else {
                    format!("market data request refused: {}", e)
                };
                self.fail(&mut result, CycleStep::Fetch, message);
                return result;
            }
        };

        let frame = match indicators::compute(&snapshot.candles, &self.config.indicators) {
            Ok(frame) => frame,
            Err(IndicatorError::InsufficientData { required, available }) => {
                info!(required, available, "Not enough candles for indicators, holding");
                result.signal = Some(Signal::Hold);
                return result;
            }
            Err(e) => {
                self.fail(&mut result, CycleStep::Compute, e.to_string());
                return result;
            }
        };

        let signal = match self.generator.evaluate_with_book(&frame, &snapshot.book) {
            Ok(signal) => signal,
            Err(IndicatorError::InsufficientData { .. }) => Signal::Hold,
            Err(e) => {
                self.fail(&mut result, CycleStep::Compute, e.to_string());
                return result;
            }
        };
        result.signal = Some(signal);
        info!(signal = %signal, positions = snapshot.book.len(), "Signal: {}", signal);

        let plan = self.decide(signal, &frame, &snapshot.book, constraints, &mut result).await;
        self.dispatch(plan, &mut result).await;

        info!(
            signal = %signal,
            orders = result.orders_issued.len(),
            closed = result.positions_closed.len(),
            errors = result.errors.len(),
            "Cycle {} complete",
            cycle
        );
        result
    }

    async fn fetch(&self) -> Result<Snapshot, BrokerError> {
        let symbol = &self.config.symbol;
        let candles = self
            .gateway
            .get_candles(symbol, self.config.timeframe, self.config.candle_count)
            .await?;
        let positions = self.gateway.get_open_positions(symbol).await?;

        if let Some(last) = candles.last() {
            info!(price = last.close, bar = %last.open_time, "Latest {} price: {}", symbol, last.close);
        }

        Ok(Snapshot {
            candles,
            book: PositionBook::from_positions(symbol, positions),
        })
    }

    async fn decide(
        &self,
        signal: Signal,
        frame: &IndicatorFrame,
        book: &PositionBook,
        constraints: &SymbolConstraints,
        result: &mut CycleResult,
    ) -> Plan {
        let mut plan = Plan::default();
        let Some(bar) = frame.last_defined() else {
            return plan;
        };

        for position in book.iter() {
            if let Some(reason) = close_reason(bar, position.direction, self.generator.config()) {
                debug!(position = position.id, direction = %position.direction, reason = %reason, "Close condition met");
                plan.closes.push((position.clone(), reason));
            }
        }

        let Some(direction) = signal.entry_direction() else {
            return plan;
        };

        let max = self.config.risk.max_positions_per_direction;
        if !admit(book, direction, max) {
            info!(
                direction = %direction,
                open = book.count(direction),
                max,
                "Maximum {} positions reached, skipping entry",
                direction
            );
            return plan;
        }

        let Some(volatility) = bar.atr else {
            return plan;
        };
        let price = bar.close;

        let equity = match self.gateway.get_account_info().await {
            Ok(account) => account.equity,
            Err(e) => {
                self.fail(result, CycleStep::Decide, format!("account unavailable for sizing: {}", e));
                return plan;
            }
        };

        let volume = match size(equity, price, constraints, &self.config.risk) {
            Ok(volume) => volume,
            Err(e) => {
                self.fail(result, CycleStep::Decide, e.to_string());
                return plan;
            }
        };

        let levels = protective_levels(direction, price, volatility, &self.config.risk);
        plan.entry = Some(OrderRequest {
            symbol: self.config.symbol.clone(),
            direction,
            volume,
            price,
            stop_loss: round_price(levels.stop_loss, constraints.point_size),
            take_profit: round_price(levels.take_profit, constraints.point_size),
        });
        plan
    }

    // Closes go first, longs before shorts, then the single entry. A failed
    // dispatch never stops the ones after it.
    async fn dispatch(&self, plan: Plan, result: &mut CycleResult) {
        for (position, reason) in plan.closes {
            match self.gateway.close_position(position.id).await {
                Ok(receipt) => {
                    info!(
                        position = position.id,
                        direction = %position.direction,
                        close_price = receipt.close_price,
                        reason = %reason,
                        "Closed {} position {}",
                        position.direction,
                        position.id
                    );
                    result.positions_closed.push(position.id);
                    self.notifier.notify(Notification::position_closed(
                        &position,
                        receipt.close_price,
                        &reason.to_string(),
                    ));
                }
                Err(e) => {
                    self.fail(
                        result,
                        CycleStep::Dispatch,
                        format!("close of position {} failed: {}", position.id, e),
                    );
                }
            }
        }

        let Some(order) = plan.entry else {
            return;
        };
        match self.gateway.submit_order(&order).await {
            Ok(receipt) => {
                info!(
                    direction = %order.direction,
                    volume = order.volume,
                    fill_price = receipt.fill_price,
                    stop_loss = order.stop_loss,
                    take_profit = order.take_profit,
                    reference = receipt.broker_reference,
                    "Opened {} position",
                    order.direction
                );
                self.notifier.notify(Notification::order_placed(&order, &receipt));
                result.orders_issued.push(order);
            }
            Err(BrokerError::Rejected(reason)) => {
                warn!(direction = %order.direction, volume = order.volume, reason = %reason, "Order rejected");
                result.record_error(CycleStep::Dispatch, format!("order rejected: {}", reason));
                self.notifier.notify(Notification::order_rejected(&order, &reason));
            }
            Err(e) => {
                self.fail(result, CycleStep::Dispatch, format!("order submission failed: {}", e));
            }
        }
    }

    /// Close every open position on the traded symbol. Positions that fail to
    /// close are reported and skipped; the ids actually closed are returned.
    pub async fn close_all_positions(&self) -> Result<Vec<u64>, BrokerError> {
        let symbol = &self.config.symbol;
        let book = PositionBook::from_positions(symbol, self.gateway.get_open_positions(symbol).await?);

        let mut closed = Vec::with_capacity(book.len());
        for position in book.iter() {
            match self.gateway.close_position(position.id).await {
                Ok(receipt) => {
                    info!(position = position.id, close_price = receipt.close_price, "Closed position {}", position.id);
                    self.notifier.notify(Notification::position_closed(
                        position,
                        receipt.close_price,
                        "close all",
                    ));
                    closed.push(position.id);
                }
                Err(e) => {
                    warn!(position = position.id, error = %e, "Failed to close position {}", position.id);
                    self.notifier.notify(Notification::error(
                        Some(CycleStep::Dispatch),
                        format!("close of position {} failed: {}", position.id, e),
                    ));
                }
            }
        }
        Ok(closed)
    }

    fn fail(&self, result: &mut CycleResult, step: CycleStep, message: String) {
        warn!(step = %step, error = %message, "Cycle step {} failed", step);
        self.notifier.notify(Notification::error(Some(step), message.clone()));
        result.record_error(step, message);
    }
}

fn round_price(price: f64, point_size: f64) -> f64 {
    if point_size > 0.0 {
        quantize(price, point_size)
    } else {
        price
    }
}

/// Handle to a controller running on its own task
pub struct ControllerHandle {
    token: CancellationToken,
    state: watch::Receiver<ControllerState>,
    task: JoinHandle<Result<(), ControllerError>>,
}

impl ControllerHandle {
    /// Ask the loop to stop at its next sleep boundary
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }

    pub async fn join(self) -> Result<(), ControllerError> {
        self.task
            .await
            .map_err(|e| ControllerError::Task(e.to_string()))?
    }
}
