//! Goldfinch trading bot
//!
//! Runs the execution loop against the paper broker, with the account
//! monitor alongside it, until ctrl-c.

use dotenvy::dotenv;
use goldfinch::config::{get_environment, BotConfig};
use goldfinch::core::{AccountMonitor, ControllerEvent, ExecutionController};
use goldfinch::logging;
use goldfinch::models::{Candle, SymbolConstraints};
use goldfinch::services::{BrokerGateway, LogNotifier, Notifier, PaperBroker, TelegramNotifier};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let config = BotConfig::from_env()?;
    config.validate()?;

    info!("Starting Goldfinch");
    info!(environment = %get_environment(), "Environment");
    info!(
        symbol = %config.symbol,
        timeframe = %config.timeframe,
        poll_interval = ?config.poll_interval,
        max_positions = config.risk.max_positions_per_direction,
        "Trading {} on {} every {:?}",
        config.symbol,
        config.timeframe,
        config.poll_interval
    );

    let notifier: Arc<dyn Notifier> = match &config.telegram {
        Some(telegram) => {
            info!(chat_id = %telegram.chat_id, "Telegram notifications enabled");
            Arc::new(TelegramNotifier::new(telegram)?)
        }
        None => {
            warn!("TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID not set, notifications go to the log only");
            Arc::new(LogNotifier)
        }
    };

    let broker = PaperBroker::new(
        config.symbol.clone(),
        SymbolConstraints::default(),
        config.paper.balance,
    );
    if let Some(path) = &config.paper.candles_file {
        let raw = tokio::fs::read_to_string(path).await?;
        let candles: Vec<Candle> = serde_json::from_str(&raw)?;
        info!(path = %path.display(), candles = candles.len(), "Loaded {} candles for replay", candles.len());

        // Seed a full window up front, then release one bar per cycle
        let seed = candles.len().min(config.candle_count);
        let mut candles = candles.into_iter();
        broker.set_candles(candles.by_ref().take(seed).collect()).await;
        broker.queue_replay(candles).await;
    } else {
        warn!("PAPER_CANDLES_FILE not set, the paper broker has no market data");
    }
    let gateway: Arc<dyn BrokerGateway> = Arc::new(broker);

    let controller = Arc::new(ExecutionController::new(
        config.clone(),
        gateway.clone(),
        notifier,
    ));
    let shutdown = CancellationToken::new();

    let monitor = AccountMonitor::new(
        gateway.clone(),
        controller.event_sender(),
        config.account_refresh,
    )
    .spawn(shutdown.clone());

    let mut events = controller.subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ControllerEvent::CycleCompleted(result)) if result.has_errors() => {
                    debug!(cycle = result.cycle, errors = result.errors.len(), "Cycle finished with errors");
                }
                Ok(ControllerEvent::CycleCompleted(result)) => {
                    debug!(cycle = result.cycle, signal = ?result.signal, "Cycle finished");
                }
                Ok(ControllerEvent::AccountUpdate(account)) => {
                    debug!(balance = account.balance, equity = account.equity, profit = account.profit, "Account");
                }
                Ok(ControllerEvent::StateChanged(state)) => {
                    debug!(state = %state, "Controller state changed");
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let handle = controller.clone().spawn(shutdown.clone());

    info!("Controller started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutdown requested, stopping at the next cycle boundary...");
            handle.stop();
        }
        _ = shutdown.cancelled() => {
            warn!("Controller stopped on its own");
        }
    }

    let outcome = handle.join().await;
    if let Err(e) = monitor.await {
        warn!(error = %e, "Account monitor task failed");
    }

    if config.close_all_on_shutdown {
        match controller.close_all_positions().await {
            Ok(closed) => info!(closed = closed.len(), "Closed {} positions on shutdown", closed.len()),
            Err(e) => warn!(error = %e, "Could not close positions on shutdown"),
        }
    }

    gateway.shutdown().await;

    // Last sender gone: the event logger drains and exits
    drop(controller);
    let _ = event_log.await;

    outcome?;
    info!("Goldfinch stopped");
    Ok(())
}
