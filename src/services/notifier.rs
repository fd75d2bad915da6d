//! Fire-and-forget notifications about what the controller did

use std::fmt;
use tracing::info;

use crate::models::cycle::CycleStep;
use crate::models::market::AccountInfo;
use crate::models::order::{OrderReceipt, OrderRequest};
use crate::models::position::Position;
use crate::models::signal::Direction;
use crate::services::broker::RejectReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Startup,
    Shutdown,
    OrderPlaced,
    OrderRejected,
    PositionClosed,
    AccountUpdate,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Startup => "startup",
            EventKind::Shutdown => "shutdown",
            EventKind::OrderPlaced => "order_placed",
            EventKind::OrderRejected => "order_rejected",
            EventKind::PositionClosed => "position_closed",
            EventKind::AccountUpdate => "account_update",
            EventKind::Error => "error",
        };
        f.write_str(s)
    }
}

/// A titled, human-readable message
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: EventKind,
    pub title: String,
    pub lines: Vec<String>,
}

impl Notification {
    pub fn new(kind: EventKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn startup(symbol: &str, account: Option<&AccountInfo>) -> Self {
        let mut n = Self::new(EventKind::Startup, "Trading bot started").line(format!("Symbol: {}", symbol));
        if let Some(account) = account {
            n = n
                .line(format!("Balance: {:.2}", account.balance))
                .line(format!("Equity: {:.2}", account.equity));
        }
        n
    }

    pub fn shutdown(symbol: &str) -> Self {
        Self::new(EventKind::Shutdown, "Trading bot stopped").line(format!("Symbol: {}", symbol))
    }

    pub fn order_placed(order: &OrderRequest, receipt: &OrderReceipt) -> Self {
        Self::new(EventKind::OrderPlaced, format!("Trade {}", action(order.direction)))
            .line(format!("Symbol: {}", order.symbol))
            .line(format!("Volume: {}", order.volume))
            .line(format!("Price: {:.5}", receipt.fill_price))
            .line(format!("Stop Loss: {:.5}", order.stop_loss))
            .line(format!("Take Profit: {:.5}", order.take_profit))
            .line(format!("Ticket: {}", receipt.broker_reference))
    }

    pub fn order_rejected(order: &OrderRequest, reason: &RejectReason) -> Self {
        Self::new(EventKind::OrderRejected, format!("{} order rejected", action(order.direction)))
            .line(format!("Symbol: {}", order.symbol))
            .line(format!("Volume: {}", order.volume))
            .line(format!("Reason: {}", reason))
    }

    pub fn position_closed(position: &Position, close_price: f64, reason: &str) -> Self {
        Self::new(EventKind::PositionClosed, "Trade CLOSE")
            .line(format!("Symbol: {}", position.symbol))
            .line(format!("Position: {} {}", position.id, position.direction))
            .line(format!("Volume: {}", position.volume))
            .line(format!("Price: {:.5}", close_price))
            .line(format!("Profit: {:.2}", position.profit))
            .line(format!("Reason: {}", reason))
    }

    pub fn account_update(account: &AccountInfo) -> Self {
        Self::new(EventKind::AccountUpdate, "Account Update")
            .line(format!("Balance: {:.2}", account.balance))
            .line(format!("Equity: {:.2}", account.equity))
            .line(format!("Profit: {:.2}", account.profit))
    }

    pub fn error(step: Option<CycleStep>, message: impl Into<String>) -> Self {
        let title = match step {
            Some(step) => format!("Error during {}", step),
            None => "Error Alert".to_string(),
        };
        Self::new(EventKind::Error, title).line(message)
    }

    /// Title and lines joined as plain text
    pub fn text(&self) -> String {
        std::iter::once(self.title.as_str())
            .chain(self.lines.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn action(direction: Direction) -> &'static str {
    match direction {
        Direction::Long => "BUY",
        Direction::Short => "SELL",
    }
}

/// Sink for notifications.
///
/// `notify` must return promptly and must not surface delivery failures to
/// the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        info!(
            kind = %notification.kind,
            "{}",
            notification.text().replace('\n', " | ")
        );
    }
}
