//! Unit tests for notification payloads

use crate::test_utils::position;
use goldfinch::models::cycle::CycleStep;
use goldfinch::models::market::AccountInfo;
use goldfinch::models::order::{OrderReceipt, OrderRequest};
use goldfinch::models::signal::Direction;
use goldfinch::services::{EventKind, Notification, RejectReason, TelegramNotifier};

fn order() -> OrderRequest {
    OrderRequest {
        symbol: "XAUUSDm".to_string(),
        direction: Direction::Long,
        volume: 0.01,
        price: 2000.0,
        stop_loss: 1985.0,
        take_profit: 2030.0,
    }
}

#[test]
fn test_order_placed_carries_trade_details() {
    let receipt = OrderReceipt {
        broker_reference: 77,
        fill_price: 2000.5,
    };
    let n = Notification::order_placed(&order(), &receipt);
    assert_eq!(n.kind, EventKind::OrderPlaced);
    assert_eq!(n.title, "Trade BUY");

    let text = n.text();
    assert!(text.contains("Symbol: XAUUSDm"));
    assert!(text.contains("Volume: 0.01"));
    assert!(text.contains("Stop Loss: 1985.00000"));
    assert!(text.contains("Take Profit: 2030.00000"));
    assert!(text.contains("Ticket: 77"));
}

#[test]
fn test_rejection_and_close_payloads() {
    let rejected = Notification::order_rejected(&order(), &RejectReason::InsufficientMargin);
    assert_eq!(rejected.kind, EventKind::OrderRejected);
    assert!(rejected.text().contains("insufficient margin"));

    let closed = Notification::position_closed(&position(5, "XAUUSDm", Direction::Short), 1990.0, "momentum reversal");
    assert_eq!(closed.kind, EventKind::PositionClosed);
    assert!(closed.text().contains("Position: 5 SHORT"));
    assert!(closed.text().contains("Reason: momentum reversal"));
}

#[test]
fn test_startup_includes_account_when_known() {
    let account = AccountInfo {
        balance: 10_000.0,
        equity: 10_050.0,
        profit: 50.0,
    };
    let with_account = Notification::startup("XAUUSDm", Some(&account));
    assert!(with_account.text().contains("Equity: 10050.00"));

    let without = Notification::startup("XAUUSDm", None);
    assert_eq!(without.lines.len(), 1);
}

#[test]
fn test_error_title_names_step() {
    let n = Notification::error(Some(CycleStep::Fetch), "timeout");
    assert_eq!(n.kind, EventKind::Error);
    assert_eq!(n.title, "Error during fetch");
    assert_eq!(Notification::error(None, "x").title, "Error Alert");
}

#[test]
fn test_telegram_render_escapes_html() {
    let n = Notification::error(None, "volume < min & step > 0");
    let html = TelegramNotifier::render(&n);
    assert_eq!(html, "<b>Error Alert</b>\nvolume &lt; min &amp; step &gt; 0");
}
