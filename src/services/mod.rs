//! Seams to the outside world: the broker and the notification channel.

pub mod broker;
pub mod notifier;
pub mod paper;
pub mod telegram;

pub use broker::{BrokerError, BrokerGateway, RejectReason};
pub use notifier::{EventKind, LogNotifier, Notification, Notifier};
pub use paper::PaperBroker;
pub use telegram::{NotifierError, TelegramNotifier};
