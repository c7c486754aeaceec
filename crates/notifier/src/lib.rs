//! Outbound delivery: the SMTP mail transport and the Telegram status notifier.

pub mod email;
pub mod telegram;

pub use email::SmtpTransport;
pub use telegram::TelegramNotifier;
