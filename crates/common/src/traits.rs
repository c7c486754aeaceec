//! Seams to the external collaborators the worker talks to.
//!
//! The engine only sees these traits; concrete clients live in
//! `courier-queue` and `courier-notifier`.

use async_trait::async_trait;

use crate::error::AppError;
use crate::types::{QueueRow, SendOutcome, TriggerOrigin};

/// Remote ordered list of pending jobs, headed by a header row.
///
/// Reads and deletes are separate remote calls with no atomicity between them.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Read the row right after the header, `None` when it is absent or blank.
    async fn read_first_row(&self) -> Result<Option<QueueRow>, AppError>;

    /// Remove the row right after the header, shifting the rest up.
    async fn delete_first_row(&self) -> Result<(), AppError>;
}

/// Outbound mail delivery from one fixed sender identity.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Address mail is sent from.
    fn sender(&self) -> &str;

    /// Deliver one message. Faults are returned as data, never raised.
    async fn deliver(&self, to: &str, subject: &str, body: &str) -> SendOutcome;
}

/// Best-effort status line back to the trigger's chat.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    async fn notify(&self, origin: TriggerOrigin, text: &str);
}
