//! Single-job processing cycle.
//!
//! Each trigger drains at most one row:
//! 1. Read the row after the header
//! 2. Empty → report "queue is empty", then still delete (clears a dangling blank row)
//! 3. Otherwise wait out the row's delay, send, classify any failure
//! 4. Delete the row whatever the send outcome was
//! 5. Report the result to the trigger origin
//!
//! Nothing is retried. A failed send is reported and its row is gone.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use courier_common::error::AppError;
use courier_common::traits::{MailTransport, QueueStore, StatusNotifier};
use courier_common::types::{FailureReason, QueueRow, Report, SendOutcome, TriggerOrigin};

use crate::classify::classify;

/// What a finished cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    EmptyQueue,
    Delivered {
        recipient: String,
        delay_seconds: i64,
    },
    Failed {
        recipient: String,
        delay_seconds: i64,
        reason: FailureReason,
    },
}

impl CycleOutcome {
    fn report(&self, sender: &str) -> Report {
        match self {
            CycleOutcome::EmptyQueue => Report::EmptyQueue,
            CycleOutcome::Delivered {
                recipient,
                delay_seconds,
            } => Report::Delivery {
                sender: sender.to_string(),
                recipient: recipient.clone(),
                delay_seconds: *delay_seconds,
                failure: None,
            },
            CycleOutcome::Failed {
                recipient,
                delay_seconds,
                reason,
            } => Report::Delivery {
                sender: sender.to_string(),
                recipient: recipient.clone(),
                delay_seconds: *delay_seconds,
                failure: Some(reason.clone()),
            },
        }
    }
}

/// Drains one queue, one row per call to [`JobProcessor::process`].
pub struct JobProcessor {
    queue: Arc<dyn QueueStore>,
    transport: Arc<dyn MailTransport>,
    notifier: Arc<dyn StatusNotifier>,
    /// Serializes read → delete so concurrent triggers never consume the same row.
    queue_lock: Mutex<()>,
}

impl JobProcessor {
    pub fn new(
        queue: Arc<dyn QueueStore>,
        transport: Arc<dyn MailTransport>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            queue,
            transport,
            notifier,
            queue_lock: Mutex::new(()),
        }
    }

    /// Run one cycle for a trigger from `origin`.
    ///
    /// Queue faults propagate to the caller; send failures do not, they are
    /// reported like any other outcome.
    pub async fn process(&self, origin: TriggerOrigin) -> Result<CycleOutcome, AppError> {
        let span = tracing::info_span!("cycle", cycle_id = %Uuid::new_v4(), origin = %origin);

        async move {
            let guard = self.queue_lock.lock().await;

            let Some(row) = self.queue.read_first_row().await? else {
                tracing::info!("Queue is empty");
                self.report(origin, &CycleOutcome::EmptyQueue).await;
                if let Err(e) = self.queue.delete_first_row().await {
                    tracing::warn!(error = %e, "Cleanup delete on empty queue failed");
                }
                return Ok::<_, AppError>(CycleOutcome::EmptyQueue);
            };

            let outcome = self.consume(row).await?;
            drop(guard);

            self.report(origin, &outcome).await;
            tracing::info!(outcome = ?outcome, "Cycle finished");
            Ok::<_, AppError>(outcome)
        }
        .instrument(span)
        .await
    }

    async fn report(&self, origin: TriggerOrigin, outcome: &CycleOutcome) {
        let report = outcome.report(self.transport.sender());
        self.notifier.notify(origin, &report.to_string()).await;
    }

    async fn consume(&self, row: QueueRow) -> Result<CycleOutcome, AppError> {
        let recipient = row.recipient().to_string();
        let delay_seconds = row.delay_seconds().max(0);

        if delay_seconds > 0 {
            tracing::info!(delay_seconds, "Waiting before send");
            tokio::time::sleep(Duration::from_secs(delay_seconds as u64)).await;
        }

        let sent = self
            .transport
            .deliver(&recipient, row.subject(), row.body())
            .await;

        self.queue.delete_first_row().await?;

        let outcome = match sent {
            SendOutcome::Delivered => CycleOutcome::Delivered {
                recipient,
                delay_seconds,
            },
            SendOutcome::Rejected(raw) => {
                let reason = classify(&raw);
                tracing::warn!(recipient = %recipient, reason = %reason, "Send failed");
                CycleOutcome::Failed {
                    recipient,
                    delay_seconds,
                    reason,
                }
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivered_report() {
        let outcome = CycleOutcome::Delivered {
            recipient: "a@x.com".to_string(),
            delay_seconds: 3,
        };
        let text = outcome.report("me@x.com").to_string();
        assert!(text.contains("me@x.com"));
        assert!(text.contains("To: a@x.com"));
        assert!(text.contains("Delay: 3 seconds"));
        assert!(text.contains("Sent successfully"));
    }

    #[test]
    fn test_failed_report_carries_reason() {
        let outcome = CycleOutcome::Failed {
            recipient: "".to_string(),
            delay_seconds: 0,
            reason: FailureReason::EmptyLine,
        };
        let text = outcome.report("me@x.com").to_string();
        assert!(text.contains("Error: empty line"));
        assert!(text.contains("Row deleted"));
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(
            CycleOutcome::EmptyQueue.report("me@x.com"),
            Report::EmptyQueue
        );
    }
}
