//! Trigger gateway: turns an inbound bot update into one processing cycle.
//!
//! Only `message` and `edited_message` updates trigger work; anything else,
//! including bodies that are not JSON at all, is acknowledged and dropped.
//! Faults from the cycle stop here: the origin gets a best-effort error
//! report and the trigger is still acknowledged, so the upstream never
//! retries.

use std::sync::Arc;

use serde::Deserialize;
use tracing::Instrument;

use courier_common::traits::StatusNotifier;
use courier_common::types::{Report, TriggerOrigin};
use courier_engine::{CycleOutcome, JobProcessor};

/// Bot API update envelope, reduced to what selects the origin chat.
#[derive(Debug, Default, Deserialize)]
pub struct TelegramUpdate {
    pub message: Option<TelegramMessage>,
    pub edited_message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: Option<TelegramChat>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

impl TelegramUpdate {
    /// Lenient parse; malformed input is an empty update.
    pub fn from_slice(raw: &[u8]) -> Self {
        serde_json::from_slice(raw).unwrap_or_default()
    }

    /// Origin chat of a new or edited message, new message first.
    pub fn origin(&self) -> Option<TriggerOrigin> {
        let chat_of = |m: &Option<TelegramMessage>| {
            m.as_ref()
                .and_then(|m| m.chat.as_ref())
                .map(|c| TriggerOrigin(c.id))
        };
        chat_of(&self.message).or_else(|| chat_of(&self.edited_message))
    }
}

/// How a trigger was handled. The HTTP answer is `ok: true` for all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingAck {
    /// The cycle ran to completion.
    Processed(CycleOutcome),
    /// The cycle faulted; the origin was sent an error report.
    Faulted,
    /// Not a message update; nothing was done.
    Ignored,
}

pub struct TriggerGateway {
    processor: Arc<JobProcessor>,
    notifier: Arc<dyn StatusNotifier>,
}

impl TriggerGateway {
    pub fn new(processor: JobProcessor, notifier: Arc<dyn StatusNotifier>) -> Self {
        Self {
            processor: Arc::new(processor),
            notifier,
        }
    }

    /// Handle an authenticated trigger body.
    ///
    /// The cycle runs on its own task: dropping this future (the client
    /// hung up) does not stop a cycle that already started.
    pub async fn handle_trigger(&self, raw: &[u8]) -> ProcessingAck {
        let Some(origin) = TelegramUpdate::from_slice(raw).origin() else {
            tracing::debug!("Ignoring non-message update");
            return ProcessingAck::Ignored;
        };

        tracing::info!(chat_id = %origin, "Trigger received");

        let processor = self.processor.clone();
        let notifier = self.notifier.clone();
        let cycle = tokio::spawn(
            async move {
                match processor.process(origin).await {
                    Ok(outcome) => ProcessingAck::Processed(outcome),
                    Err(e) => {
                        tracing::error!(chat_id = %origin, error = %e, "Processing cycle failed");
                        let report = Report::ProcessingError(e.to_string());
                        notifier.notify(origin, &report.to_string()).await;
                        ProcessingAck::Faulted
                    }
                }
            }
            .in_current_span(),
        );

        match cycle.await {
            Ok(ack) => ack,
            Err(e) => {
                tracing::error!(chat_id = %origin, error = %e, "Processing task aborted");
                ProcessingAck::Faulted
            }
        }
    }
}
