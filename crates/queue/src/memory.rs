//! In-process queue, used for local runs and for exercising the processor.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use courier_common::error::AppError;
use courier_common::traits::QueueStore;
use courier_common::types::QueueRow;

/// A `VecDeque` behind a mutex that counts every remote-style call.
#[derive(Default)]
pub struct InMemoryQueue {
    rows: Mutex<VecDeque<QueueRow>>,
    reads: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: impl IntoIterator<Item = QueueRow>) -> Self {
        Self {
            rows: Mutex::new(rows.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn push(&self, row: QueueRow) {
        self.lock().push_back(row);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<QueueRow>> {
        // a poisoned guard still holds consistent rows
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl QueueStore for InMemoryQueue {
    async fn read_first_row(&self) -> Result<Option<QueueRow>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let head = self.lock().front().cloned();
        // blank rows read as empty, like a sheet row with only "" cells
        Ok(head.filter(|row| {
            [&row.recipient, &row.subject, &row.body, &row.delay_seconds]
                .iter()
                .any(|cell| cell.as_deref().is_some_and(|c| !c.is_empty()))
        }))
    }

    async fn delete_first_row(&self) -> Result<(), AppError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.lock().pop_front();
        Ok(())
    }
}
