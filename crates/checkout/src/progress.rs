//! Progress reporting for in-flight purchases.
//!
//! The orchestrator publishes one update per newly surfaced worker
//! message. Sinks decide where updates go: the chat surface, the log, or a
//! buffer in tests.

use std::sync::{Arc, Mutex};

use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub purchase_id: String,
    pub attempt: u32,
    pub message: String,
}

pub trait ProgressSink: Send + Sync {
    fn publish(&self, update: ProgressUpdate);
}

/// Default sink: one structured log line per update.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn publish(&self, update: ProgressUpdate) {
        info!(
            event_name = "checkout.progress",
            purchase_id = %update.purchase_id,
            attempt = update.attempt,
            message = %update.message,
            "purchase progress"
        );
    }
}

/// Buffering sink for tests and the demo transcript.
#[derive(Clone, Default)]
pub struct InMemoryProgressSink {
    updates: Arc<Mutex<Vec<ProgressUpdate>>>,
}

impl InMemoryProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        match self.updates.lock() {
            Ok(updates) => updates.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.updates().into_iter().map(|update| update.message).collect()
    }
}

impl ProgressSink for InMemoryProgressSink {
    fn publish(&self, update: ProgressUpdate) {
        match self.updates.lock() {
            Ok(mut updates) => updates.push(update),
            Err(poisoned) => poisoned.into_inner().push(update),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryProgressSink, ProgressSink, ProgressUpdate};

    #[test]
    fn in_memory_sink_records_updates_in_order() {
        let sink = InMemoryProgressSink::new();
        for (attempt, message) in ["Opening store", "Filling payment form"].iter().enumerate() {
            sink.publish(ProgressUpdate {
                purchase_id: "p-1".to_string(),
                attempt: attempt as u32 + 1,
                message: (*message).to_string(),
            });
        }

        assert_eq!(sink.messages(), vec!["Opening store", "Filling payment form"]);
        assert_eq!(sink.updates()[1].attempt, 2);
    }
}
