//! Server-wide counters

use parking_lot::Mutex;
use std::time::Duration;

/// Point-in-time copy of the server counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub active_connections: usize,
    pub messages_processed: u64,
    pub errors_encountered: u64,
    /// Mean time from receipt to ACK over all acknowledged messages
    pub average_processing_time: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    active_connections: usize,
    messages_processed: u64,
    errors_encountered: u64,
    total_processing_time: Duration,
}

/// Lock-guarded counters shared by the event loop and the workers
#[derive(Debug, Default)]
pub(crate) struct StatsCollector {
    counters: Mutex<Counters>,
}

impl StatsCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claim a connection slot if fewer than `max` are active.
    ///
    /// Returns the new active count on success.
    pub(crate) fn try_admit(&self, max: usize) -> Option<usize> {
        let mut counters = self.counters.lock();
        if counters.active_connections >= max {
            return None;
        }
        counters.active_connections += 1;
        Some(counters.active_connections)
    }

    pub(crate) fn release(&self) {
        let mut counters = self.counters.lock();
        counters.active_connections = counters.active_connections.saturating_sub(1);
    }

    pub(crate) fn record_processed(&self, elapsed: Duration) {
        let mut counters = self.counters.lock();
        counters.messages_processed += 1;
        counters.total_processing_time += elapsed;
    }

    pub(crate) fn record_error(&self) {
        self.counters.lock().errors_encountered += 1;
    }

    pub(crate) fn snapshot(&self) -> Statistics {
        let counters = self.counters.lock();
        let average_processing_time = match u32::try_from(counters.messages_processed) {
            Ok(0) => Duration::ZERO,
            Ok(n) => counters.total_processing_time / n,
            Err(_) => Duration::from_secs_f64(
                counters.total_processing_time.as_secs_f64() / counters.messages_processed as f64,
            ),
        };

        Statistics {
            active_connections: counters.active_connections,
            messages_processed: counters.messages_processed,
            errors_encountered: counters.errors_encountered,
            average_processing_time,
        }
    }
}
