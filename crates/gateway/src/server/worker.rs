//! Worker pool draining the message queue

use super::dispatch::Dispatcher;
use super::stats::StatsCollector;
use crate::transport::{MessageQueue, Sequenced};
use fixgate_core::Message;
use log::{debug, error};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub(crate) fn spawn_pool(
    size: usize,
    queue: Arc<MessageQueue<Message>>,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<StatsCollector>,
    running: Arc<AtomicBool>,
    pop_timeout: Duration,
) -> io::Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(size);
    for id in 0..size {
        let worker_queue = Arc::clone(&queue);
        let worker_dispatcher = Arc::clone(&dispatcher);
        let worker_stats = Arc::clone(&stats);
        let worker_running = Arc::clone(&running);

        let spawned = thread::Builder::new()
            .name(format!("fixgate-worker-{id}"))
            .spawn(move || {
                run(
                    id,
                    &worker_queue,
                    &worker_dispatcher,
                    &worker_stats,
                    &worker_running,
                    pop_timeout,
                )
            });

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                // Unwind the workers that did start before reporting
                running.store(false, Ordering::Release);
                queue.stop();
                for handle in handles {
                    let _ = handle.join();
                }
                return Err(e);
            }
        }
    }
    Ok(handles)
}

fn run(
    id: usize,
    queue: &MessageQueue<Message>,
    dispatcher: &Dispatcher,
    stats: &StatsCollector,
    running: &AtomicBool,
    pop_timeout: Duration,
) {
    debug!("Worker {} started", id);

    while running.load(Ordering::Acquire) {
        let Some(Sequenced { seq, item: message }) = queue.pop(pop_timeout) else {
            continue;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(seq, &message)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Worker {}: error processing {} message: {}", id, message.kind(), e);
                stats.record_error();
            }
            Err(_) => {
                error!("Worker {}: handler panicked on {} message", id, message.kind());
                stats.record_error();
            }
        }
    }

    debug!("Worker {} stopped", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::server::MessageHandler;
    use fixgate_core::MessageKind;
    use fixgate_order_manager::OrderStore;
    use std::time::Instant;

    struct Panicking;

    impl MessageHandler for Panicking {
        fn handle(&self, _seq: u64, _message: &Message) -> Result<(), HandlerError> {
            panic!("boom");
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_pool_applies_orders_and_counts_failures() {
        let _ = env_logger::try_init();

        let store = Arc::new(OrderStore::new());
        let queue = Arc::new(MessageQueue::new());
        let stats = Arc::new(StatsCollector::new());
        let running = Arc::new(AtomicBool::new(true));
        let dispatcher = Arc::new(
            Dispatcher::new(Arc::clone(&store))
                .with_handler(MessageKind::Control, Arc::new(Panicking)),
        );

        let handles = spawn_pool(
            2,
            Arc::clone(&queue),
            dispatcher,
            Arc::clone(&stats),
            Arc::clone(&running),
            Duration::from_millis(20),
        )
        .unwrap();

        queue.push(Message::fix("35=D|11=W1|55=AAPL|")).unwrap();
        queue.push(Message::fix("35=D|55=NOID|")).unwrap();
        queue.push(Message::control("explode")).unwrap();
        queue.push(Message::fix("35=D|11=W2|55=MSFT|")).unwrap();

        assert!(wait_until(|| store.len() == 2 && stats.snapshot().errors_encountered == 2));

        running.store(false, Ordering::Release);
        queue.stop();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(store.exists("W1"));
        assert!(store.exists("W2"));
    }

    #[test]
    fn test_amendments_to_one_order_land_in_push_order() {
        let _ = env_logger::try_init();
        const ORDERS: usize = 500;

        let store = Arc::new(OrderStore::new());
        let queue = Arc::new(MessageQueue::new());
        let stats = Arc::new(StatsCollector::new());
        let running = Arc::new(AtomicBool::new(true));
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&store)));

        let handles = spawn_pool(
            4,
            Arc::clone(&queue),
            dispatcher,
            Arc::clone(&stats),
            Arc::clone(&running),
            Duration::from_millis(20),
        )
        .unwrap();

        // A long first version keeps its worker busy decoding while another
        // worker picks up the short amendment right behind it
        let padding: String = (0..200).map(|i| format!("{}=PAD|", 9000 + i)).collect();
        for order in 0..ORDERS {
            let original = format!("35=D|11=O{order}|38=1|{padding}");
            let amended = format!("35=D|11=O{order}|38=2|");
            queue.push(Message::fix(original)).unwrap();
            queue.push(Message::fix(amended)).unwrap();
        }

        assert!(wait_until(|| queue.is_empty() && store.len() == ORDERS));

        running.store(false, Ordering::Release);
        queue.stop();
        for handle in handles {
            handle.join().unwrap();
        }

        let stale: Vec<_> = store
            .snapshot()
            .into_iter()
            .filter(|(_, details)| !details.contains("|38=2|"))
            .map(|(id, _)| id)
            .collect();
        assert!(stale.is_empty(), "earlier version won for {stale:?}");
        assert_eq!(stats.snapshot().errors_encountered, 0);
    }
}
