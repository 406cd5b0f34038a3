//! Blocking multi-producer / multi-consumer FIFO queue
//!
//! Producers never block. Consumers block up to a timeout so that worker
//! loops can periodically observe shutdown. Stopping the queue wakes every
//! blocked consumer; after that `pop` returns `None` even if items remain.
//!
//! Every accepted item is stamped with a sequence number under the queue
//! lock, so consumers racing on the same key can tell which push came last.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// An item together with the order it was accepted in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequenced<T> {
    pub seq: u64,
    pub item: T,
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<Sequenced<T>>,
    next_seq: u64,
    stopped: bool,
}

#[derive(Debug)]
pub struct MessageQueue<T> {
    state: Mutex<State<T>>,
    available: Condvar,
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MessageQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                next_seq: 1,
                stopped: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueue an item and wake one consumer.
    ///
    /// Sequence numbers start at 1 and strictly increase in push order across
    /// all producers. Hands the item back if the queue has been stopped.
    pub fn push(&self, item: T) -> Result<(), T> {
        {
            let mut state = self.state.lock();
            if state.stopped {
                return Err(item);
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.items.push_back(Sequenced { seq, item });
        }
        self.available.notify_one();
        Ok(())
    }

    /// Dequeue the oldest item, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` on timeout or once the queue is stopped.
    pub fn pop(&self, timeout: Duration) -> Option<Sequenced<T>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        while state.items.is_empty() && !state.stopped {
            if self.available.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }

        if state.stopped {
            return None;
        }
        state.items.pop_front()
    }

    /// Stop the queue and wake every blocked consumer
    pub fn stop(&self) {
        self.state.lock().stopped = true;
        self.available.notify_all();
    }

    /// Accept items again after a `stop`. Items left in the queue are kept.
    pub fn reopen(&self) {
        self.state.lock().stopped = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = MessageQueue::new();
        for i in 0..5 {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.len(), 5);

        let drained: Vec<_> = (0..5)
            .map(|_| queue.pop(Duration::from_millis(10)).unwrap())
            .collect();
        let items: Vec<_> = drained.iter().map(|s| s.item).collect();
        let seqs: Vec<_> = drained.iter().map(|s| s.seq).collect();
        assert_eq!(items, vec![0, 1, 2, 3, 4]);
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_times_out_on_empty_queue() {
        let queue: MessageQueue<u32> = MessageQueue::new();
        let started = Instant::now();
        assert!(queue.pop(Duration::from_millis(50)).is_none());
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_stop_wakes_blocked_consumer() {
        let queue: Arc<MessageQueue<u32>> = Arc::new(MessageQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let started = Instant::now();
                let item = queue.pop(Duration::from_secs(10));
                (item, started.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(50));
        queue.stop();

        let (item, waited) = consumer.join().unwrap();
        assert!(item.is_none());
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_stopped_queue_rejects_and_withholds() {
        let queue = MessageQueue::new();
        queue.push("left-over").unwrap();
        queue.stop();

        assert!(queue.is_stopped());
        assert_eq!(queue.push("late"), Err("late"));
        assert!(queue.pop(Duration::from_millis(10)).is_none());

        queue.reopen();
        let popped = queue.pop(Duration::from_millis(10)).unwrap();
        assert_eq!(popped.item, "left-over");

        // The rejected push did not consume a sequence number
        queue.push("next").unwrap();
        assert_eq!(queue.pop(Duration::from_millis(10)).unwrap().seq, 2);
    }

    #[test]
    fn test_blocked_consumer_receives_later_push() {
        let queue: Arc<MessageQueue<String>> = Arc::new(MessageQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        queue.push("hello".to_string()).unwrap();
        let received = consumer.join().unwrap().map(|s| s.item);
        assert_eq!(received.as_deref(), Some("hello"));
    }

    #[test]
    fn test_many_producers_many_consumers_deliver_exactly_once() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 500;

        let queue: Arc<MessageQueue<(usize, usize)>> = Arc::new(MessageQueue::new());

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut received = Vec::new();
                    while let Some(popped) = queue.pop(Duration::from_millis(500)) {
                        received.push(popped);
                    }
                    received
                })
            })
            .collect();

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for seq in 0..PER_PRODUCER {
                        queue.push((p, seq)).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut per_producer: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut stamps: HashMap<usize, Vec<(usize, u64)>> = HashMap::new();
        let mut all_stamps = Vec::new();
        for consumer in consumers {
            for Sequenced { seq: stamp, item: (p, seq) } in consumer.join().unwrap() {
                per_producer.entry(p).or_default().push(seq);
                stamps.entry(p).or_default().push((seq, stamp));
                all_stamps.push(stamp);
            }
        }

        assert_eq!(all_stamps.len(), PRODUCERS * PER_PRODUCER);
        all_stamps.sort_unstable();
        all_stamps.dedup();
        assert_eq!(all_stamps.len(), PRODUCERS * PER_PRODUCER);

        // A producer's later pushes always carry higher stamps
        for (_, mut pairs) in stamps {
            pairs.sort_unstable();
            assert!(pairs.windows(2).all(|w| w[0].1 < w[1].1));
        }
        for (_, mut seqs) in per_producer {
            seqs.sort_unstable();
            assert_eq!(seqs, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }
}
