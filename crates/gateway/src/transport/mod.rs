//! Transport between the network path and the worker pool

mod queue;

pub use queue::{MessageQueue, Sequenced};
