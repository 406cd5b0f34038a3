mod message;
mod side;

pub use message::{Message, MessageKind};
pub use side::Side;
