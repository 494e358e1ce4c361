pub mod frame;
pub mod pool;
pub mod replacer;

pub use frame::Frame;
pub use pool::{BufferPool, PageHandle};
pub use replacer::{Fifo, Lru, ReplacementPolicy};
