pub mod dispatcher;

pub use dispatcher::{DrainStats, Dispatcher};

/// Destination for bytes drained out of a ring.
pub trait ByteSink: Send {
    /// Returns `false` when the sink could not take the byte.
    fn consume(&mut self, byte: u8) -> bool;

    fn flush(&mut self) {}

    fn name(&self) -> &str;
}
