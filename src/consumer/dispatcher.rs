use super::ByteSink;
use crate::ring::{ByteRing, Consumer};

/// Fans bytes drained from a ring out to every registered sink.
pub struct Dispatcher {
    sinks: Vec<Box<dyn ByteSink>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink<S: ByteSink + 'static>(&mut self, sink: S) {
        tracing::debug!(sink = sink.name(), "registered sink");
        self.sinks.push(Box::new(sink));
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Drains `ring` until empty, then flushes every sink.
    #[inline]
    pub fn drain<R: ByteRing + ?Sized>(&mut self, ring: &mut R) -> DrainStats {
        let stats = self.pump(|| ring.dequeue().ok(), usize::MAX);
        self.flush();
        stats
    }

    /// Drains at most `limit` bytes; sinks are not flushed.
    #[inline]
    pub fn drain_batch<R: ByteRing + ?Sized>(&mut self, ring: &mut R, limit: usize) -> DrainStats {
        self.pump(|| ring.dequeue().ok(), limit)
    }

    #[inline]
    pub fn drain_spsc(&mut self, consumer: &mut Consumer<'_, '_>) -> DrainStats {
        let stats = self.pump(|| consumer.dequeue().ok(), usize::MAX);
        self.flush();
        stats
    }

    #[inline]
    pub fn drain_spsc_batch(&mut self, consumer: &mut Consumer<'_, '_>, limit: usize) -> DrainStats {
        self.pump(|| consumer.dequeue().ok(), limit)
    }

    pub fn flush(&mut self) {
        for sink in &mut self.sinks {
            sink.flush();
        }
    }

    fn pump(&mut self, mut next: impl FnMut() -> Option<u8>, limit: usize) -> DrainStats {
        let mut stats = DrainStats::default();
        for _ in 0..limit {
            let Some(byte) = next() else {
                break;
            };
            stats.bytes_read += 1;
            for sink in &mut self.sinks {
                if sink.consume(byte) {
                    stats.bytes_delivered += 1;
                } else {
                    stats.bytes_failed += 1;
                }
            }
        }
        if stats.bytes_failed > 0 {
            tracing::warn!(failed = stats.bytes_failed, read = stats.bytes_read, "sinks rejected bytes");
        }
        stats
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub bytes_read: u64,
    pub bytes_delivered: u64,
    pub bytes_failed: u64,
}

impl DrainStats {
    #[inline]
    pub fn success_rate(&self) -> f64 {
        let total = self.bytes_delivered + self.bytes_failed;
        if total == 0 {
            1.0
        } else {
            self.bytes_delivered as f64 / total as f64
        }
    }

    pub fn merge(&mut self, other: DrainStats) {
        self.bytes_read += other.bytes_read;
        self.bytes_delivered += other.bytes_delivered;
        self.bytes_failed += other.bytes_failed;
    }
}
