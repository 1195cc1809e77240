use super::RingError;

/// Operation set shared by every byte ring variant.
///
/// Every fallible operation reports its outcome synchronously; nothing blocks
/// and nothing is retried internally. Backpressure is `enqueue` returning
/// [`RingError::Full`].
pub trait ByteRing {
    fn capacity(&self) -> usize;

    fn count(&self) -> usize;

    /// True once the ring has a non-zero capacity and a storage binding.
    fn is_init(&self) -> bool;

    /// Returns the position state to empty. Capacity, storage binding and
    /// storage contents are left alone.
    fn reset(&mut self);

    /// Appends `byte` at the tail. Fails without mutation when full.
    fn enqueue(&mut self, byte: u8) -> Result<(), RingError>;

    /// Appends `byte`, evicting the oldest byte first if the ring is full.
    /// Returns the evicted byte, if any.
    fn enqueue_overwrite(&mut self, byte: u8) -> Option<u8>;

    /// Removes and returns the byte at the head. Fails without mutation when empty.
    fn dequeue(&mut self) -> Result<u8, RingError>;

    /// Reads the byte `offset` positions after the head without removing it.
    fn peek(&self, offset: usize) -> Result<u8, RingError>;

    #[inline]
    fn is_full(&self) -> bool {
        self.count() >= self.capacity()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[inline]
    fn available(&self) -> usize {
        self.capacity().saturating_sub(self.count())
    }

    /// Enqueues bytes from `src` in order until the ring is full.
    /// Returns how many were accepted.
    fn enqueue_slice(&mut self, src: &[u8]) -> usize {
        let mut written = 0;
        for &byte in src {
            if self.enqueue(byte).is_err() {
                break;
            }
            written += 1;
        }
        written
    }

    /// Dequeues into `dst` until the ring is empty or `dst` is filled.
    /// Returns how many bytes were written to `dst`.
    fn dequeue_into(&mut self, dst: &mut [u8]) -> usize {
        let mut read = 0;
        for slot in dst.iter_mut() {
            match self.dequeue() {
                Ok(byte) => *slot = byte,
                Err(_) => break,
            }
            read += 1;
        }
        read
    }
}

/// Shared peek bound check: empty first, then the strict `offset < count` bound.
#[inline]
pub(crate) fn check_peek(offset: usize, count: usize) -> Result<(), RingError> {
    if count == 0 {
        return Err(RingError::Empty);
    }
    if offset >= count {
        return Err(RingError::OutOfRange { offset, count });
    }
    Ok(())
}
