use super::buffer::check_peek;
use super::{ByteRing, RingError};

/// Counted-index ring: `head` and `tail` wrap modulo `capacity`, and a
/// separate `count` disambiguates full from empty.
///
/// Not safe for concurrent use; `count`, `head` and `tail` must move together.
#[derive(Debug, Default)]
pub struct CountedRing<'a> {
    storage: &'a mut [u8],
    capacity: usize,
    count: usize,
    head: usize,
    tail: usize,
}

impl<'a> CountedRing<'a> {
    /// Binds the whole of `storage` without validation.
    pub fn new(storage: &'a mut [u8]) -> Self {
        Self {
            capacity: storage.len(),
            storage,
            count: 0,
            head: 0,
            tail: 0,
        }
    }

    pub fn with_capacity(capacity: usize, storage: &'a mut [u8]) -> Result<Self, RingError> {
        let mut ring = Self::default();
        ring.init(capacity, storage)?;
        Ok(ring)
    }

    pub fn init(&mut self, capacity: usize, storage: &'a mut [u8]) -> Result<(), RingError> {
        if let Err(e) = RingError::check_binding(capacity, storage.len()) {
            tracing::debug!(capacity, storage_len = storage.len(), error = %e, "rejected counted ring init");
            return Err(e);
        }

        *self = Self::new(&mut storage[..capacity]);
        Ok(())
    }

    #[inline(always)]
    fn wrap(&self, index: usize) -> usize {
        (index + 1) % self.capacity
    }
}

impl ByteRing for CountedRing<'_> {
    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn count(&self) -> usize {
        self.count
    }

    #[inline]
    fn is_init(&self) -> bool {
        self.capacity != 0 && !self.storage.is_empty()
    }

    fn reset(&mut self) {
        self.count = 0;
        self.head = 0;
        self.tail = 0;
    }

    #[inline]
    fn enqueue(&mut self, byte: u8) -> Result<(), RingError> {
        if self.count >= self.capacity {
            return Err(RingError::Full);
        }

        self.storage[self.tail] = byte;
        self.tail = self.wrap(self.tail);
        self.count += 1;
        Ok(())
    }

    #[inline]
    fn enqueue_overwrite(&mut self, byte: u8) -> Option<u8> {
        if self.capacity == 0 {
            return Some(byte);
        }

        let evicted = if self.count >= self.capacity {
            let oldest = self.storage[self.head];
            self.head = self.wrap(self.head);
            tracing::trace!(evicted = oldest, "counted ring full, dropped oldest byte");
            Some(oldest)
        } else {
            self.count += 1;
            None
        };

        self.storage[self.tail] = byte;
        self.tail = self.wrap(self.tail);
        evicted
    }

    #[inline]
    fn dequeue(&mut self) -> Result<u8, RingError> {
        if self.count == 0 {
            return Err(RingError::Empty);
        }

        let byte = self.storage[self.head];
        self.head = self.wrap(self.head);
        self.count -= 1;
        Ok(byte)
    }

    #[inline]
    fn peek(&self, offset: usize) -> Result<u8, RingError> {
        check_peek(offset, self.count)?;
        Ok(self.storage[(self.head + offset) % self.capacity])
    }
}
