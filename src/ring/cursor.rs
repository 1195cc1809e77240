use super::buffer::check_peek;
use super::{ByteRing, RingError};
use std::marker::PhantomData;
use std::ptr;

/// Pointer-based ring: `head` and `tail` are cursors into the storage that
/// reset to the start when they reach `end`, so stepping never divides.
///
/// Same semantics and concurrency limits as [`CountedRing`](super::CountedRing).
#[derive(Debug)]
pub struct PointerRing<'a> {
    start: *mut u8,
    /// One past the last usable byte.
    end: *mut u8,
    head: *mut u8,
    tail: *mut u8,
    capacity: usize,
    count: usize,
    _storage: PhantomData<&'a mut [u8]>,
}

// Equivalent to holding `&'a mut [u8]`.
unsafe impl Send for PointerRing<'_> {}

impl Default for PointerRing<'_> {
    fn default() -> Self {
        Self {
            start: ptr::null_mut(),
            end: ptr::null_mut(),
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
            capacity: 0,
            count: 0,
            _storage: PhantomData,
        }
    }
}

impl<'a> PointerRing<'a> {
    /// Binds the whole of `storage` without validation.
    pub fn new(storage: &'a mut [u8]) -> Self {
        let capacity = storage.len();
        let range = storage.as_mut_ptr_range();
        Self {
            start: range.start,
            end: range.end,
            head: range.start,
            tail: range.start,
            capacity,
            count: 0,
            _storage: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize, storage: &'a mut [u8]) -> Result<Self, RingError> {
        let mut ring = Self::default();
        ring.init(capacity, storage)?;
        Ok(ring)
    }

    pub fn init(&mut self, capacity: usize, storage: &'a mut [u8]) -> Result<(), RingError> {
        if let Err(e) = RingError::check_binding(capacity, storage.len()) {
            tracing::debug!(capacity, storage_len = storage.len(), error = %e, "rejected pointer ring init");
            return Err(e);
        }

        *self = Self::new(&mut storage[..capacity]);
        Ok(())
    }

    /// Steps a cursor forward, resetting it to `start` at `end`.
    ///
    /// # Safety
    /// `cursor` must lie in `start..end`.
    #[inline(always)]
    unsafe fn step(&self, cursor: *mut u8) -> *mut u8 {
        let next = unsafe { cursor.add(1) };
        if next == self.end { self.start } else { next }
    }
}

impl ByteRing for PointerRing<'_> {
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
        self.capacity != 0 && !self.start.is_null()
    }

    fn reset(&mut self) {
        self.count = 0;
        self.head = self.start;
        self.tail = self.start;
    }

    #[inline]
    fn enqueue(&mut self, byte: u8) -> Result<(), RingError> {
        if self.count >= self.capacity {
            return Err(RingError::Full);
        }

        // SAFETY: a non-zero capacity means `tail` lies in `start..end`.
        unsafe {
            self.tail.write(byte);
            self.tail = self.step(self.tail);
        }
        self.count += 1;
        Ok(())
    }

    #[inline]
    fn enqueue_overwrite(&mut self, byte: u8) -> Option<u8> {
        if self.capacity == 0 {
            return Some(byte);
        }

        // SAFETY: a non-zero capacity means both cursors lie in `start..end`.
        unsafe {
            let evicted = if self.count >= self.capacity {
                let oldest = self.head.read();
                self.head = self.step(self.head);
                tracing::trace!(evicted = oldest, "pointer ring full, dropped oldest byte");
                Some(oldest)
            } else {
                self.count += 1;
                None
            };

            self.tail.write(byte);
            self.tail = self.step(self.tail);
            evicted
        }
    }

    #[inline]
    fn dequeue(&mut self) -> Result<u8, RingError> {
        if self.count == 0 {
            return Err(RingError::Empty);
        }

        // SAFETY: a non-empty ring has a non-zero capacity, so `head` lies in `start..end`.
        let byte = unsafe {
            let byte = self.head.read();
            self.head = self.step(self.head);
            byte
        };
        self.count -= 1;
        Ok(byte)
    }

    #[inline]
    fn peek(&self, offset: usize) -> Result<u8, RingError> {
        check_peek(offset, self.count)?;

        // SAFETY: both pointers come from the same storage slice and
        // `head >= start`; the wrapped index is below `capacity`.
        unsafe {
            let head_index = self.head.offset_from(self.start) as usize;
            Ok(self.start.add((head_index + offset) % self.capacity).read())
        }
    }
}
