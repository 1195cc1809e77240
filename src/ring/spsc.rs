//! Mirrored-index ring for one producer and one consumer.
//!
//! `head` and `tail` count over `0..2 * capacity` and are reduced modulo
//! `capacity` only to address storage. Equal indices mean empty, indices
//! `capacity` apart mean full, so neither a spare slot nor a shared counter is
//! needed:
//!
//! ```text
//!   0                             C :C+0                           2*C
//!  [B][A][ ][ ][ ][ ][ ][ ][ ][ ][ ]:[ ][ ][ ][ ][ ][ ][ ][ ][ ][D][C]
//!  >---|                            :                            |--->
//!      tail                         :mirror                      head
//! ```
//!
//! The producer is the only writer of `tail` and the consumer the only writer
//! of `head`. [`MirroredRing::split`] hands out exactly one endpoint of each
//! kind for as long as the ring stays borrowed.

use super::buffer::check_peek;
use super::{ByteRing, RingError};
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MirroredRing<'a> {
    buf: NonNull<u8>,
    capacity: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    _storage: PhantomData<&'a mut [u8]>,
}

// The ring is a mutable borrow of the storage plus two atomics. Shared access
// only reaches the storage through a `Producer`/`Consumer` pair, whose slot
// sets are disjoint.
unsafe impl Send for MirroredRing<'_> {}
unsafe impl Sync for MirroredRing<'_> {}

impl Default for MirroredRing<'_> {
    fn default() -> Self {
        Self {
            buf: NonNull::dangling(),
            capacity: 0,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            _storage: PhantomData,
        }
    }
}

impl std::fmt::Debug for MirroredRing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirroredRing")
            .field("capacity", &self.capacity)
            .field("head", &self.head.load(Ordering::Relaxed))
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .finish()
    }
}

/// Occupancy of a mirrored index pair: `(tail - head) mod 2C`, always in `0..=C`.
#[inline(always)]
fn occupancy(head: usize, tail: usize, capacity: usize) -> usize {
    if tail >= head {
        tail - head
    } else {
        tail + (capacity * 2 - head)
    }
}

impl<'a> MirroredRing<'a> {
    /// Binds the whole of `storage` without validation.
    ///
    /// A storage length above `usize::MAX / 2` cannot be mirrored; use
    /// [`MirroredRing::with_capacity`] when the length is not known to be sane.
    pub fn new(storage: &'a mut [u8]) -> Self {
        let capacity = storage.len();
        Self {
            buf: NonNull::from(storage).cast::<u8>(),
            capacity,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            _storage: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize, storage: &'a mut [u8]) -> Result<Self, RingError> {
        let mut ring = Self::default();
        ring.init(capacity, storage)?;
        Ok(ring)
    }

    pub fn init(&mut self, capacity: usize, storage: &'a mut [u8]) -> Result<(), RingError> {
        let checked = RingError::check_binding(capacity, storage.len()).and_then(|()| {
            if capacity > usize::MAX / 2 {
                Err(RingError::InvalidCapacity {
                    capacity,
                    reason: "mirrored index range overflows usize",
                })
            } else {
                Ok(())
            }
        });

        if let Err(e) = checked {
            tracing::debug!(capacity, storage_len = storage.len(), error = %e, "rejected mirrored ring init");
            return Err(e);
        }

        *self = Self::new(&mut storage[..capacity]);
        Ok(())
    }

    /// Splits the ring into its producer and consumer endpoints.
    ///
    /// The exclusive borrow guarantees a single pair exists at a time.
    pub fn split(&mut self) -> (Producer<'_, 'a>, Consumer<'_, 'a>) {
        let ring: &MirroredRing<'a> = self;
        (Producer { ring }, Consumer { ring })
    }

    #[inline(always)]
    fn advance(&self, index: usize) -> usize {
        (index + 1) % (self.capacity * 2)
    }

    // Occupancy must be derived from the caller's own index plus an acquire
    // load of the other one. A third party loading both can pair a stale head
    // with a fresh tail and see more than `capacity`.

    #[inline]
    fn producer_count(&self) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        occupancy(head, tail, self.capacity)
    }

    #[inline]
    fn consumer_count(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        occupancy(head, tail, self.capacity)
    }

    /// Producer half: only ever stores `tail`.
    #[inline]
    fn push(&self, byte: u8) -> Result<(), RingError> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if occupancy(head, tail, self.capacity) >= self.capacity {
            return Err(RingError::Full);
        }

        // SAFETY: `tail % capacity` is in bounds, and the slot lies outside
        // `head..tail`, so the consumer does not read it until the release
        // store below publishes it.
        unsafe { self.buf.as_ptr().add(tail % self.capacity).write(byte) };

        self.tail.store(self.advance(tail), Ordering::Release);
        Ok(())
    }

    /// Consumer half: only ever stores `head`.
    #[inline]
    fn pull(&self) -> Result<u8, RingError> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head == tail {
            return Err(RingError::Empty);
        }

        // SAFETY: the slot lies inside `head..tail`, published by the
        // producer's release store of `tail` and not rewritten until `head`
        // moves past it.
        let byte = unsafe { self.buf.as_ptr().add(head % self.capacity).read() };

        self.head.store(self.advance(head), Ordering::Release);
        Ok(byte)
    }

    #[inline]
    fn read_at(&self, offset: usize) -> Result<u8, RingError> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        check_peek(offset, occupancy(head, tail, self.capacity))?;

        let slot = (head % self.capacity + offset) % self.capacity;
        // SAFETY: `offset < count`, so the slot lies inside `head..tail`.
        Ok(unsafe { self.buf.as_ptr().add(slot).read() })
    }
}

impl ByteRing for MirroredRing<'_> {
    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn count(&self) -> usize {
        self.consumer_count()
    }

    #[inline]
    fn is_init(&self) -> bool {
        self.capacity != 0
    }

    fn reset(&mut self) {
        *self.head.get_mut() = 0;
        *self.tail.get_mut() = 0;
    }

    #[inline]
    fn enqueue(&mut self, byte: u8) -> Result<(), RingError> {
        self.push(byte)
    }

    /// Evicting writes `head`, which belongs to the consumer, so this is only
    /// reachable with exclusive access and never through a [`Producer`].
    fn enqueue_overwrite(&mut self, byte: u8) -> Option<u8> {
        if self.capacity == 0 {
            return Some(byte);
        }

        let evicted = if self.is_full() {
            let oldest = self.pull().ok();
            tracing::trace!(evicted = ?oldest, "mirrored ring full, dropped oldest byte");
            oldest
        } else {
            None
        };

        // Cannot fail: a slot was either free or just freed.
        let _ = self.push(byte);
        evicted
    }

    #[inline]
    fn dequeue(&mut self) -> Result<u8, RingError> {
        self.pull()
    }

    #[inline]
    fn peek(&self, offset: usize) -> Result<u8, RingError> {
        self.read_at(offset)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }
}

/// Write endpoint of a split [`MirroredRing`].
pub struct Producer<'r, 'a> {
    ring: &'r MirroredRing<'a>,
}

/// Read endpoint of a split [`MirroredRing`].
pub struct Consumer<'r, 'a> {
    ring: &'r MirroredRing<'a>,
}

impl Producer<'_, '_> {
    #[inline]
    pub fn enqueue(&mut self, byte: u8) -> Result<(), RingError> {
        self.ring.push(byte)
    }

    pub fn enqueue_slice(&mut self, src: &[u8]) -> usize {
        src.iter().take_while(|&&b| self.ring.push(b).is_ok()).count()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }

    /// May be stale by the time it is acted upon.
    #[inline]
    pub fn count(&self) -> usize {
        self.ring.producer_count()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count() >= self.ring.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl Consumer<'_, '_> {
    #[inline]
    pub fn dequeue(&mut self) -> Result<u8, RingError> {
        self.ring.pull()
    }

    #[inline]
    pub fn peek(&self, offset: usize) -> Result<u8, RingError> {
        self.ring.read_at(offset)
    }

    pub fn dequeue_into(&mut self, dst: &mut [u8]) -> usize {
        let mut read = 0;
        for slot in dst.iter_mut() {
            let Ok(byte) = self.ring.pull() else {
                break;
            };
            *slot = byte;
            read += 1;
        }
        read
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.ring.consumer_count()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count() >= self.ring.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
