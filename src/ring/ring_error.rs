use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    #[error("Ring buffer is not bound to any storage")]
    NotInitialized,
    #[error("Ring buffer is full")]
    Full,
    #[error("Ring buffer is empty")]
    Empty,
    #[error("Peek offset {offset} out of range: {count} bytes available")]
    OutOfRange { offset: usize, count: usize },
    #[error("Invalid capacity {capacity}: {reason}")]
    InvalidCapacity {
        capacity: usize,
        reason: &'static str,
    },
}

impl RingError {
    pub(crate) fn check_binding(capacity: usize, storage_len: usize) -> Result<(), Self> {
        if capacity == 0 {
            return Err(Self::InvalidCapacity {
                capacity,
                reason: "must be non-zero",
            });
        }

        if storage_len == 0 {
            return Err(Self::NotInitialized);
        }

        if storage_len < capacity {
            return Err(Self::InvalidCapacity {
                capacity,
                reason: "storage is shorter than capacity",
            });
        }

        Ok(())
    }
}
