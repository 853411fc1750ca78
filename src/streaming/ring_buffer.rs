//! Sample FIFO between the renderer thread and an audio callback
//!
//! Single producer, single consumer. Storage is guarded by a `parking_lot`
//! mutex held only while samples are copied; the head and tail are free-running
//! counters in atomics so fill levels can be polled without locking.

use crate::{Result, SoundChipError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Allocation ceiling, in samples (512 MB)
const MAX_SAMPLES: usize = (512 << 20) / std::mem::size_of::<f32>();

/// Fixed-capacity ring of `f32` samples
#[derive(Debug)]
pub struct RingBuffer {
    storage: Mutex<Box<[f32]>>,
    /// Samples pushed since creation
    head: AtomicUsize,
    /// Samples popped since creation
    tail: AtomicUsize,
    /// `capacity - 1`; capacity is a power of two
    wrap_mask: usize,
}

impl RingBuffer {
    /// Allocate a ring of at least `min_samples`, rounded up to a power of two.
    ///
    /// # Errors
    ///
    /// [`SoundChipError::ConfigError`] for a zero size or one above 512 MB.
    pub fn new(min_samples: usize) -> Result<Self> {
        if min_samples == 0 {
            return Err(SoundChipError::ConfigError("ring buffer needs at least one slot".into()));
        }
        let capacity = min_samples
            .checked_next_power_of_two()
            .filter(|&n| n <= MAX_SAMPLES)
            .ok_or_else(|| {
                SoundChipError::ConfigError(format!(
                    "ring buffer of {min_samples} samples is above the {MAX_SAMPLES} sample limit"
                ))
            })?;

        Ok(Self {
            storage: Mutex::new(vec![0.0; capacity].into_boxed_slice()),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            wrap_mask: capacity - 1,
        })
    }

    /// Capacity in samples
    #[inline]
    pub fn capacity(&self) -> usize {
        self.wrap_mask + 1
    }

    /// Samples ready for the consumer
    ///
    /// Safe to poll from a third thread: `tail` is loaded first so it can never
    /// be ahead of the `head` it is compared with. The result is clamped to the
    /// capacity in case the consumer drains and the producer refills in between.
    #[inline]
    pub fn available_read(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        head.wrapping_sub(tail).min(self.capacity())
    }

    /// Free slots for the producer
    #[inline]
    pub fn available_write(&self) -> usize {
        self.capacity().saturating_sub(self.available_read())
    }

    /// 0.0 when empty, 1.0 when full
    pub fn fill_percentage(&self) -> f32 {
        self.available_read() as f32 / self.capacity() as f32
    }

    /// Nothing to read
    pub fn is_empty(&self) -> bool {
        self.available_read() == 0
    }

    /// Push as many of `samples` as fit. Returns the count pushed.
    pub fn write(&self, samples: &[f32]) -> usize {
        let mut storage = self.storage.lock();
        let head = self.head.load(Ordering::Acquire);
        let used = head.wrapping_sub(self.tail.load(Ordering::Acquire));
        let count = samples.len().min(self.capacity() - used);
        if count == 0 {
            return 0;
        }

        for (offset, &sample) in samples[..count].iter().enumerate() {
            storage[head.wrapping_add(offset) & self.wrap_mask] = sample;
        }
        drop(storage);

        self.head.store(head.wrapping_add(count), Ordering::Release);
        count
    }

    /// Pop up to `dest.len()` samples. Returns the count popped.
    pub fn read(&self, dest: &mut [f32]) -> usize {
        let storage = self.storage.lock();
        let tail = self.tail.load(Ordering::Acquire);
        let ready = self.head.load(Ordering::Acquire).wrapping_sub(tail);
        let count = dest.len().min(ready);
        if count == 0 {
            return 0;
        }

        for (offset, slot) in dest[..count].iter_mut().enumerate() {
            *slot = storage[tail.wrapping_add(offset) & self.wrap_mask];
        }
        drop(storage);

        self.tail.store(tail.wrapping_add(count), Ordering::Release);
        count
    }

    /// Drop everything not yet read
    pub fn flush(&self) {
        let _storage = self.storage.lock();
        self.tail
            .store(self.head.load(Ordering::Acquire), Ordering::Release);
    }
}
