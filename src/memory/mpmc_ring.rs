use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

// Cache line size for modern x86-64 processors
const CACHE_LINE_SIZE: usize = 64;

// Each slot's sequence counter lives on its own cache line, away from the
// payload storage, so the publish handshake never false-shares with the
// record copies.
#[repr(align(64))]
struct SlotSequence {
    value: AtomicU64,
    _padding: [u8; CACHE_LINE_SIZE - 8],
}

#[repr(align(64))]
struct PaddedCounter {
    value: AtomicU64,
    _padding: [u8; CACHE_LINE_SIZE - 8],
}

impl PaddedCounter {
    fn new(value: u64) -> Self {
        Self {
            value: AtomicU64::new(value),
            _padding: [0; CACHE_LINE_SIZE - 8],
        }
    }
}

/// Bounded lock-free multi-producer multi-consumer ring.
///
/// Sequenced-slot design: slot `i` starts with sequence `i`; a producer
/// claims position `pos` when `seq == pos`, publishes with `seq = pos + 1`;
/// a consumer claims when `seq == pos + 1` and releases the slot one lap
/// ahead with `seq = pos + capacity`. Both operations are non-blocking and
/// never allocate.
pub struct MpmcRing<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    sequences: Box<[SlotSequence]>,
    mask: u64,
    capacity: usize,
    head: PaddedCounter,
    tail: PaddedCounter,
}

unsafe impl<T: Send> Send for MpmcRing<T> {}
unsafe impl<T: Send> Sync for MpmcRing<T> {}

impl<T> MpmcRing<T> {
    /// Creates a ring with the given capacity, which must be a power of 2.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two(), "capacity must be a power of 2");

        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || UnsafeCell::new(MaybeUninit::uninit()));

        let mut sequences = Vec::with_capacity(capacity);
        for i in 0..capacity {
            sequences.push(SlotSequence {
                value: AtomicU64::new(i as u64),
                _padding: [0; CACHE_LINE_SIZE - 8],
            });
        }

        Self {
            slots: slots.into_boxed_slice(),
            sequences: sequences.into_boxed_slice(),
            mask: capacity as u64 - 1,
            capacity,
            head: PaddedCounter::new(0),
            tail: PaddedCounter::new(0),
        }
    }

    /// Attempts to push a value. Returns false when the ring is full.
    #[inline(always)]
    pub fn try_push(&self, item: T) -> bool {
        let mut pos = self.head.value.load(Ordering::Relaxed);
        loop {
            let idx = (pos & self.mask) as usize;
            let seq = unsafe { self.sequences.get_unchecked(idx) }
                .value
                .load(Ordering::Acquire);
            let diff = seq as i64 - pos as i64;

            if diff == 0 {
                // Slot is free at this lap; claim it. The CAS is relaxed:
                // the slot-level handshake below carries the ordering.
                match self.head.value.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe {
                            (*self.slots.get_unchecked(idx).get()).write(item);
                        }
                        unsafe { self.sequences.get_unchecked(idx) }
                            .value
                            .store(pos.wrapping_add(1), Ordering::Release);
                        return true;
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                // Consumer has not freed this slot yet: full.
                return false;
            } else {
                // Another producer claimed this position; chase the head.
                pos = self.head.value.load(Ordering::Relaxed);
            }
        }
    }

    /// Attempts to pop a value. Returns None when the ring is empty.
    #[inline(always)]
    pub fn try_pop(&self) -> Option<T> {
        let mut pos = self.tail.value.load(Ordering::Relaxed);
        loop {
            let idx = (pos & self.mask) as usize;
            let seq = unsafe { self.sequences.get_unchecked(idx) }
                .value
                .load(Ordering::Acquire);
            let diff = seq as i64 - pos.wrapping_add(1) as i64;

            if diff == 0 {
                match self.tail.value.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe {
                            (*self.slots.get_unchecked(idx).get()).assume_init_read()
                        };
                        unsafe { self.sequences.get_unchecked(idx) }
                            .value
                            .store(pos.wrapping_add(self.capacity as u64), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                // Producer has not published this position yet: empty.
                return None;
            } else {
                pos = self.tail.value.load(Ordering::Relaxed);
            }
        }
    }

    /// Approximate occupancy. Concurrent updates may make this momentarily
    /// off by one in either direction; callers must not rely on exact
    /// counts.
    #[inline(always)]
    pub fn len(&self) -> usize {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        head.wrapping_sub(tail) as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Drop for MpmcRing<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}
