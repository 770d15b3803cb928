//! Thread-safe audio sample ring buffer.
//!
//! Single-producer/single-consumer float32 queue between the emulation
//! thread (mixer output) and the host audio callback. Writes beyond the
//! available space are dropped; the emulation never blocks on audio.

use std::sync::Mutex;

/// Interior ring state. `read == write` is ambiguous between empty and
/// full; the `full` flag disambiguates.
#[derive(Debug)]
struct Ring {
    data: Box<[f32]>,
    read: usize,
    write: usize,
    full: bool,
}

impl Ring {
    fn readable(&self) -> usize {
        if self.full {
            self.data.len()
        } else if self.write >= self.read {
            self.write - self.read
        } else {
            self.data.len() - self.read + self.write
        }
    }
}

/// Circular float32 sample queue guarded by a mutex.
#[derive(Debug)]
pub struct AudioBuffer {
    ring: Mutex<Ring>,
}

impl AudioBuffer {
    /// Create a buffer holding `length` samples.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            ring: Mutex::new(Ring {
                data: vec![0.0; length].into_boxed_slice(),
                read: 0,
                write: 0,
                full: false,
            }),
        }
    }

    /// Total capacity in samples.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.lock().unwrap().data.len()
    }

    /// Samples queued for the consumer.
    #[must_use]
    pub fn readable(&self) -> usize {
        self.ring.lock().unwrap().readable()
    }

    /// Free space available to the producer.
    #[must_use]
    pub fn writable(&self) -> usize {
        let ring = self.ring.lock().unwrap();
        ring.data.len() - ring.readable()
    }

    /// Enqueue samples, dropping whatever does not fit. Returns the number
    /// of samples actually written.
    pub fn write(&self, samples: &[f32]) -> usize {
        let mut ring = self.ring.lock().unwrap();
        let length = ring.data.len();
        let writable = length - ring.readable();
        let count = samples.len().min(writable);

        for &sample in &samples[..count] {
            let write = ring.write;
            ring.data[write] = sample;
            ring.write = (write + 1) % length;
        }
        if count > 0 && ring.write == ring.read {
            ring.full = true;
        }
        count
    }

    /// Dequeue up to `out.len()` samples. Returns the number read.
    pub fn read(&self, out: &mut [f32]) -> usize {
        let mut ring = self.ring.lock().unwrap();
        let length = ring.data.len();
        let count = out.len().min(ring.readable());

        for slot in &mut out[..count] {
            let read = ring.read;
            *slot = ring.data[read];
            ring.read = (read + 1) % length;
        }
        if count > 0 {
            ring.full = false;
        }
        count
    }

    /// Drop all queued samples and rewind both indices.
    pub fn reset(&self) {
        let mut ring = self.ring.lock().unwrap();
        ring.read = 0;
        ring.write = 0;
        ring.full = false;
    }
}
