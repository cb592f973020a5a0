//! Bounded rings of timestamped high-rate samples (GPS position, speed).
//!
//! Producers push at their own rate; the packetizer drains from the front only
//! as far as the packet budget allows. A full ring overwrites its oldest
//! sample, which is the only way a sample is ever lost, and every overwrite is
//! counted.
use embassy_time::Instant;
use heapless::Deque;

use crate::protocol::transport::SAMPLE_QUEUE_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    pub at: Instant,
    pub value: T,
}

/// Latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug)]
pub struct SampleQueue<T, const N: usize> {
    ring: Deque<Sample<T>, N>,
    overwritten: u32,
}

impl<T, const N: usize> Default for SampleQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> SampleQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            ring: Deque::new(),
            overwritten: 0,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, at: Instant, value: T) {
        let sample = Sample { at, value };
        if self.ring.is_full() {
            let _ = self.ring.pop_front();
            self.overwritten = self.overwritten.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::debug!("Sample ring full, oldest sample overwritten");
        }
        // room was made above
        let _ = self.ring.push_back(sample);
    }

    /// Oldest queued sample.
    pub fn front(&self) -> Option<&Sample<T>> {
        self.ring.front()
    }

    /// Sample at position `index` from the front.
    pub fn get(&self, index: usize) -> Option<&Sample<T>> {
        self.ring.iter().nth(index)
    }

    /// Remove the `count` oldest samples.
    pub fn consume(&mut self, count: usize) {
        for _ in 0..count {
            if self.ring.pop_front().is_none() {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Samples evicted by overwrite-on-full since creation.
    pub fn overwritten(&self) -> u32 {
        self.overwritten
    }
}

/// The two high-rate streams carried by telemetry packets.
#[derive(Debug, Default)]
pub struct SampleQueues {
    /// Ground speed in tenths of mph.
    pub speed: SampleQueue<u16, SAMPLE_QUEUE_CAPACITY>,
    pub position: SampleQueue<Position, SAMPLE_QUEUE_CAPACITY>,
}

impl SampleQueues {
    pub const fn new() -> Self {
        Self {
            speed: SampleQueue::new(),
            position: SampleQueue::new(),
        }
    }
}
