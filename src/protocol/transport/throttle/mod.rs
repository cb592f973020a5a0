//! Pending-frame buffer filled from the CAN receive interrupt.
//!
//! One slot per identifier in `PENDING_BASE_ID..=PENDING_LAST_ID`. The
//! interrupt overwrites a slot only when the throttle interval has elapsed
//! since that slot was last written; the main loop takes every filled slot in
//! one pass and clears them. Intermediate values inside a throttle window are
//! lost on purpose: only the latest state matters to the dashboard.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::{Duration, Instant};
use heapless::Vec;

use super::can_frame::CanFrame;
use super::{FRAME_THROTTLE_MS, PENDING_BASE_ID, PENDING_LAST_ID, PENDING_SLOTS};

/// Frames taken in one consume pass, ordered by identifier.
pub type PendingBatch = Vec<CanFrame, PENDING_SLOTS>;

#[derive(Debug)]
pub struct PendingFrames {
    slots: [Option<CanFrame>; PENDING_SLOTS],
    last_write: [Option<Instant>; PENDING_SLOTS],
    throttle: Duration,
    throttled: u32,
}

impl Default for PendingFrames {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingFrames {
    pub const fn new() -> Self {
        Self::with_throttle(Duration::from_millis(FRAME_THROTTLE_MS))
    }

    pub const fn with_throttle(throttle: Duration) -> Self {
        Self {
            slots: [None; PENDING_SLOTS],
            last_write: [None; PENDING_SLOTS],
            throttle,
            throttled: 0,
        }
    }

    fn slot_of(id: u16) -> Option<usize> {
        if (PENDING_BASE_ID..=PENDING_LAST_ID).contains(&id) {
            Some((id - PENDING_BASE_ID) as usize)
        } else {
            None
        }
    }

    /// Offer a freshly received frame. Returns `true` if it was stored.
    ///
    /// O(1), no decoding: safe to call from interrupt context.
    pub fn offer(&mut self, frame: CanFrame, now: Instant) -> bool {
        let id = frame.raw_id();
        let Some(index) = Self::slot_of(id) else {
            return false;
        };

        if !self.is_due(id, now) {
            self.throttled = self.throttled.wrapping_add(1);
            return false;
        }

        self.slots[index] = Some(frame);
        self.mark_written(id, now);
        true
    }

    /// Whether a frame for `id` would pass the throttle at `now`. Always
    /// `false` for identifiers without a slot.
    pub fn is_due(&self, id: u16, now: Instant) -> bool {
        let Some(index) = Self::slot_of(id) else {
            return false;
        };
        match self.last_write[index] {
            Some(last) => now.saturating_duration_since(last) >= self.throttle,
            None => true,
        }
    }

    /// Start a new throttle window for `id` without parking a frame. Used by
    /// callers that deliver the frame elsewhere and only stamp on success.
    pub fn mark_written(&mut self, id: u16, now: Instant) {
        if let Some(index) = Self::slot_of(id) {
            self.last_write[index] = Some(now);
        }
    }

    /// Remove and return every pending frame. Slot timestamps are kept so the
    /// throttle still applies across consume passes.
    pub fn take_all(&mut self) -> PendingBatch {
        let mut batch = PendingBatch::new();
        for slot in self.slots.iter_mut() {
            if let Some(frame) = slot.take() {
                // capacity equals the slot count
                let _ = batch.push(frame);
            }
        }
        batch
    }

    /// Frame currently parked for `id`, if any.
    pub fn peek(&self, id: u16) -> Option<&CanFrame> {
        Self::slot_of(id).and_then(|index| self.slots[index].as_ref())
    }

    /// Frames refused by the throttle since creation.
    pub fn throttled(&self) -> u32 {
        self.throttled
    }
}

//==================================================================================SHARED
/// [`PendingFrames`] behind a critical-section mutex, shareable between the
/// receive interrupt and the main loop (typically as a `static`).
pub struct SharedPendingFrames {
    inner: Mutex<CriticalSectionRawMutex, RefCell<PendingFrames>>,
}

impl Default for SharedPendingFrames {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedPendingFrames {
    pub const fn new() -> Self {
        Self::with_throttle(Duration::from_millis(FRAME_THROTTLE_MS))
    }

    pub const fn with_throttle(throttle: Duration) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(PendingFrames::with_throttle(throttle))),
        }
    }

    /// Receive-interrupt entry point.
    pub fn on_frame_arrived(&self, frame: CanFrame, now: Instant) -> bool {
        self.inner
            .lock(|pending| pending.borrow_mut().offer(frame, now))
    }

    /// Read-and-clear in a single critical section.
    pub fn take_all(&self) -> PendingBatch {
        self.inner.lock(|pending| pending.borrow_mut().take_all())
    }

    pub fn throttled(&self) -> u32 {
        self.inner.lock(|pending| pending.borrow().throttled())
    }
}
