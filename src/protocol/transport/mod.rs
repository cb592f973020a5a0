//! Frame transport layer: the CAN frame representation, bus and radio
//! abstraction traits, the interrupt-side throttle buffer, and the async
//! forwarder used on executors without a receive interrupt.
//!
//! ## Timing and sizing constants
//!
//! Defaults shared by the aggregator, the packetizer and the relay. Runtime
//! overrides go through `AggregatorConfig` and `PacketizerConfig`.

pub mod can_frame;
pub mod forwarder;
pub mod throttle;
pub mod traits;

/// Minimal spacing between two accepted writes to the same pending slot (ms).
///
/// The ECU broadcasts every base frame at 50-100 Hz; a dashboard only needs
/// the latest value inside each window. Frames arriving sooner are dropped in
/// interrupt context before any decode work is spent on them.
pub const FRAME_THROTTLE_MS: u64 = 10;

/// Silence tolerated before the link is counted as missed (ms).
///
/// Checked once per window: a second miss needs another full window of
/// silence, whatever the polling rate.
pub const LIVENESS_WINDOW_MS: u64 = 1000;

/// Consecutive missed windows after which consumers treat the link as down.
///
/// The aggregator only exposes the counter; switching the display to a
/// "no data" page is the renderer's decision.
pub const LINK_DOWN_AFTER_MISSES: u16 = 3;

/// Upper bound on frames drained by one aggregator update.
///
/// Keeps a saturated bus from holding the main loop inside a single update.
pub const MAX_FRAMES_PER_UPDATE: usize = 16;

/// SX127x FIFO size shared by header and payload (bytes).
pub const LORA_FIFO_SIZE: usize = 255;

/// Four-byte RadioHead header (to, from, id, flags) prepended to every packet.
///
/// Receivers built on RadioHead discard packets without it, so it is kept
/// even though no addressing is done.
pub const RADIOHEAD_HEADER: [u8; 4] = [0xFF, 0xFF, 0x00, 0x00];

/// Capacity of each GPS/speed sample ring.
pub const SAMPLE_QUEUE_CAPACITY: usize = 32;

/// Raw CAN frames batched into one radio packet by the relay node.
pub const RELAY_FRAMES_PER_PACKET: usize = 3;

/// First identifier covered by the pending-frame buffer.
pub const PENDING_BASE_ID: u16 = 508;

/// Last identifier covered by the pending-frame buffer.
pub const PENDING_LAST_ID: u16 = 519;

/// Number of slots in the pending-frame buffer.
pub const PENDING_SLOTS: usize = (PENDING_LAST_ID - PENDING_BASE_ID + 1) as usize;
