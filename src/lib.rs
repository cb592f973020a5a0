//! `dashlink` library: the telemetry path of a race-car dashboard in a
//! `no_std` environment. CAN frames from the ECU are decoded through static
//! frame schemas into one engine-state snapshot, throttled when they arrive
//! from interrupt context, and packed into capacity-bounded LoRa packets
//! together with queued GPS samples.
#![no_std]
#[cfg(test)]
extern crate std;
//==================================================================================
/// Data contract between the static frame schemas and the codec engine.
pub mod core;
/// Error types for every layer (bit codec, decode, transport, telemetry, framing).
pub mod error;
/// Low-level building blocks: bit reader/writer, schema engine, serial framing.
pub mod infra;
/// Frame schemas, bus/radio transport, engine state, aggregation and telemetry.
pub mod protocol;
//==================================================================================
