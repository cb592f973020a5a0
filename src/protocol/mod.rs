//! Dashboard-side components of the telemetry pipeline: frame schemas,
//! CAN transport and throttling, engine state aggregation, the LoRa
//! telemetry packetizer, the raw frame relay and the bench sweep generator.
pub mod aggregator;
pub mod generator;
pub mod messages;
pub mod relay;
pub mod state;
pub mod telemetry;
pub mod transport;
