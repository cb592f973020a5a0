//! Radio telemetry: channel identifiers, value sources, the sample rings fed
//! by the GPS node, and the packetizer that fits all of it into one
//! capacity-bounded LoRa packet.
pub mod channels;
pub mod packetizer;
pub mod record;
pub mod samples;
pub mod source;
