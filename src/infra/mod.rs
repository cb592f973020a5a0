//! Infrastructure layer: bit-level codec, schema-driven engine, and the
//! serial framing used between the base-station radio and its host.
pub mod codec;
pub mod framing;
