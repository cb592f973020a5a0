//! Abstraction traits used by the transport layer (CAN bus, radio).
pub mod can_bus;
pub mod radio;
