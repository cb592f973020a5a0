//! Schema-driven payload codec: bit reader/writer primitives, the generic
//! decode/encode engine, and the access trait state structures implement.
pub mod bits;
pub mod engine;
pub mod traits;
