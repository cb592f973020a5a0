//! Access trait through which the schema engine reads and writes physical
//! values without knowing the concrete structure behind them.
use crate::core::Signal;

//==================================================================================SIGNAL_ACCESS
/// Implemented by every structure the engine decodes into or encodes from.
///
/// Values cross this boundary in physical units (`raw × scale + offset`), as
/// `f32`. Implementors narrow to their own field types; the engine only hands
/// over values that already fit the raw field.
pub trait SignalAccess {
    /// Current physical value of `signal`, or `None` if the structure does not carry it.
    fn signal(&self, signal: Signal) -> Option<f32>;

    /// Store a decoded physical value. Returns `None` if the structure does not carry it.
    fn set_signal(&mut self, signal: Signal, value: f32) -> Option<()>;
}
