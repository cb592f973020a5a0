//! Minimal abstractions over a CAN controller. The polling traits serve the
//! cooperative main loop; the async trait serves executor-driven receivers.
use crate::error::SendError;
use crate::protocol::transport::can_frame::CanFrame;
use futures_util::Future;

/// Non-blocking receive side of a bus.
pub trait FrameReceiver {
    type Error: core::fmt::Debug;
    /// Take the next pending frame. `Ok(None)` is the normal idle outcome
    /// ("no message"), not an error. Never waits.
    fn try_receive(&mut self) -> Result<Option<CanFrame>, Self::Error>;
}

/// Non-blocking transmit side of a bus.
pub trait FrameTransmitter {
    type Error: core::fmt::Debug;
    /// Queue a frame for transmission. [`SendError::Busy`] means every
    /// transmit buffer is occupied and the caller should retry later.
    fn try_send(&mut self, frame: &CanFrame) -> Result<(), SendError<Self::Error>>;
}

/// Contract to receive CAN frames asynchronously.
pub trait AsyncCanBus {
    type Error: core::fmt::Debug;
    /// Retrieve the next available frame. Asynchronously waits until data arrives.
    fn recv<'a>(&'a mut self) -> impl Future<Output = Result<CanFrame, Self::Error>> + 'a;
}
