/// Test doubles for the CAN bus and the LoRa modem used by integration tests.
use dashlink::error::SendError;
use dashlink::protocol::transport::{
    can_frame::CanFrame,
    traits::{
        can_bus::{AsyncCanBus, FrameReceiver, FrameTransmitter},
        radio::{Radio, RadioState},
    },
    LORA_FIFO_SIZE,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

#[derive(Clone)]
#[allow(dead_code)]
/// Asynchronous bus endpoint: what one side sends, the other receives.
pub struct MockCanBus {
    tx: mpsc::UnboundedSender<CanFrame>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<CanFrame>>>,
}

#[allow(dead_code)]
impl MockCanBus {
    /// Construct a pair of interconnected buses (DUT ↔ host).
    pub fn create_pair() -> (Self, Self) {
        let (dut_tx, host_rx) = mpsc::unbounded_channel();
        let (host_tx, dut_rx) = mpsc::unbounded_channel();

        let dut_bus = Self {
            tx: dut_tx,
            rx: Arc::new(Mutex::new(dut_rx)),
        };

        let host_bus = Self {
            tx: host_tx,
            rx: Arc::new(Mutex::new(host_rx)),
        };

        (dut_bus, host_bus)
    }

    /// Put a frame on the wire towards the other endpoint.
    pub fn inject(&self, frame: CanFrame) -> Result<(), ()> {
        self.tx.send(frame).map_err(|_| ())
    }
}

impl AsyncCanBus for MockCanBus {
    type Error = ();

    /// Fails once the other endpoint has been dropped.
    async fn recv(&mut self) -> Result<CanFrame, Self::Error> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(())
    }
}

#[derive(Default)]
#[allow(dead_code)]
/// Polled bus: transmitted frames are queued and read back in order.
///
/// `tx_capacity` simulates the controller's transmit buffers: once that many
/// frames are queued, `try_send` answers busy.
pub struct LoopbackBus {
    pub frames: VecDeque<CanFrame>,
    pub tx_capacity: Option<usize>,
}

#[allow(dead_code)]
impl LoopbackBus {
    pub fn with_capacity(tx_capacity: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            tx_capacity: Some(tx_capacity),
        }
    }
}

impl FrameReceiver for LoopbackBus {
    type Error = ();

    fn try_receive(&mut self) -> Result<Option<CanFrame>, Self::Error> {
        Ok(self.frames.pop_front())
    }
}

impl FrameTransmitter for LoopbackBus {
    type Error = ();

    fn try_send(&mut self, frame: &CanFrame) -> Result<(), SendError<Self::Error>> {
        if self.tx_capacity.is_some_and(|cap| self.frames.len() >= cap) {
            return Err(SendError::Busy);
        }
        self.frames.push_back(*frame);
        Ok(())
    }
}

#[allow(dead_code)]
/// Packet radio that records every packet and stays busy until `complete`.
pub struct MockRadio {
    pub state: RadioState,
    pub sent: Vec<Vec<u8>>,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn idle() -> Self {
        Self {
            state: RadioState::Idle,
            sent: Vec::new(),
        }
    }

    /// Simulate the modem's "transmit done" interrupt.
    pub fn complete(&mut self) {
        self.state = RadioState::Idle;
    }
}

impl Radio for MockRadio {
    type Error = ();

    fn max_payload(&self) -> usize {
        LORA_FIFO_SIZE
    }

    fn poll(&mut self) -> RadioState {
        self.state
    }

    fn start_transmit(&mut self, packet: &[u8]) -> Result<(), Self::Error> {
        self.sent.push(packet.to_vec());
        self.state = RadioState::Transmitting;
        Ok(())
    }
}
