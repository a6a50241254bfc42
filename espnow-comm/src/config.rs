use smol::channel::{bounded, Receiver, Sender};

use crate::bridge::{ReceiveEvent, SendEvent};

/// Default capacity of an event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 30;

/// Creates a bounded event channel, to pass as a handler in a [CommConfig].
pub fn event_channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    bounded(capacity)
}

/// Configuration given to [EspNowComm::init](crate::EspNowComm::init).
///
/// Both handlers are optional: events with no handler are discarded.
#[derive(Debug, Clone, Default)]
pub struct CommConfig {
    /// Where inbound frames are delivered.
    pub receive_handler: Option<Sender<ReceiveEvent>>,
    /// Where send reports are delivered.
    pub send_handler: Option<Sender<SendEvent>>,
}

impl CommConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_receive_handler(mut self, handler: Sender<ReceiveEvent>) -> Self {
        self.receive_handler = Some(handler);
        self
    }

    pub fn with_send_handler(mut self, handler: Sender<SendEvent>) -> Self {
        self.send_handler = Some(handler);
        self
    }
}
