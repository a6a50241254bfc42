//! Bridge between the radio callbacks and the application.
//!
//! The radio reports send outcomes and inbound frames from its own context. The bridge turns each
//! of them into an event pushed, without blocking, into the bounded channel the application gave
//! in its [CommConfig](crate::CommConfig). The application consumes them on its own schedule.
//!
//! The bridge does no filtering and no retry: a frame from an unregistered sender is delivered like
//! any other, an event with no channel configured is discarded, an event that does not fit in a
//! full channel is dropped (and counted, see [BridgeStats]).

use std::sync::atomic::{AtomicUsize, Ordering};

use log::{trace, warn};
use smol::channel::{Sender, TrySendError};

use crate::device::{ReceiveClient, SendClient};
use crate::MacAddress;

/// Outcome of a submitted frame, at the link layer only.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SendStatus {
    /// The peer acknowledged the frame. Says nothing about what the application did with it.
    Success,
    /// No acknowledgment after the radio retries, the peer is most likely offline or out of range.
    Fail,
}

impl SendStatus {
    pub fn is_success(&self) -> bool {
        *self == SendStatus::Success
    }
}

/// Frame received from `source`, registered peer or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveEvent {
    pub source: MacAddress,
    pub payload: Vec<u8>,
}

/// Send report for one frame submitted to `destination`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SendEvent {
    pub destination: MacAddress,
    pub status: SendStatus,
}

/// Counters of the events seen by a bridge.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Inbound frames reported by the radio.
    pub received: usize,
    /// Send reports from the radio.
    pub send_reports: usize,
    /// Events lost because their channel was full or closed.
    pub dropped: usize,
}

#[derive(Debug)]
pub struct CallbackBridge {
    receive_handler: Option<Sender<ReceiveEvent>>,
    send_handler: Option<Sender<SendEvent>>,
    received: AtomicUsize,
    send_reports: AtomicUsize,
    dropped: AtomicUsize,
}

impl CallbackBridge {
    pub fn new(
        receive_handler: Option<Sender<ReceiveEvent>>,
        send_handler: Option<Sender<SendEvent>>,
    ) -> Self {
        Self {
            receive_handler,
            send_handler,
            received: AtomicUsize::new(0),
            send_reports: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            received: self.received.load(Ordering::Relaxed),
            send_reports: self.send_reports.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn forward<T>(&self, handler: &Option<Sender<T>>, event: T) {
        let Some(sender) = handler else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Event channel full, event dropped.");
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!("Event channel closed, event dropped.");
            }
        }
    }
}

impl SendClient for CallbackBridge {
    fn send_done(&self, destination: MacAddress, status: SendStatus) {
        self.send_reports.fetch_add(1, Ordering::Relaxed);
        trace!("Send report for {}: {:?}", destination, status);
        self.forward(&self.send_handler, SendEvent { destination, status });
    }
}

impl ReceiveClient for CallbackBridge {
    fn receive(&self, source: MacAddress, payload: &[u8]) {
        self.received.fetch_add(1, Ordering::Relaxed);
        trace!("Received {} bytes from {}", payload.len(), source);
        self.forward(
            &self.receive_handler,
            ReceiveEvent {
                source,
                payload: payload.to_vec(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol::channel::bounded;

    const PEER: MacAddress = MacAddress::new([0x24, 0x6F, 0x28, 0, 0, 1]);

    #[test]
    fn forwards_to_configured_handlers() {
        let (rx_tx, rx) = bounded(4);
        let (tx_tx, tx) = bounded(4);
        let bridge = CallbackBridge::new(Some(rx_tx), Some(tx_tx));

        bridge.receive(PEER, b"HELO");
        bridge.send_done(PEER, SendStatus::Fail);

        assert_eq!(
            rx.try_recv().unwrap(),
            ReceiveEvent {
                source: PEER,
                payload: b"HELO".to_vec()
            }
        );
        assert_eq!(
            tx.try_recv().unwrap(),
            SendEvent {
                destination: PEER,
                status: SendStatus::Fail
            }
        );
        assert_eq!(
            bridge.stats(),
            BridgeStats {
                received: 1,
                send_reports: 1,
                dropped: 0
            }
        );
    }

    #[test]
    fn missing_handlers_are_silent() {
        let bridge = CallbackBridge::new(None, None);
        bridge.receive(PEER, b"HELO");
        bridge.send_done(PEER, SendStatus::Success);
        assert_eq!(bridge.stats().dropped, 0);
        assert_eq!(bridge.stats().received, 1);
    }

    #[test]
    fn full_channel_drops_without_blocking() {
        let (rx_tx, rx) = bounded(2);
        let bridge = CallbackBridge::new(Some(rx_tx), None);
        for i in 0..5u8 {
            bridge.receive(PEER, &[i]);
        }
        assert_eq!(bridge.stats().dropped, 3);
        assert_eq!(rx.try_recv().unwrap().payload, vec![0]);
        assert_eq!(rx.try_recv().unwrap().payload, vec![1]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_channel_drops() {
        let (tx_tx, tx) = bounded(2);
        drop(tx);
        let bridge = CallbackBridge::new(None, Some(tx_tx));
        bridge.send_done(PEER, SendStatus::Success);
        assert_eq!(bridge.stats().dropped, 1);
    }
}
