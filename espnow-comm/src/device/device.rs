use std::fmt::Debug;
use std::sync::Arc;

use super::peer::PeerInfo;
use crate::bridge::SendStatus;
use crate::{Destination, MacAddress};

/// Connectionless radio primitive (ESP-NOW like), plus the readiness of the radio it runs on.
///
/// The radio itself (channel, association, addressing) is owned by whoever provides the
/// implementation: [is_ready](LinkLayer::is_ready) is the only thing the communication asks about it.
/// Every other method maps one-to-one to a call of the underlying driver and must report its
/// failures unmodified.
pub trait LinkLayer {
    type Error: Debug;

    /// Is the radio up, with a station address assigned?
    fn is_ready(&self) -> bool;

    /// Station address of this device.
    fn station_address(&self) -> Result<MacAddress, Self::Error>;

    /// Starts the connectionless protocol.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Stops the protocol. Registered clients and peers are forgotten.
    fn stop(&mut self) -> Result<(), Self::Error>;

    fn set_send_client(&mut self, client: Box<dyn SendClient>) -> Result<(), Self::Error>;
    fn set_receive_client(&mut self, client: Box<dyn ReceiveClient>) -> Result<(), Self::Error>;

    fn add_peer(&mut self, peer: &PeerInfo) -> Result<(), Self::Error>;
    fn remove_peer(&mut self, address: &MacAddress) -> Result<(), Self::Error>;

    /// Submits one frame. Returns once the frame is queued, the outcome is reported later to the
    /// [SendClient], once per destination peer.
    fn send(&mut self, destination: Destination, payload: &[u8]) -> Result<(), Self::Error>;
}

/// Receiver of send reports.
///
/// Called from the radio context: implementations must not block.
pub trait SendClient: Send + Sync {
    fn send_done(&self, destination: MacAddress, status: SendStatus);
}

/// Receiver of inbound frames, whoever sent them.
///
/// Called from the radio context: implementations must not block.
pub trait ReceiveClient: Send + Sync {
    fn receive(&self, source: MacAddress, payload: &[u8]);
}

impl<T: SendClient + ?Sized> SendClient for Arc<T> {
    fn send_done(&self, destination: MacAddress, status: SendStatus) {
        (**self).send_done(destination, status)
    }
}

impl<T: ReceiveClient + ?Sized> ReceiveClient for Arc<T> {
    fn receive(&self, source: MacAddress, payload: &[u8]) {
        (**self).receive(source, payload)
    }
}
