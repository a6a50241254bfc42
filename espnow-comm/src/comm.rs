//! Communication context: lifecycle of the protocol, peer registry and send dispatch.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use log::{debug, error, info, warn};

use crate::bridge::{BridgeStats, CallbackBridge};
use crate::config::CommConfig;
use crate::device::{LinkLayer, PeerInfo, PeerRegistry};
use crate::error::CommError;
use crate::{Destination, MacAddress, MAX_PAYLOAD_LEN};

/// Lifecycle of the communication.
///
/// `Uninitialized -> Initializing -> Ready -> Deinitializing -> Uninitialized`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommState {
    Uninitialized,
    Initializing,
    Ready,
    Deinitializing,
}

struct Inner<L> {
    link: L,
    state: CommState,
    registry: PeerRegistry,
    bridge: Option<Arc<CallbackBridge>>,
}

/// Communication over a connectionless radio.
///
/// Every operation takes `&self`: the context can be shared between threads (behind an [Arc])
/// while the radio delivers events from its own context. Its state sits behind a single lock held
/// for the duration of one radio call at most, and never while application code runs.
///
/// The radio must be brought up by its owner before [init](EspNowComm::init): the communication
/// only starts and stops the protocol on top of it.
pub struct EspNowComm<L: LinkLayer> {
    inner: Mutex<Inner<L>>,
    identity: OnceLock<MacAddress>,
}

impl<L: LinkLayer> EspNowComm<L> {
    pub fn new(link: L) -> Self {
        Self {
            inner: Mutex::new(Inner {
                link,
                state: CommState::Uninitialized,
                registry: PeerRegistry::new(),
                bridge: None,
            }),
            identity: OnceLock::new(),
        }
    }

    /// Starts the protocol and registers the event handlers of `config`.
    ///
    /// Captures the device address, starts the protocol and registers the callback bridge, in that
    /// order. The first radio failure aborts the initialization and is returned as is; the protocol
    /// is stopped again if it was already started. A radio without an address, or reporting another
    /// address than the one captured by the first session, is not ready.
    pub fn init(&self, config: CommConfig) -> Result<MacAddress, CommError<L::Error>> {
        let mut inner = self.lock();
        inner.expect_state(CommState::Uninitialized)?;
        if !inner.link.is_ready() {
            error!("Radio not ready, bring it up before initializing the communication.");
            return Err(CommError::RadioNotReady);
        }
        inner.state = CommState::Initializing;

        match inner.bring_up(config, self.identity.get().copied()) {
            Ok(address) => {
                let identity = *self.identity.get_or_init(|| address);
                inner.state = CommState::Ready;
                info!("ESP-NOW communication initialized, device MAC: {}", identity);
                Ok(identity)
            }
            Err(err) => {
                inner.state = CommState::Uninitialized;
                Err(err)
            }
        }
    }

    /// Stops the protocol. Always succeeds: teardown errors are only logged.
    ///
    /// The peer registry is emptied, the event channels are released. [init](EspNowComm::init)
    /// can be called again afterwards.
    pub fn deinit(&self) -> Result<(), CommError<L::Error>> {
        let mut inner = self.lock();
        if inner.state == CommState::Uninitialized {
            debug!("ESP-NOW communication is not initialized, nothing to do.");
            return Ok(());
        }
        inner.state = CommState::Deinitializing;
        if let Err(err) = inner.link.stop() {
            warn!("Stopping the protocol failed: {:?}", err);
        }
        inner.registry.clear();
        inner.bridge = None;
        inner.state = CommState::Uninitialized;
        info!("ESP-NOW communication deinitialized");
        Ok(())
    }

    /// Registers an unencrypted peer on the current channel of the station interface.
    pub fn add_peer(&self, address: MacAddress) -> Result<(), CommError<L::Error>> {
        self.add_peer_info(PeerInfo::new(address))
    }

    /// Registers a peer, making it a valid unicast destination and part of the broadcasts.
    ///
    /// Fails with an invalid argument if the registry is full or the descriptor is unusable, and
    /// rejects a peer already registered.
    pub fn add_peer_info(&self, peer: PeerInfo) -> Result<(), CommError<L::Error>> {
        let mut inner = self.lock();
        inner.expect_state(CommState::Ready)?;
        peer.validate().map_err(|context| CommError::InvalidArgument { context })?;
        if inner.registry.contains(&peer.address) {
            return Err(CommError::DuplicatePeer {
                address: peer.address,
            });
        }
        if inner.registry.is_full() {
            return Err(CommError::RegistryFull);
        }
        inner.link.add_peer(&peer).map_err(|err| {
            error!("Adding peer {} failed: {:?}", peer.address, err);
            CommError::Link(err)
        })?;
        if inner.registry.insert(peer).is_err() {
            // Checked above, under the same lock.
            return Err(CommError::RegistryFull);
        }
        info!("Peer added: {}", peer.address);
        Ok(())
    }

    /// Unregisters a peer. The radio decides whether the address is known.
    pub fn remove_peer(&self, address: MacAddress) -> Result<(), CommError<L::Error>> {
        let mut inner = self.lock();
        inner.expect_state(CommState::Ready)?;
        inner.link.remove_peer(&address).map_err(|err| {
            error!("Removing peer {} failed: {:?}", address, err);
            CommError::Link(err)
        })?;
        if inner.registry.remove(&address).is_none() {
            debug!("Peer {} was not in the registry.", address);
        }
        info!("Peer removed: {}", address);
        Ok(())
    }

    /// Submits a frame of 1 to [MAX_PAYLOAD_LEN] bytes to one peer or to every registered peer.
    ///
    /// Returns once the radio accepted the frame. Whether it was acknowledged is reported later
    /// through the send handler, once per destination peer. Nothing is retried.
    ///
    /// Registration of a unicast destination is not checked here, the radio rejects unknown peers.
    pub fn send(
        &self,
        destination: impl Into<Destination>,
        payload: &[u8],
    ) -> Result<(), CommError<L::Error>> {
        let destination = destination.into();
        if payload.is_empty() || payload.len() > MAX_PAYLOAD_LEN {
            return Err(CommError::PayloadLength { len: payload.len() });
        }
        let mut inner = self.lock();
        inner.expect_state(CommState::Ready)?;
        inner.link.send(destination, payload).map_err(|err| {
            error!("Sending to {:?} failed: {:?}", destination, err);
            CommError::Link(err)
        })
    }

    /// Address of this device, as captured by the first successful [init](EspNowComm::init).
    ///
    /// Never touches the radio.
    pub fn identity(&self) -> Option<MacAddress> {
        self.identity.get().copied()
    }

    pub fn state(&self) -> CommState {
        self.lock().state
    }

    pub fn peer_count(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn is_peer(&self, address: &MacAddress) -> bool {
        self.lock().registry.contains(address)
    }

    /// Snapshot of the registered peers.
    pub fn peers(&self) -> Vec<PeerInfo> {
        self.lock().registry.iter().copied().collect()
    }

    /// Event counters of the current session, if initialized.
    pub fn bridge_stats(&self) -> Option<BridgeStats> {
        self.lock().bridge.as_ref().map(|bridge| bridge.stats())
    }

    /// Gives the radio back. The protocol is stopped first if it is running.
    pub fn into_link(self) -> L {
        let _ = self.deinit();
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .link
    }

    fn lock(&self) -> MutexGuard<'_, Inner<L>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: LinkLayer> Inner<L> {
    fn expect_state(&self, expected: CommState) -> Result<(), CommError<L::Error>> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CommError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn bring_up(
        &mut self,
        config: CommConfig,
        known: Option<MacAddress>,
    ) -> Result<MacAddress, CommError<L::Error>> {
        let address = self.link.station_address().map_err(|err| {
            error!("Failed to get MAC address: {:?}", err);
            CommError::Link(err)
        })?;
        if address.is_zero() {
            error!("Radio has no device address assigned.");
            return Err(CommError::RadioNotReady);
        }
        // The identity is fixed by the first session.
        if let Some(known) = known.filter(|known| *known != address) {
            error!("Radio now reports {} as device address, expected {}.", address, known);
            return Err(CommError::RadioNotReady);
        }
        self.link.start().map_err(|err| {
            error!("Starting the protocol failed: {:?}", err);
            CommError::Link(err)
        })?;

        let bridge = Arc::new(CallbackBridge::new(
            config.receive_handler,
            config.send_handler,
        ));
        let registered = self
            .link
            .set_send_client(Box::new(bridge.clone()))
            .and_then(|_| self.link.set_receive_client(Box::new(bridge.clone())));
        if let Err(err) = registered {
            error!("Registering the callbacks failed: {:?}", err);
            if let Err(stop_err) = self.link.stop() {
                warn!("Stopping the protocol failed: {:?}", stop_err);
            }
            return Err(CommError::Link(err));
        }
        self.bridge = Some(bridge);
        self.registry.clear();
        Ok(address)
    }
}
