//! In-memory connectionless medium.
//!
//! Nodes attached to the same [AirMedium] hear each other, with the same rules as an ESP-NOW radio:
//! a bounded peer table, unicast only to registered peers, a send report per destination peer,
//! reception open to any sender. Frames are delivered synchronously inside
//! [send](LinkLayer::send), and the clients are called once the medium is unlocked.
//!
//! A [SimRadio] handle also plays the role of the radio readiness provider
//! ([bring_up](SimRadio::bring_up), [power_down](SimRadio::power_down)) and can inject failures
//! ([fail_next](SimRadio::fail_next)).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use super::device::{LinkLayer, ReceiveClient, SendClient};
use super::peer::PeerInfo;
use crate::bridge::SendStatus;
use crate::{Destination, MacAddress, MAX_CHANNEL, MAX_PAYLOAD_LEN, MAX_PEERS};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("Radio is down.")]
    RadioDown,

    #[error("Protocol is not initialized.")]
    NotInitialized,

    #[error("Peer {} not found.", .0)]
    PeerNotFound(MacAddress),

    #[error("Peer {} already exists.", .0)]
    PeerExists(MacAddress),

    #[error("Peer list is full (max: {} peers).", MAX_PEERS)]
    PeerListFull,

    #[error("Invalid argument. Context: {}", .0)]
    InvalidArgument(String),

    #[error("Out of memory.")]
    NoMemory,

    #[error("Internal radio error.")]
    Internal,
}

/// Radio operations, to target an injected failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SimOperation {
    StationAddress,
    Start,
    Stop,
    SetSendClient,
    SetReceiveClient,
    AddPeer,
    RemovePeer,
    Send,
}

struct Node {
    address: MacAddress,
    ready: bool,
    started: bool,
    reachable: bool,
    peers: Vec<PeerInfo>,
    send_client: Option<Arc<dyn SendClient>>,
    receive_client: Option<Arc<dyn ReceiveClient>>,
    faults: Vec<(SimOperation, SimError)>,
}

impl Node {
    fn new(address: MacAddress) -> Self {
        Self {
            address,
            ready: false,
            started: false,
            reachable: true,
            peers: Vec::new(),
            send_client: None,
            receive_client: None,
            faults: Vec::new(),
        }
    }

    fn take_fault(&mut self, operation: SimOperation) -> Result<(), SimError> {
        match self.faults.iter().position(|(op, _)| *op == operation) {
            Some(i) => Err(self.faults.remove(i).1),
            None => Ok(()),
        }
    }

    fn check_started(&self) -> Result<(), SimError> {
        if self.started {
            Ok(())
        } else {
            Err(SimError::NotInitialized)
        }
    }

    fn reset_protocol(&mut self) {
        self.started = false;
        self.peers.clear();
        self.send_client = None;
        self.receive_client = None;
    }
}

#[derive(Default)]
struct Medium {
    nodes: Vec<Node>,
}

/// Shared medium, every node attached to it can reach the others.
#[derive(Clone, Default)]
pub struct AirMedium {
    inner: Arc<Mutex<Medium>>,
}

impl AirMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a new node with the given station address. Its radio starts powered down.
    pub fn attach(&self, address: MacAddress) -> SimRadio {
        let mut medium = self.lock();
        medium.nodes.push(Node::new(address));
        SimRadio {
            medium: self.clone(),
            id: medium.nodes.len() - 1,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Medium> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle on a node of an [AirMedium].
///
/// Handles are cheap to clone, they all drive the same node.
#[derive(Clone)]
pub struct SimRadio {
    medium: AirMedium,
    id: usize,
}

impl SimRadio {
    pub fn address(&self) -> MacAddress {
        self.with_node(|node| node.address)
    }

    /// Powers the radio up and assigns its address.
    pub fn bring_up(&self) {
        self.with_node(|node| node.ready = true);
    }

    /// Assigns another station address to the node.
    pub fn set_address(&self, address: MacAddress) {
        self.with_node(|node| node.address = address);
    }

    /// Powers the radio down, which also stops the protocol.
    pub fn power_down(&self) {
        self.with_node(|node| {
            node.ready = false;
            node.reset_protocol();
        });
    }

    /// An unreachable node neither receives nor gets its frames acknowledged.
    pub fn set_reachable(&self, reachable: bool) {
        self.with_node(|node| node.reachable = reachable);
    }

    /// The next call of `operation` fails with `error`.
    pub fn fail_next(&self, operation: SimOperation, error: SimError) {
        self.with_node(|node| node.faults.push((operation, error)));
    }

    pub fn is_started(&self) -> bool {
        self.with_node(|node| node.started)
    }

    /// Number of peers in the radio peer table.
    pub fn peer_count(&self) -> usize {
        self.with_node(|node| node.peers.len())
    }

    fn with_node<R>(&self, f: impl FnOnce(&mut Node) -> R) -> R {
        let mut medium = self.medium.lock();
        f(&mut medium.nodes[self.id])
    }

    fn operation<R>(
        &self,
        operation: SimOperation,
        f: impl FnOnce(&mut Node) -> Result<R, SimError>,
    ) -> Result<R, SimError> {
        self.with_node(|node| {
            node.take_fault(operation)?;
            f(node)
        })
    }
}

impl LinkLayer for SimRadio {
    type Error = SimError;

    fn is_ready(&self) -> bool {
        self.with_node(|node| node.ready)
    }

    fn station_address(&self) -> Result<MacAddress, SimError> {
        self.operation(SimOperation::StationAddress, |node| {
            if !node.ready {
                return Err(SimError::RadioDown);
            }
            Ok(node.address)
        })
    }

    fn start(&mut self) -> Result<(), SimError> {
        self.operation(SimOperation::Start, |node| {
            if !node.ready {
                return Err(SimError::RadioDown);
            }
            node.started = true;
            Ok(())
        })
    }

    fn stop(&mut self) -> Result<(), SimError> {
        self.operation(SimOperation::Stop, |node| {
            node.reset_protocol();
            Ok(())
        })
    }

    fn set_send_client(&mut self, client: Box<dyn SendClient>) -> Result<(), SimError> {
        self.operation(SimOperation::SetSendClient, |node| {
            node.check_started()?;
            node.send_client = Some(Arc::from(client));
            Ok(())
        })
    }

    fn set_receive_client(&mut self, client: Box<dyn ReceiveClient>) -> Result<(), SimError> {
        self.operation(SimOperation::SetReceiveClient, |node| {
            node.check_started()?;
            node.receive_client = Some(Arc::from(client));
            Ok(())
        })
    }

    fn add_peer(&mut self, peer: &PeerInfo) -> Result<(), SimError> {
        self.operation(SimOperation::AddPeer, |node| {
            node.check_started()?;
            if peer.channel > MAX_CHANNEL || peer.encrypt {
                return Err(SimError::InvalidArgument(format!("{:?}", peer)));
            }
            if node.peers.iter().any(|p| p.address == peer.address) {
                return Err(SimError::PeerExists(peer.address));
            }
            if node.peers.len() >= MAX_PEERS {
                return Err(SimError::PeerListFull);
            }
            node.peers.push(*peer);
            Ok(())
        })
    }

    fn remove_peer(&mut self, address: &MacAddress) -> Result<(), SimError> {
        self.operation(SimOperation::RemovePeer, |node| {
            node.check_started()?;
            match node.peers.iter().position(|p| p.address == *address) {
                Some(i) => {
                    node.peers.remove(i);
                    Ok(())
                }
                None => Err(SimError::PeerNotFound(*address)),
            }
        })
    }

    fn send(&mut self, destination: Destination, payload: &[u8]) -> Result<(), SimError> {
        let mut medium = self.medium.lock();
        let (source, targets, sender_reachable, send_client) = {
            let node = &mut medium.nodes[self.id];
            node.take_fault(SimOperation::Send)?;
            node.check_started()?;
            if payload.is_empty() || payload.len() > MAX_PAYLOAD_LEN {
                return Err(SimError::InvalidArgument(format!(
                    "payload of {} bytes",
                    payload.len()
                )));
            }
            let targets: Vec<MacAddress> = match destination {
                Destination::AllPeers => node.peers.iter().map(|p| p.address).collect(),
                Destination::Unicast(addr) => {
                    if !node.peers.iter().any(|p| p.address == addr) {
                        return Err(SimError::PeerNotFound(addr));
                    }
                    vec![addr]
                }
            };
            (node.address, targets, node.reachable, node.send_client.clone())
        };

        let mut receptions: Vec<Arc<dyn ReceiveClient>> = Vec::new();
        let mut reports = Vec::with_capacity(targets.len());
        for target in targets {
            let listeners: Vec<&Node> = medium
                .nodes
                .iter()
                .enumerate()
                .filter(|(i, n)| {
                    *i != self.id
                        && sender_reachable
                        && n.started
                        && n.reachable
                        && (target.is_broadcast() || n.address == target)
                })
                .map(|(_, n)| n)
                .collect();
            // Broadcast frames are never acknowledged, the radio reports them as sent.
            let status = if target.is_broadcast() || !listeners.is_empty() {
                SendStatus::Success
            } else {
                SendStatus::Fail
            };
            trace!("{} -> {}: {} listener(s)", source, target, listeners.len());
            receptions.extend(listeners.iter().filter_map(|n| n.receive_client.clone()));
            reports.push((target, status));
        }
        drop(medium);

        debug!(
            "{} sent {} bytes to {} destination(s)",
            source,
            payload.len(),
            reports.len()
        );
        for client in receptions {
            client.receive(source, payload);
        }
        if let Some(client) = send_client {
            for (target, status) in reports {
                client.send_done(target, status);
            }
        }
        Ok(())
    }
}
