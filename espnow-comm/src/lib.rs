//! Connectionless peer-to-peer messaging between embedded nodes sharing a radio.
//!
//! The crate sits on top of a raw connectionless radio primitive (ESP-NOW like, see
//! [LinkLayer](device::LinkLayer)) and provides:
//! - the lifecycle of the messaging protocol ([EspNowComm::init], [EspNowComm::deinit]),
//! - a bounded peer registry ([EspNowComm::add_peer], [EspNowComm::remove_peer]),
//! - unicast and broadcast dispatch ([EspNowComm::send]),
//! - asynchronous event delivery through bounded channels (see [bridge]).
//!
//! ## Usages
//! ```rust,ignore
//! let medium = AirMedium::new();
//! let radio = medium.attach("24:6f:28:00:00:01".parse()?);
//! radio.bring_up();
//!
//! let (rx_tx, rx_events) = event_channel(DEFAULT_EVENT_CAPACITY);
//! let comm = EspNowComm::new(radio);
//! let me = comm.init(CommConfig::new().with_receive_handler(rx_tx))?;
//! comm.add_peer(remote)?;
//! comm.send(remote, b"HELO")?;
//! ```

pub mod address;
pub mod bridge;
pub mod comm;
pub mod config;
pub mod device;
pub mod error;

pub use address::MacAddress;
pub use bridge::{BridgeStats, ReceiveEvent, SendEvent, SendStatus};
pub use comm::{CommState, EspNowComm};
pub use config::{event_channel, CommConfig, DEFAULT_EVENT_CAPACITY};
pub use device::{Interface, LinkLayer, PeerInfo};
pub use error::{AddressError, CommError, ErrorKind};

/// Length of a link-layer (MAC) address in bytes.
pub const ADDRESS_LEN: usize = 6;

/// Maximum number of peers the radio can hold in its peer table.
pub const MAX_PEERS: usize = 20;

/// Maximum number of encrypted peers supported by the radio.
///
/// Encryption is not supported by this crate, the constant is only kept as documentation of the
/// radio limits.
pub const MAX_ENCRYPTED_PEERS: usize = 7;

/// Maximum payload of a single frame in bytes.
///
/// v1.0 radios accept 250 bytes, v2.0 radios up to 1470 bytes. Older peers truncate anything above
/// 250 bytes, so this is the limit used for compatibility.
pub const MAX_PAYLOAD_LEN: usize = 250;

/// Highest Wi-Fi channel a peer can be pinned to. Channel 0 means "current channel".
pub const MAX_CHANNEL: u8 = 14;

/// Destination of an outbound frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Every peer registered in the radio peer table, with a single submission.
    AllPeers,
    /// One specific peer, which must be registered.
    Unicast(MacAddress),
}

impl Destination {
    pub fn address(&self) -> Option<MacAddress> {
        match self {
            Destination::AllPeers => None,
            Destination::Unicast(addr) => Some(*addr),
        }
    }
}

impl From<MacAddress> for Destination {
    fn from(addr: MacAddress) -> Self {
        Destination::Unicast(addr)
    }
}

/// `None` stands for every registered peer.
impl From<Option<MacAddress>> for Destination {
    fn from(addr: Option<MacAddress>) -> Self {
        match addr {
            Some(addr) => Destination::Unicast(addr),
            None => Destination::AllPeers,
        }
    }
}
