use crate::{MacAddress, MAX_CHANNEL, MAX_PEERS};

/// Radio interface a peer is reached through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Interface {
    #[default]
    Station,
    AccessPoint,
}

/// Peer descriptor, as submitted to the radio peer table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PeerInfo {
    /// Address of the peer, the station or soft-AP address of the remote device.
    pub address: MacAddress,
    /// Channel used to talk to the peer. 0 means the channel the interface is currently on,
    /// otherwise it must be that channel.
    pub channel: u8,
    pub interface: Interface,
    /// Encryption is not supported, this must stay `false`.
    pub encrypt: bool,
}

impl PeerInfo {
    /// Unencrypted peer on the current channel of the station interface.
    pub fn new(address: MacAddress) -> Self {
        Self {
            address,
            channel: 0,
            interface: Interface::Station,
            encrypt: false,
        }
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_interface(mut self, interface: Interface) -> Self {
        self.interface = interface;
        self
    }

    /// Checks the descriptor can be submitted to the radio, returns why not otherwise.
    pub fn validate(&self) -> Result<(), String> {
        if self.channel > MAX_CHANNEL {
            return Err(format!(
                "Peer channel {} out of range (max: {}, 0 for current).",
                self.channel, MAX_CHANNEL
            ));
        }
        if self.encrypt {
            return Err(format!("Encrypted peers are not supported ({}).", self.address));
        }
        Ok(())
    }
}

/// Bounded set of the peers registered with the radio.
///
/// Its length is the peer count: it never exceeds [MAX_PEERS] and cannot underflow.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: heapless::Vec<PeerInfo, MAX_PEERS>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            peers: heapless::Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.peers.is_full()
    }

    pub fn contains(&self, address: &MacAddress) -> bool {
        self.get(address).is_some()
    }

    pub fn get(&self, address: &MacAddress) -> Option<&PeerInfo> {
        self.peers.iter().find(|peer| peer.address == *address)
    }

    /// Records a peer. Gives the peer back if the registry is full.
    pub fn insert(&mut self, peer: PeerInfo) -> Result<(), PeerInfo> {
        self.peers.push(peer)
    }

    pub fn remove(&mut self, address: &MacAddress) -> Option<PeerInfo> {
        let i = self.peers.iter().position(|peer| peer.address == *address)?;
        Some(self.peers.swap_remove(i))
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerInfo> {
        self.peers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> MacAddress {
        MacAddress::new([0x02, 0, 0, 0, 0, n])
    }

    #[test]
    fn registry_is_bounded() {
        let mut registry = PeerRegistry::new();
        for n in 0..MAX_PEERS as u8 {
            assert!(registry.insert(PeerInfo::new(addr(n))).is_ok());
        }
        assert!(registry.is_full());
        let extra = PeerInfo::new(addr(100));
        assert_eq!(registry.insert(extra), Err(extra));
        assert_eq!(registry.len(), MAX_PEERS);
    }

    #[test]
    fn remove_unknown_keeps_count() {
        let mut registry = PeerRegistry::new();
        assert_eq!(registry.remove(&addr(1)), None);
        assert!(registry.is_empty());

        registry.insert(PeerInfo::new(addr(1))).unwrap();
        registry.insert(PeerInfo::new(addr(2))).unwrap();
        assert_eq!(registry.remove(&addr(1)).map(|p| p.address), Some(addr(1)));
        assert_eq!(registry.remove(&addr(1)), None);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&addr(2)));
    }

    #[test]
    fn descriptor_validation() {
        assert!(PeerInfo::new(addr(1)).validate().is_ok());
        assert!(PeerInfo::new(addr(1)).with_channel(MAX_CHANNEL).validate().is_ok());
        assert!(PeerInfo::new(addr(1)).with_channel(MAX_CHANNEL + 1).validate().is_err());
        let mut encrypted = PeerInfo::new(addr(1));
        encrypted.encrypt = true;
        assert!(encrypted.validate().is_err());
    }
}
