mod common;

use common::{mac, ready_node};
use espnow_comm::device::sim::{AirMedium, SimError};
use espnow_comm::{CommError, ErrorKind, Interface, PeerInfo, MAX_PEERS};

#[test]
fn registry_holds_at_most_twenty_peers() {
    let medium = AirMedium::new();
    let node = ready_node(&medium, 0);

    for n in 1..=MAX_PEERS as u8 {
        node.comm.add_peer(mac(n)).unwrap();
        assert_eq!(node.comm.peer_count(), n as usize);
    }
    let err = node.comm.add_peer(mac(100)).unwrap_err();
    assert!(matches!(err, CommError::RegistryFull));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(node.comm.peer_count(), MAX_PEERS);
    assert_eq!(node.radio.peer_count(), MAX_PEERS);

    // Room again once a peer leaves.
    node.comm.remove_peer(mac(1)).unwrap();
    node.comm.add_peer(mac(100)).unwrap();
    assert_eq!(node.comm.peer_count(), MAX_PEERS);
}

#[test]
fn removing_an_unknown_peer_is_a_link_error() {
    let medium = AirMedium::new();
    let node = ready_node(&medium, 0);
    node.comm.add_peer(mac(1)).unwrap();

    let err = node.comm.remove_peer(mac(2)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnderlyingLink);
    assert_eq!(err.link_error(), Some(&SimError::PeerNotFound(mac(2))));
    assert_eq!(node.comm.peer_count(), 1);

    node.comm.remove_peer(mac(1)).unwrap();
    assert_eq!(node.comm.peer_count(), 0);
    let err = node.comm.remove_peer(mac(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnderlyingLink);
    assert_eq!(node.comm.peer_count(), 0);
}

#[test]
fn duplicate_add_is_rejected_before_the_radio() {
    let medium = AirMedium::new();
    let node = ready_node(&medium, 0);
    node.comm.add_peer(mac(1)).unwrap();

    let err = node.comm.add_peer(mac(1)).unwrap_err();
    assert!(matches!(err, CommError::DuplicatePeer { address } if address == mac(1)));
    assert_eq!(node.comm.peer_count(), 1);
    assert_eq!(node.radio.peer_count(), 1);
}

#[test]
fn peer_descriptors_are_kept() {
    let medium = AirMedium::new();
    let node = ready_node(&medium, 0);
    let pinned = PeerInfo::new(mac(2))
        .with_channel(11)
        .with_interface(Interface::AccessPoint);
    node.comm.add_peer(mac(1)).unwrap();
    node.comm.add_peer_info(pinned).unwrap();

    let peers = node.comm.peers();
    assert_eq!(peers.len(), 2);
    assert!(peers.contains(&PeerInfo::new(mac(1))));
    assert!(peers.contains(&pinned));
    assert!(peers.iter().all(|peer| !peer.encrypt));
}

#[test]
fn encrypted_peers_are_refused() {
    let medium = AirMedium::new();
    let node = ready_node(&medium, 0);
    let mut peer = PeerInfo::new(mac(1));
    peer.encrypt = true;

    let err = node.comm.add_peer_info(peer).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(node.comm.peer_count(), 0);
}

#[test]
fn malformed_addresses_are_invalid_arguments() {
    let short: &[u8] = &[0x24, 0x6F, 0x28];
    let err: CommError<SimError> = espnow_comm::MacAddress::try_from(short).unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
