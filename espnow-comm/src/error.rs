use std::fmt::Debug;

use crate::comm::CommState;
use crate::{MacAddress, MAX_PAYLOAD_LEN, MAX_PEERS};

/// Coarse classification of a [CommError], for callers that only need to know who is at fault.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed something unusable (bad length, full registry, bad address...).
    InvalidArgument,
    /// The peer is already registered.
    Duplicate,
    /// The operation is not allowed in the current lifecycle state.
    State,
    /// The radio rejected the operation, its error is carried unmodified.
    UnderlyingLink,
}

#[derive(thiserror::Error, Debug)]
pub enum CommError<E>
where
    E: Debug,
{
    #[error("Invalid argument. Context: {}", .context)]
    InvalidArgument { context: String },

    #[error("Invalid address.")]
    InvalidAddress(#[from] AddressError),

    #[error("Invalid payload length (is: {}B, expected: 1..={}B)!", .len, MAX_PAYLOAD_LEN)]
    PayloadLength { len: usize },

    #[error("Peer registry is full (max: {} peers)!", MAX_PEERS)]
    RegistryFull,

    #[error("Peer {} is already registered.", .address)]
    DuplicatePeer { address: MacAddress },

    #[error("Invalid state (expected: {:?}, is: {:?}).", .expected, .actual)]
    InvalidState {
        expected: CommState,
        actual: CommState,
    },

    #[error("Radio is not ready, it must be brought up before initializing the communication.")]
    RadioNotReady,

    #[error("Underlying link error: {:?}", .0)]
    Link(E),
}

impl<E: Debug> CommError<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommError::InvalidArgument { .. }
            | CommError::InvalidAddress(_)
            | CommError::PayloadLength { .. }
            | CommError::RegistryFull => ErrorKind::InvalidArgument,
            CommError::DuplicatePeer { .. } => ErrorKind::Duplicate,
            CommError::InvalidState { .. } | CommError::RadioNotReady => ErrorKind::State,
            CommError::Link(_) => ErrorKind::UnderlyingLink,
        }
    }

    /// The radio error, if the radio is the one that failed.
    pub fn link_error(&self) -> Option<&E> {
        match self {
            CommError::Link(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must be exactly 6 bytes long (is: {}B).", .len)]
    InvalidLength { len: usize },

    #[error("Malformed address {:?}, expected aa:bb:cc:dd:ee:ff.", .input)]
    Malformed { input: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        type Error = CommError<&'static str>;
        assert_eq!(Error::RegistryFull.kind(), ErrorKind::InvalidArgument);
        assert_eq!(Error::PayloadLength { len: 251 }.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            Error::from(AddressError::InvalidLength { len: 0 }).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            Error::DuplicatePeer { address: MacAddress::BROADCAST }.kind(),
            ErrorKind::Duplicate
        );
        assert_eq!(Error::RadioNotReady.kind(), ErrorKind::State);
        assert_eq!(Error::Link("nope").kind(), ErrorKind::UnderlyingLink);
        assert_eq!(Error::Link("nope").link_error(), Some(&"nope"));
        assert_eq!(Error::RegistryFull.link_error(), None);
    }

    #[test]
    fn messages() {
        let err: CommError<()> = CommError::PayloadLength { len: 251 };
        assert_eq!(
            err.to_string(),
            "Invalid payload length (is: 251B, expected: 1..=250B)!"
        );
        let err: CommError<()> = CommError::DuplicatePeer {
            address: MacAddress::new([1, 2, 3, 4, 5, 6]),
        };
        assert_eq!(err.to_string(), "Peer 01:02:03:04:05:06 is already registered.");
    }
}
