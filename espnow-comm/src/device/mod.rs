//! Boundary with the radio: the connectionless link-layer primitive the communication runs on,
//! its peer descriptors, and an in-memory medium to run nodes without hardware.

pub mod device;
pub mod peer;
pub mod sim;

pub use device::*;
pub use peer::{Interface, PeerInfo, PeerRegistry};
