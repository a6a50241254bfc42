use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;
use crate::ADDRESS_LEN;

/// Link-layer (MAC) address of a node.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddress([u8; ADDRESS_LEN]);

impl MacAddress {
    /// Address every node listens to.
    pub const BROADCAST: MacAddress = MacAddress([0xFF; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn octets(&self) -> [u8; ADDRESS_LEN] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// An all-zero address, what an uninitialized radio reports.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDRESS_LEN]
    }
}

impl From<[u8; ADDRESS_LEN]> for MacAddress {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<MacAddress> for [u8; ADDRESS_LEN] {
    fn from(addr: MacAddress) -> Self {
        addr.0
    }
}

impl TryFrom<&[u8]> for MacAddress {
    type Error = AddressError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let octets: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength { len: bytes.len() })?;
        Ok(Self(octets))
    }
}

impl AsRef<[u8]> for MacAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({})", self)
    }
}

/// Parses `aa:bb:cc:dd:ee:ff` (or `aa-bb-cc-dd-ee-ff`).
impl FromStr for MacAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; ADDRESS_LEN];
        let mut n = 0;
        for part in s.split(|c| c == ':' || c == '-') {
            if n == ADDRESS_LEN {
                return Err(AddressError::Malformed { input: s.to_owned() });
            }
            if part.len() != 2 {
                return Err(AddressError::Malformed { input: s.to_owned() });
            }
            octets[n] = u8::from_str_radix(part, 16)
                .map_err(|_| AddressError::Malformed { input: s.to_owned() })?;
            n += 1;
        }
        if n != ADDRESS_LEN {
            return Err(AddressError::Malformed { input: s.to_owned() });
        }
        Ok(Self(octets))
    }
}
