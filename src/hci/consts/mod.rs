mod events;

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use num_enum::{FromPrimitive, IntoPrimitive};

pub use events::*;
use crate::hci::buffer::ReceiveBuffer;
use crate::hci::Error;
use crate::hci::events::FromEvent;

/// Bluetooth Core Specification versions ([Assigned Numbers] Section 2.1).
#[derive(Clone, Copy, Default, Eq, Ord, PartialEq, PartialOrd, FromPrimitive, IntoPrimitive)]
#[non_exhaustive]
#[repr(u8)]
pub enum CoreVersion {
    V1_0 = 0x00,
    V1_1 = 0x01,
    V1_2 = 0x02,
    V2_0 = 0x03,
    V2_1 = 0x04,
    V3_0 = 0x05,
    V4_0 = 0x06,
    V4_1 = 0x07,
    V4_2 = 0x08,
    V5_0 = 0x09,
    V5_1 = 0x0A,
    V5_2 = 0x0B,
    V5_3 = 0x0C,
    V5_4 = 0x0D,
    V6_0 = 0x0E,
    #[default]
    Unknown = 0xFF,
}

impl Debug for CoreVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match *self {
            Self::V1_0 => "v1.0b",
            Self::V1_1 => "v1.1",
            Self::V1_2 => "v1.2",
            Self::V2_0 => "v2.0+EDR",
            Self::V2_1 => "v2.1+EDR",
            Self::V3_0 => "v3.0+HS",
            Self::V4_0 => "v4.0",
            Self::V4_1 => "v4.1",
            Self::V4_2 => "v4.2",
            Self::V5_0 => "v5.0",
            Self::V5_1 => "v5.1",
            Self::V5_2 => "v5.2",
            Self::V5_3 => "v5.3",
            Self::V5_4 => "v5.4",
            Self::V6_0 => "v6.0",
            Self::Unknown => "<unknown version>",
        })
    }
}

/// Company identifier ([Assigned Numbers] Section 7.1).
///
/// Reported as the manufacturer name in `HCI_Read_Local_Version_Information` and used to pick
/// the vendor specific command set of a controller.
#[derive(Debug, Clone, Copy, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
#[repr(transparent)]
pub struct CompanyId(pub u16);

impl CompanyId {
    pub const ERICSSON: Self = Self(0);
    pub const CSR: Self = Self(10);
    pub const TEXAS_INSTRUMENTS: Self = Self(13);
    pub const BROADCOM: Self = Self(15);
    pub const ZEEVO: Self = Self(18);
    pub const ST_MICROELECTRONICS: Self = Self(48);
    pub const ISSC: Self = Self(57);
    /// Reserved for internal use, never assigned to a vendor.
    pub const RESERVED: Self = Self(0xFFFF);
}

impl Display for CompanyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

impl From<u16> for CompanyId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Bluetooth device address ([Vol 2] Part B, Section 1.2).
///
/// Stored in the little endian order used on the wire, displayed most significant byte first.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BdAddr([u8; 6]);

impl BdAddr {
    /// `00:00:00:00:00:00`, reported by controllers that have no address provisioned.
    pub const ANY: Self = Self([0x00; 6]);
    /// `FF:FF:FF:FF:FF:FF`
    pub const BROADCAST: Self = Self([0xFF; 6]);

    /// Creates an address from its little endian wire representation.
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 6] {
        self.0
    }

    pub fn is_any(&self) -> bool {
        *self == Self::ANY
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl Display for BdAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
               self.0[5], self.0[4], self.0[3], self.0[2], self.0[1], self.0[0])
    }
}

impl Debug for BdAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BdAddr({})", self)
    }
}

impl From<[u8; 6]> for BdAddr {
    fn from(addr: [u8; 6]) -> Self {
        Self(addr)
    }
}

impl AsRef<[u8]> for BdAddr {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromEvent for BdAddr {
    fn unpack(buf: &mut ReceiveBuffer) -> Result<Self, Error> {
        buf.array().map(Self::from)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum AddrParseError {
    #[error("Expected six colon separated octets")]
    WrongLength,
    #[error("Octet {0} is not a two digit hex number")]
    InvalidOctet(usize),
}

impl FromStr for BdAddr {
    type Err = AddrParseError;

    /// Parses the canonical `XX:XX:XX:XX:XX:XX` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut octets = s.split(':');
        for (i, slot) in bytes.iter_mut().rev().enumerate() {
            let octet = octets.next().ok_or(AddrParseError::WrongLength)?;
            if octet.len() != 2 || !octet.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(AddrParseError::InvalidOctet(i));
            }
            *slot = u8::from_str_radix(octet, 16).map_err(|_| AddrParseError::InvalidOctet(i))?;
        }
        match octets.next() {
            Some(_) => Err(AddrParseError::WrongLength),
            None => Ok(Self(bytes))
        }
    }
}
