mod hci_control;
mod info_params;

use std::fmt::{Debug, Formatter};
use num_enum::TryFromPrimitive;

pub use info_params::*;

// Opcode group field definitions.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive)]
#[repr(u16)]
pub enum OpcodeGroup {
    LinkControl = 0x01,
    LinkPolicy = 0x02,
    HciControl = 0x03,
    InfoParams = 0x04,
    StatusParams = 0x05,
    Testing = 0x06,
    Le = 0x08,
    Vendor = 0x3F // [Vol 4] Part E, Section 5.4.1
}

#[derive(Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Opcode(u16);

impl Opcode {
    /// Creates a new opcode from the specified group and command fields.
    #[inline]
    pub const fn new(group: OpcodeGroup, ocf: u16) -> Self {
        // Combines OGF with OCF to create a full opcode.
        Self((group as u16) << 10 | (ocf & 0x3FF))
    }

    pub fn split(&self) -> Option<(OpcodeGroup, u16)> {
        OpcodeGroup::try_from((self.0 >> 10) & 0x3F)
            .ok()
            .map(|group| (group, self.ocf()))
    }

    #[inline]
    pub const fn ocf(&self) -> u16 {
        self.0 & 0x3FF
    }

    pub fn is_vendor(&self) -> bool {
        matches!(self.split(), Some((OpcodeGroup::Vendor, _)))
    }
}

impl Debug for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.split() {
            Some((group, ocf)) => write!(f, "Opcode({:?}, 0x{:03X})", group, ocf),
            None => write!(f, "Opcode(0x{:04X})", self.0)
        }
    }
}

impl From<Opcode> for u16 {
    #[inline]
    fn from(opcode: Opcode) -> u16 {
        opcode.0
    }
}

impl From<u16> for Opcode {
    #[inline]
    fn from(opcode: u16) -> Opcode {
        Opcode(opcode)
    }
}

#[cfg(test)]
mod tests {
    use crate::hci::{Opcode, OpcodeGroup};

    #[test]
    fn opcode_packing() {
        let reset = Opcode::new(OpcodeGroup::HciControl, 0x0003);
        assert_eq!(u16::from(reset), 0x0C03);
        assert_eq!(reset.split(), Some((OpcodeGroup::HciControl, 0x0003)));
        assert!(!reset.is_vendor());

        let flash = Opcode::new(OpcodeGroup::Vendor, 0x0022);
        assert_eq!(u16::from(flash), 0xFC22);
        assert!(flash.is_vendor());
        assert_eq!(format!("{:?}", flash), "Opcode(Vendor, 0x022)");
        assert_eq!(format!("{:?}", Opcode::from(0x2C01)), "Opcode(0x2C01)");
    }
}
