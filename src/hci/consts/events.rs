use std::fmt::{Display, Formatter};

use num_enum::{FromPrimitive, IntoPrimitive};

/// HCI event codes ([Vol 4] Part E, Section 7.7).
///
/// Only the events that take part in a command exchange are named.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum EventCode {
    CommandComplete = 0x0E,
    CommandStatus = 0x0F,
    HardwareError = 0x10,
    #[num_enum(catch_all)]
    Other(u8),
    Vendor = 0xFF
}

/// HCI status codes ([Vol 1] Part F, Section 1.3).
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
#[non_exhaustive]
#[repr(u8)]
pub enum Status {
    Success = 0x00,
    UnknownCommand = 0x01,
    UnknownConnectionIdentifier = 0x02,
    HardwareFailure = 0x03,
    PageTimeout = 0x04,
    AuthenticationFailure = 0x05,
    PinOrKeyMissing = 0x06,
    MemoryCapacityExceeded = 0x07,
    ConnectionTimeout = 0x08,
    CommandDisallowed = 0x0C,
    UnsupportedFeatureOrParameterValue = 0x11,
    InvalidCommandParameters = 0x12,
    UnspecifiedError = 0x1F,
    LmpLlResponseTimeout = 0x22,
    ParameterOutOfMandatoryRange = 0x30,
    ControllerBusy = 0x3A,
    #[num_enum(catch_all)]
    Other(u8)
}

impl Status {
    /// Returns whether status is `Success`.
    #[inline(always)]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(code) => write!(f, "Status(0x{:02X})", code),
            _ => std::fmt::Debug::fmt(self, f)
        }
    }
}

impl std::error::Error for Status {}

#[cfg(test)]
mod tests {
    use super::{EventCode, Status};

    #[test]
    fn catch_all_codes() {
        assert_eq!(EventCode::from(0x0E), EventCode::CommandComplete);
        assert_eq!(EventCode::from(0x3E), EventCode::Other(0x3E));
        assert_eq!(Status::from(0x12), Status::InvalidCommandParameters);
        assert_eq!(Status::from(0x45), Status::Other(0x45));
        assert_eq!(u8::from(Status::Other(0x45)), 0x45);
        assert_eq!(Status::Other(0x45).to_string(), "Status(0x45)");
        assert!(Status::from(0).is_ok());
    }

    #[test]
    fn vendor_event_code() {
        assert_eq!(EventCode::from(0xFF), EventCode::Vendor);
        assert_eq!(u8::from(EventCode::Vendor), 0xFF);
        assert_eq!(EventCode::from(0x11), EventCode::Other(0x11));
        assert_eq!(u8::from(EventCode::Other(0x11)), 0x11);
    }
}
