use bytes::Bytes;
use tracing::trace;

use crate::ensure;
use crate::hci::buffer::ReceiveBuffer;
use crate::hci::consts::{EventCode, Status};
use crate::hci::{Error, Opcode};

pub trait FromEvent: Sized {
    fn unpack(buf: &mut ReceiveBuffer) -> Result<Self, Error>;
}

impl FromEvent for () {
    fn unpack(_: &mut ReceiveBuffer) -> Result<Self, Error> {
        Ok(())
    }
}

impl FromEvent for u8 {
    fn unpack(buf: &mut ReceiveBuffer) -> Result<Self, Error> {
        buf.u8()
    }
}

impl FromEvent for Bytes {
    /// Vendor commands may return parameters this crate does not interpret.
    fn unpack(buf: &mut ReceiveBuffer) -> Result<Self, Error> {
        Ok(buf.rest())
    }
}

/// The event that completes a command exchange.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResponseEvent {
    /// `HCI_Command_Complete` for the same opcode, carrying the status and return parameters.
    CommandComplete,
    /// A vendor specific event (code 0xFF), used by BCCMD style protocols.
    Vendor
}

#[derive(Debug, Clone)]
pub struct Event {
    pub code: EventCode,
    pub data: ReceiveBuffer,
}

impl Event {
    /// HCI event packet ([Vol 4] Part E, Section 5.4.4).
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        data
            .split_first_chunk()
            .ok_or(Error::BadEventPacketSize)
            .and_then(|([code, len], payload)| {
                ensure!(*len as usize == payload.len(), Error::BadEventPacketSize);
                Ok(Self {
                    code: EventCode::from(*code),
                    data: ReceiveBuffer::from_payload(Bytes::copy_from_slice(payload))
                })
            })
    }

    /// Checks whether this event finishes the exchange for `opcode`.
    ///
    /// Returns the response parameters once the exchange is complete and `None` for events that
    /// belong to something else. A `Command_Complete` for the opcode always ends the exchange,
    /// even when a vendor event was expected, and a failed `Command_Status` aborts it.
    pub fn response_to(mut self, opcode: Opcode, expected: ResponseEvent) -> Result<Option<Bytes>, Error> {
        match self.code {
            EventCode::CommandStatus => {
                // ([Vol 4] Part E, Section 7.7.15).
                let status = Status::from(self.data.u8()?);
                let _cmd_quota = self.data.u8()?;
                let op = self.data.u16().map(Opcode::from)?;
                if op != opcode {
                    trace!("Ignoring CommandStatus for {:?}", op);
                    return Ok(None);
                }
                match status {
                    Status::Success => Ok(None),
                    status => Err(Error::Controller(status))
                }
            }
            EventCode::CommandComplete => {
                // ([Vol 4] Part E, Section 7.7.14).
                let _cmd_quota = self.data.u8()?;
                let op = self.data.u16().map(Opcode::from)?;
                if op != opcode {
                    trace!("Ignoring CommandComplete for {:?}", op);
                    return Ok(None);
                }
                Ok(Some(self.data.rest()))
            }
            EventCode::Vendor if expected == ResponseEvent::Vendor => Ok(Some(self.data.rest())),
            code => {
                trace!("Ignoring unrelated HCI event: {:?}", code);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::hci::consts::{EventCode, Status};
    use crate::hci::events::{Event, ResponseEvent};
    use crate::hci::{Error, Opcode, OpcodeGroup};

    const READ_BD_ADDR: Opcode = Opcode::new(OpcodeGroup::InfoParams, 0x0009);

    #[test]
    fn parse_checks_length() {
        let event = Event::parse(&[0x0E, 0x04, 0x01, 0x09, 0x10, 0x00]).unwrap();
        assert_eq!(event.code, EventCode::CommandComplete);
        assert!(matches!(Event::parse(&[0x0E, 0x05, 0x01]), Err(Error::BadEventPacketSize)));
        assert!(matches!(Event::parse(&[0x0E]), Err(Error::BadEventPacketSize)));
    }

    #[test]
    fn command_complete_for_our_opcode() {
        let event = Event::parse(&[0x0E, 0x0A, 0x01, 0x09, 0x10, 0x00, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]).unwrap();
        let params = event.response_to(READ_BD_ADDR, ResponseEvent::CommandComplete).unwrap().unwrap();
        assert_eq!(params.as_ref(), &[0x00, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn unrelated_events_are_skipped() {
        let other = Event::parse(&[0x0E, 0x04, 0x01, 0x03, 0x0C, 0x00]).unwrap();
        assert!(other.response_to(READ_BD_ADDR, ResponseEvent::CommandComplete).unwrap().is_none());
        let le_meta = Event::parse(&[0x3E, 0x01, 0x02]).unwrap();
        assert!(le_meta.response_to(READ_BD_ADDR, ResponseEvent::CommandComplete).unwrap().is_none());
        let vendor = Event::parse(&[0xFF, 0x01, 0xC2]).unwrap();
        assert!(vendor.response_to(READ_BD_ADDR, ResponseEvent::CommandComplete).unwrap().is_none());
    }

    #[test]
    fn command_status() {
        let bccmd = Opcode::new(OpcodeGroup::Vendor, 0x0000);
        let pending = Event::parse(&[0x0F, 0x04, 0x00, 0x01, 0x00, 0xFC]).unwrap();
        assert!(pending.response_to(bccmd, ResponseEvent::Vendor).unwrap().is_none());

        let rejected = Event::parse(&[0x0F, 0x04, 0x01, 0x01, 0x00, 0xFC]).unwrap();
        assert!(matches!(
            rejected.response_to(bccmd, ResponseEvent::Vendor),
            Err(Error::Controller(Status::UnknownCommand))
        ));

        let vendor = Event::parse(&[0xFF, 0x02, 0xC2, 0x01]).unwrap();
        assert_eq!(vendor.response_to(bccmd, ResponseEvent::Vendor).unwrap().unwrap().as_ref(), &[0xC2, 0x01]);
    }
}
