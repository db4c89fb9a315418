pub mod consts;
pub mod buffer;
pub mod events;
pub mod btsnoop;
mod commands;

use std::time::Duration;
use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::ensure;
use crate::hci::buffer::ReceiveBuffer;
use crate::hci::consts::Status;
use crate::hci::events::FromEvent;
use crate::host::{Request, Transport};

pub use commands::*;
pub use events::ResponseEvent;

/// Upper bounds for the different kinds of exchanges with a controller.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timeouts {
    /// Regular commands that finish with `Command_Complete`.
    pub command: Duration,
    /// Commands answered by a vendor specific event.
    pub vendor_event: Duration,
    /// Resets, including waiting for the controller to come back.
    pub reset: Duration
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command: Duration::from_millis(1000),
            vendor_event: Duration::from_millis(2000),
            reset: Duration::from_millis(10000)
        }
    }
}

impl Timeouts {
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command = timeout;
        self
    }

    pub fn with_vendor_event_timeout(mut self, timeout: Duration) -> Self {
        self.vendor_event = timeout;
        self
    }

    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset = timeout;
        self
    }
}

/// Command layer on top of an open [`Transport`].
///
/// Only one command is ever outstanding: every call waits for its response (or the timeout)
/// before returning.
pub struct Hci<T> {
    transport: T,
    timeouts: Timeouts
}

impl<T: Transport> Hci<T> {
    pub fn new(transport: T, timeouts: Timeouts) -> Self {
        Self { transport, timeouts }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub async fn call<R: FromEvent>(&mut self, cmd: Opcode) -> Result<R, Error> {
        self.call_with_args(cmd, |_| {}).await
    }

    pub async fn call_with_args<R: FromEvent>(&mut self, cmd: Opcode, packer: impl FnOnce(&mut BytesMut)) -> Result<R, Error> {
        let parameters = pack(packer)?;
        let timeout = self.timeouts.command;
        let mut resp = self.exchange(cmd, parameters, ResponseEvent::CommandComplete, timeout).await?;
        Self::check_status(&mut resp)?;
        let result = R::unpack(&mut resp)?;
        resp.finish()?;
        Ok(result)
    }

    /// Sends a command whose result arrives as a vendor specific event and returns the raw
    /// event parameters.
    pub async fn call_vendor_event(&mut self, cmd: Opcode, packer: impl FnOnce(&mut BytesMut)) -> Result<Bytes, Error> {
        let parameters = pack(packer)?;
        let timeout = self.timeouts.vendor_event;
        let mut resp = self.exchange(cmd, parameters, ResponseEvent::Vendor, timeout).await?;
        Ok(resp.rest())
    }

    pub(crate) async fn exchange(&mut self, opcode: Opcode, parameters: Bytes, response: ResponseEvent, timeout: Duration) -> Result<ReceiveBuffer, Error> {
        trace!("Sending {:?} ({} bytes)", opcode, parameters.len());
        self.transport
            .send_command(Request { opcode, parameters, response, timeout })
            .await
            .map(ReceiveBuffer::from_payload)
    }

    pub(crate) fn check_status(resp: &mut ReceiveBuffer) -> Result<(), Error> {
        match Status::from(resp.u8()?) {
            Status::Success => Ok(()),
            status => Err(Error::Controller(status))
        }
    }

    /// Asks the transport to reset the controller, independent of any vendor protocol.
    pub async fn reset_device(&mut self) -> Result<(), Error> {
        let timeout = self.timeouts.reset;
        self.transport.reset(timeout).await
    }

    /// Releases the underlying transport.
    pub async fn close(self) {
        self.transport.close().await
    }
}

fn pack(packer: impl FnOnce(&mut BytesMut)) -> Result<Bytes, Error> {
    let mut buf = BytesMut::new();
    packer(&mut buf);
    ensure!(buf.len() <= u8::MAX as usize, Error::PayloadTooLarge);
    Ok(buf.freeze())
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    TransportError(#[from] nusb::Error),
    #[error(transparent)]
    TransferError(#[from] nusb::transfer::TransferError),
    #[error("Payload exceeds maximum size (255)")]
    PayloadTooLarge,
    #[error("HCI Event has an invalid size")]
    BadEventPacketSize,
    #[error("No response to {0:?} before the timeout")]
    Timeout(Opcode),
    #[error("No Bluetooth controller with index {0}")]
    UnknownController(u16),
    #[error(transparent)]
    Controller(#[from] Status)
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::TransportError(err) => err.kind() == std::io::ErrorKind::TimedOut,
            _ => false
        }
    }
}
