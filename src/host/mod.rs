//! Access to controllers.
//!
//! A [`Connector`] opens numbered controllers, a [`Transport`] is one open session to such a
//! controller. Everything above this module only talks to these two traits.

pub mod usb;
#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::time::Duration;
use bytes::Bytes;

use crate::hci::consts::BdAddr;
use crate::hci::{Error, Opcode, ResponseEvent};

/// One command exchange.
#[derive(Debug, Clone)]
pub struct Request {
    pub opcode: Opcode,
    pub parameters: Bytes,
    pub response: ResponseEvent,
    pub timeout: Duration
}

/// What the host knows about a controller without talking to it.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct DeviceInfo {
    /// Address from the host's device record, [`BdAddr::ANY`] when the host does not know it.
    pub address: BdAddr
}

pub trait Transport: Send {
    fn device_info(&self) -> DeviceInfo;

    /// Sends a command and waits for the event that completes it.
    ///
    /// For [`ResponseEvent::CommandComplete`] the result starts with the status byte, for
    /// [`ResponseEvent::Vendor`] it is the raw event payload. Fails with [`Error::Timeout`] if
    /// nothing arrives within `request.timeout`.
    fn send_command(&mut self, request: Request) -> impl Future<Output = Result<Bytes, Error>> + Send;

    /// Resets the controller outside of any vendor protocol.
    fn reset(&mut self, timeout: Duration) -> impl Future<Output = Result<(), Error>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send where Self: Sized;
}

pub trait Connector: Sync {
    type Transport: Transport;

    fn open(&self, index: u16) -> impl Future<Output = Result<Self::Transport, Error>> + Send;
}
