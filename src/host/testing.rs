//! Scripted controller for tests.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::hci::consts::{BdAddr, CompanyId};
use crate::hci::{Error, Opcode, OpcodeGroup, ResponseEvent};
use crate::host::{Connector, DeviceInfo, Request, Transport};

const READ_LOCAL_VERSION: Opcode = Opcode::new(OpcodeGroup::InfoParams, 0x0001);
const READ_BD_ADDR: Opcode = Opcode::new(OpcodeGroup::InfoParams, 0x0009);
const RESET: Opcode = Opcode::new(OpcodeGroup::HciControl, 0x0003);

type VendorReply = Arc<dyn Fn(&Request) -> Result<Vec<u8>, Error> + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct Log {
    pub opens: usize,
    pub closes: usize,
    pub commands: Vec<(Opcode, Bytes)>,
    pub resets: usize
}

impl Log {
    pub fn vendor_commands(&self) -> Vec<(Opcode, Bytes)> {
        self.commands
            .iter()
            .filter(|(opcode, _)| opcode.is_vendor())
            .cloned()
            .collect()
    }
}

#[derive(Clone)]
pub struct FakeController {
    company_id: CompanyId,
    descriptor_address: BdAddr,
    address: BdAddr,
    vendor_reply: VendorReply,
    failing: Vec<Opcode>,
    fail_open: bool,
    fail_reset: bool,
    log: Arc<Mutex<Log>>
}

impl FakeController {
    pub fn new(company_id: u16) -> Self {
        Self {
            company_id: CompanyId(company_id),
            descriptor_address: BdAddr::ANY,
            address: BdAddr::new([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]),
            vendor_reply: Arc::new(default_vendor_reply),
            failing: Vec::new(),
            fail_open: false,
            fail_reset: false,
            log: Default::default()
        }
    }

    /// Address returned by `HCI_Read_BD_ADDR`.
    pub fn with_address(mut self, address: BdAddr) -> Self {
        self.address = address;
        self
    }

    /// Address the host already knows from its device record.
    pub fn with_descriptor_address(mut self, address: BdAddr) -> Self {
        self.descriptor_address = address;
        self
    }

    pub fn with_vendor_reply<F>(mut self, reply: F) -> Self
        where F: Fn(&Request) -> Result<Vec<u8>, Error> + Send + Sync + 'static
    {
        self.vendor_reply = Arc::new(reply);
        self
    }

    /// Lets every exchange for `opcode` time out.
    pub fn failing(mut self, opcode: Opcode) -> Self {
        self.failing.push(opcode);
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    pub fn log(&self) -> Log {
        self.log.lock().clone()
    }
}

/// Acknowledges plain commands and echoes BCCMD frames with a zero status.
fn default_vendor_reply(request: &Request) -> Result<Vec<u8>, Error> {
    match request.response {
        ResponseEvent::CommandComplete => Ok(vec![0x00]),
        ResponseEvent::Vendor => {
            let mut reply = request.parameters.to_vec();
            if let Some(status) = reply.get_mut(9..11) {
                status.fill(0);
            }
            Ok(reply)
        }
    }
}

impl Connector for FakeController {
    type Transport = FakeTransport;

    async fn open(&self, index: u16) -> Result<FakeTransport, Error> {
        if self.fail_open {
            return Err(Error::UnknownController(index));
        }
        self.log.lock().opens += 1;
        Ok(FakeTransport {
            controller: self.clone(),
            closed: false
        })
    }
}

pub struct FakeTransport {
    controller: FakeController,
    closed: bool
}

impl Transport for FakeTransport {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo { address: self.controller.descriptor_address }
    }

    async fn send_command(&mut self, request: Request) -> Result<Bytes, Error> {
        assert!(!self.closed, "command sent on a closed transport");
        let controller = &self.controller;
        controller.log.lock().commands.push((request.opcode, request.parameters.clone()));
        if controller.failing.contains(&request.opcode) {
            return Err(Error::Timeout(request.opcode));
        }
        let reply = match request.opcode {
            READ_LOCAL_VERSION => {
                let [lo, hi] = controller.company_id.0.to_le_bytes();
                vec![0x00, 0x06, 0x00, 0x00, 0x06, lo, hi, 0x00, 0x00]
            }
            READ_BD_ADDR => {
                let mut reply = vec![0x00];
                reply.extend_from_slice(controller.address.as_ref());
                reply
            }
            RESET => vec![0x00],
            opcode if opcode.is_vendor() => (controller.vendor_reply)(&request)?,
            _ => vec![0x01]
        };
        Ok(Bytes::from(reply))
    }

    async fn reset(&mut self, _timeout: Duration) -> Result<(), Error> {
        self.controller.log.lock().resets += 1;
        match self.controller.fail_reset {
            true => Err(Error::Timeout(RESET)),
            false => Ok(())
        }
    }

    async fn close(mut self) {
        self.controller.log.lock().closes += 1;
        self.closed = true;
    }
}

impl Drop for FakeTransport {
    fn drop(&mut self) {
        if !self.closed && !std::thread::panicking() {
            panic!("transport dropped without being closed");
        }
    }
}
