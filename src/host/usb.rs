use std::mem::size_of;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use nusb::descriptors::InterfaceAltSetting;
use nusb::transfer::Direction::{In, Out};
use nusb::transfer::EndpointType::{Bulk, Interrupt};
use nusb::transfer::{ControlOut, ControlType, Queue, Recipient, RequestBuffer};
use nusb::{Device, Interface};
use tracing::{debug, warn};

use crate::ensure;
use crate::hci::btsnoop::{LogWriter, PacketType};
use crate::hci::consts::Status;
use crate::hci::events::Event;
use crate::hci::{Error, Opcode, OpcodeGroup, ResponseEvent};
use crate::host::{Connector, DeviceInfo, Request, Transport};
use crate::utils::IteratorExt;

const MAX_HCI_EVENT_SIZE: usize = 1 + size_of::<u8>() + u8::MAX as usize;
const HCI_EVENT_QUEUE_SIZE: usize = 4;
const HCI_RESET: Opcode = Opcode::new(OpcodeGroup::HciControl, 0x0003);

/// A USB Bluetooth controller as seen during enumeration.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ControllerInfo {
    /// Position in enumeration order, the number passed to [`Connector::open`].
    pub index: u16,
    pub vendor_id: u16,
    pub product_id: u16,
    pub product: Option<String>,
    pub bus_number: u8,
    pub device_address: u8
}

/// Opens USB Bluetooth controllers by their position in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct UsbConnector {
    btsnoop_log: Option<PathBuf>
}

impl UsbConnector {
    /// Captures all traffic of opened controllers to a btsnoop file.
    pub fn with_btsnoop_log<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.btsnoop_log = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enumerates the controllers that are currently attached.
    pub fn list(&self) -> Result<Vec<ControllerInfo>, Error> {
        Ok(UsbController::enumerate()?
            .map(|controller| controller.info)
            .collect())
    }
}

impl Connector for UsbConnector {
    type Transport = UsbHost;

    async fn open(&self, index: u16) -> Result<UsbHost, Error> {
        let controller = UsbController::enumerate()?
            .nth(index.into())
            .ok_or(Error::UnknownController(index))?;
        debug!("Opening controller {}: {:?}", index, controller.info);
        let log = match &self.btsnoop_log {
            Some(path) => LogWriter::create(path, index)?,
            None => LogWriter::disabled()
        };
        controller.claim(log)
    }
}

struct UsbController {
    device: Device,
    endpoints: Endpoints,
    info: ControllerInfo
}

impl UsbController {
    fn enumerate() -> Result<impl Iterator<Item = UsbController>, Error> {
        Ok(nusb::list_devices()?
            .filter_map(|info| {
                let device = info.open()
                    .map_err(|e| debug!("Failed to open {:04X}:{:04X} ({e})", info.vendor_id(), info.product_id()))
                    .ok()?;
                let endpoints = Endpoints::discover(&device)?;
                Some((info, device, endpoints))
            })
            .enumerate()
            .map(|(index, (info, device, endpoints))| UsbController {
                device,
                endpoints,
                info: ControllerInfo {
                    index: index as u16,
                    vendor_id: info.vendor_id(),
                    product_id: info.product_id(),
                    product: info.product_string().map(String::from),
                    bus_number: info.bus_number(),
                    device_address: info.device_address()
                }
            }))
    }

    fn claim(self, log: LogWriter) -> Result<UsbHost, Error> {
        debug!("Claiming main interface");
        let interface = self
            .device
            .detach_and_claim_interface(self.endpoints.main_iface)?;
        let mut events = interface.interrupt_in_queue(self.endpoints.event);
        for _ in 0..HCI_EVENT_QUEUE_SIZE {
            events.submit(RequestBuffer::new(MAX_HCI_EVENT_SIZE));
        }
        Ok(UsbHost {
            endpoints: self.endpoints,
            interface,
            events,
            log
        })
    }
}

/// An open USB controller.
///
/// Commands go out as class requests on the control endpoint, events come back on the
/// interrupt endpoint ([Vol 4] Part B, Section 2.1).
pub struct UsbHost {
    endpoints: Endpoints,
    interface: Interface,
    events: Queue<RequestBuffer>,
    log: LogWriter
}

impl UsbHost {
    async fn command(&mut self, request: &Request) -> Result<Bytes, Error> {
        tokio::time::timeout(request.timeout, self.exchange(request))
            .await
            .map_err(|_| Error::Timeout(request.opcode))?
    }

    async fn exchange(&mut self, request: &Request) -> Result<Bytes, Error> {
        let payload_len = u8::try_from(request.parameters.len()).map_err(|_| Error::PayloadTooLarge)?;
        let mut packet = BytesMut::with_capacity(3 + request.parameters.len());
        packet.put_u16_le(request.opcode.into());
        packet.put_u8(payload_len);
        packet.put_slice(&request.parameters);
        self.log.write(PacketType::Command, &packet);

        self.interface.control_out(ControlOut {
            control_type: ControlType::Class,
            recipient: Recipient::Interface,
            request: 0x00,
            value: 0x00,
            index: self.endpoints.main_iface.into(),
            data: &packet[..],
        }).await.status?;

        loop {
            let completion = self.events.next_complete().await;
            let event = completion.status
                .map_err(Error::from)
                .map(|_| {
                    self.log.write(PacketType::Event, &completion.data);
                    Event::parse(&completion.data)
                });
            self.events.submit(RequestBuffer::reuse(completion.data, MAX_HCI_EVENT_SIZE));
            match event? {
                Ok(event) => {
                    if let Some(params) = event.response_to(request.opcode, request.response)? {
                        return Ok(params);
                    }
                }
                Err(err) => warn!("Dropping malformed HCI event: {:?}", err)
            }
        }
    }
}

impl Transport for UsbHost {
    fn device_info(&self) -> DeviceInfo {
        // The USB descriptors do not carry the public address.
        DeviceInfo::default()
    }

    async fn send_command(&mut self, request: Request) -> Result<Bytes, Error> {
        self.command(&request).await
    }

    async fn reset(&mut self, timeout: Duration) -> Result<(), Error> {
        debug!("Resetting controller");
        let request = Request {
            opcode: HCI_RESET,
            parameters: Bytes::new(),
            response: ResponseEvent::CommandComplete,
            timeout
        };
        let resp = self.command(&request).await?;
        match resp.first().copied().map(Status::from) {
            Some(Status::Success) => Ok(()),
            Some(status) => Err(Error::Controller(status)),
            None => Err(Error::BadEventPacketSize)
        }
    }

    async fn close(self) {
        debug!("Releasing main interface");
        drop(self);
    }
}

/// USB addresses for Bluetooth interfaces and endpoints ([Vol 4] Part B, Section 2.1.1).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Endpoints {
    pub main_iface: u8,
    pub event: u8,
    pub acl_out: u8,
    pub acl_in: u8
}

impl Endpoints {
    fn discover(dev: &Device) -> Option<Self> {
        dev.active_configuration()
            .map_err(|e| warn!("Failed to get config descriptor ({e})"))
            .ok()?
            .interfaces()
            .filter_map(|ifg| {
                let ifas = ifg.alt_settings().single().filter(Self::is_bluetooth)?;
                ensure!(ifas.alternate_setting() == 0 && ifas.num_endpoints() == 3);

                let mut r = Endpoints {
                    main_iface: ifas.interface_number(),
                    event: 0,
                    acl_out: 0,
                    acl_in: 0
                };
                for epd in ifas.endpoints() {
                    match (epd.transfer_type(), epd.direction()) {
                        (Interrupt, In) => r.event = epd.address(),
                        (Bulk, In) => r.acl_in = epd.address(),
                        (Bulk, Out) => r.acl_out = epd.address(),
                        _ => {
                            warn!("Unexpected endpoint: {epd:?}");
                            return None;
                        }
                    }
                }
                Some(r)
            })
            .next()
    }

    fn is_bluetooth(ifas: &InterfaceAltSetting) -> bool {
        // [Vol 4] Part B, Section 3.1
        ifas.class() == 0xE0 && ifas.subclass() == 0x01 && ifas.protocol() == 0x01
    }
}
