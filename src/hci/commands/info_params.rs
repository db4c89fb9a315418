use crate::hci::{Error, Hci};
use crate::hci::buffer::ReceiveBuffer;
use crate::hci::commands::{Opcode, OpcodeGroup};
use crate::hci::consts::{BdAddr, CompanyId, CoreVersion};
use crate::hci::events::FromEvent;
use crate::host::Transport;

/// Informational parameters commands ([Vol 4] Part E, Section 7.4).
impl<T: Transport> Hci<T> {

    /// Returns the controller's version information
    /// ([Vol 4] Part E, Section 7.4.1).
    pub async fn read_local_version(&mut self) -> Result<LocalVersion, Error> {
        self.call(Opcode::new(OpcodeGroup::InfoParams, 0x0001)).await
    }

    /// Returns the controller's public device address
    /// ([Vol 4] Part E, Section 7.4.6).
    pub async fn read_bd_addr(&mut self) -> Result<BdAddr, Error> {
        self.call(Opcode::new(OpcodeGroup::InfoParams, 0x0009)).await
    }

}

/// `HCI_Read_Local_Version_Information` return parameters
/// ([Vol 4] Part E, Section 7.4.1).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LocalVersion {
    pub hci_version: CoreVersion,
    pub hci_subversion: u16,
    pub lmp_version: CoreVersion,
    pub company_id: CompanyId,
    pub lmp_subversion: u16,
}

impl FromEvent for LocalVersion {
    #[inline]
    fn unpack(buf: &mut ReceiveBuffer) -> Result<Self, Error> {
        Ok(Self {
            hci_version: CoreVersion::from(buf.u8()?),
            hci_subversion: buf.u16()?,
            lmp_version: CoreVersion::from(buf.u8()?),
            company_id: CompanyId(buf.u16()?),
            lmp_subversion: buf.u16()?,
        })
    }
}
