use tracing::debug;

use crate::hci::consts::BdAddr;
use crate::hci::{Error, Hci, LocalVersion};
use crate::host::Transport;

/// Who built the controller and which address it currently uses.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ControllerIdentity {
    pub version: LocalVersion,
    pub address: BdAddr
}

/// Reads the version information and the address in effect.
///
/// The address from the host's device record is preferred; `HCI_Read_BD_ADDR` is only sent
/// when that record does not know it.
pub async fn probe<T: Transport>(hci: &mut Hci<T>) -> Result<ControllerIdentity, Error> {
    let version = hci.read_local_version().await?;
    debug!("Local version: {:?}", version);
    let address = match hci.transport().device_info().address {
        addr if addr.is_any() => hci.read_bd_addr().await?,
        addr => addr
    };
    Ok(ControllerIdentity { version, address })
}
