//! Changing the public address of a controller.
//!
//! One operation opens the controller, identifies its manufacturer, writes the address with
//! the manufacturer's command set and tries to make the controller load it. Every failure is
//! folded into a [`SpoofOutcome`]; the details end up in the log.

mod probe;
mod reset;

use std::fmt::{Display, Formatter};

use tracing::{error, info, warn};

use crate::hci::consts::BdAddr;
use crate::hci::Hci;
use crate::host::usb::UsbConnector;
use crate::host::{Connector, Transport};
use crate::vendor;

pub use crate::hci::Timeouts;
pub use probe::{probe, ControllerIdentity};
pub use reset::apply_reset;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpoofOutcome {
    /// The address was written and the controller was reset to use it.
    Success,
    /// The target is not an address a controller can be given, or is already in use.
    AddressRejectedByCaller,
    /// The controller refused the write or answered with something unexpected.
    WriteFailed,
    /// No write command is known for the controller's manufacturer.
    VendorUnsupported,
    /// The controller could not be opened or did not answer the probe.
    TransportError,
    /// The address was written but only takes effect after a power cycle.
    ResetRequiredManually
}

impl SpoofOutcome {
    /// Whether the new address has reached the controller.
    pub fn address_written(self) -> bool {
        matches!(self, SpoofOutcome::Success | SpoofOutcome::ResetRequiredManually)
    }
}

impl Display for SpoofOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SpoofOutcome::Success => "address changed",
            SpoofOutcome::AddressRejectedByCaller => "address rejected",
            SpoofOutcome::WriteFailed => "controller rejected the address",
            SpoofOutcome::VendorUnsupported => "manufacturer not supported",
            SpoofOutcome::TransportError => "controller not reachable",
            SpoofOutcome::ResetRequiredManually => "address written, power cycle the controller to apply it"
        })
    }
}

/// Runs address changes against the controllers of one [`Connector`].
///
/// Operations on different controllers are independent and can run concurrently. Callers
/// must not run two operations on the same controller at once.
#[derive(Debug, Clone, Default)]
pub struct Spoofer<C> {
    connector: C,
    timeouts: Timeouts
}

impl<C: Connector> Spoofer<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            timeouts: Timeouts::default()
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Gives the controller with the given index a new public address.
    pub async fn spoof_address(&self, index: u16, target: BdAddr) -> SpoofOutcome {
        let transport = match self.connector.open(index).await {
            Ok(transport) => transport,
            Err(err) => {
                error!("Failed to open controller {}: {}", index, err);
                return SpoofOutcome::TransportError;
            }
        };
        let mut hci = Hci::new(transport, self.timeouts);
        let outcome = spoof(&mut hci, index, target).await;
        hci.close().await;
        info!("Controller {}: {}", index, outcome);
        outcome
    }

    /// Like [`Spoofer::spoof_address`], with the address in `XX:XX:XX:XX:XX:XX` notation.
    ///
    /// An unparsable address is rejected without touching the controller.
    pub async fn spoof_address_str(&self, index: u16, target: &str) -> SpoofOutcome {
        match target.parse::<BdAddr>() {
            Ok(target) => self.spoof_address(index, target).await,
            Err(err) => {
                warn!("Invalid address {:?}: {}", target, err);
                SpoofOutcome::AddressRejectedByCaller
            }
        }
    }
}

async fn spoof<T: Transport>(hci: &mut Hci<T>, index: u16, target: BdAddr) -> SpoofOutcome {
    let identity = match probe(hci).await {
        Ok(identity) => identity,
        Err(err) => {
            error!("Failed to identify controller {}: {}", index, err);
            return SpoofOutcome::TransportError;
        }
    };
    info!("Controller {} from manufacturer {} uses {}", index, identity.version.company_id, identity.address);

    if target.is_any() || target.is_broadcast() {
        warn!("{} can not be assigned to a controller", target);
        return SpoofOutcome::AddressRejectedByCaller;
    }
    if target == identity.address {
        warn!("Controller {} already uses {}", index, target);
        return SpoofOutcome::AddressRejectedByCaller;
    }

    let profile = match vendor::lookup(identity.version.company_id) {
        Ok(profile) => profile,
        Err(err) => {
            warn!("{}", err);
            return SpoofOutcome::VendorUnsupported;
        }
    };
    info!("Writing {} with the {} command set", target, profile.vendor);

    if let Err(err) = profile.write(hci, target).await {
        error!("Failed to write the address of controller {}: {}", index, err);
        return SpoofOutcome::WriteFailed;
    }
    apply_reset(hci, profile, index).await
}

/// Changes the address of the `index`-th USB Bluetooth controller.
pub async fn spoof_address(index: u16, target: &str) -> SpoofOutcome {
    Spoofer::new(UsbConnector::default())
        .spoof_address_str(index, target)
        .await
}

/// Blocking version of [`spoof_address`] for callers without a runtime.
///
/// Fails with [`SpoofOutcome::TransportError`] when called from inside a tokio runtime.
pub fn spoof_address_blocking(index: u16, target: &str) -> SpoofOutcome {
    if tokio::runtime::Handle::try_current().is_ok() {
        error!("spoof_address_blocking can not be used from within an async runtime");
        return SpoofOutcome::TransportError;
    }
    match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(runtime) => runtime.block_on(spoof_address(index, target)),
        Err(err) => {
            error!("Failed to start the runtime: {}", err);
            SpoofOutcome::TransportError
        }
    }
}
