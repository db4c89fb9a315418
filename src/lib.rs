//! Bluetooth controller address rewriting over HCI.
//!
//! A controller's public device address lives in vendor specific storage and can only be
//! changed through proprietary commands. [`Spoofer`] identifies the silicon vendor of a
//! controller, writes the new address with that vendor's command set and then drives the
//! controller through the reset sequence the vendor requires.

pub mod hci;
pub mod host;
pub mod spoof;
pub mod vendor;
mod utils;

pub use hci::consts::BdAddr;
pub use spoof::{spoof_address, spoof_address_blocking, SpoofOutcome, Spoofer, Timeouts};
