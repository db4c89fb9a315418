use tracing::{debug, info, warn};

use crate::hci::Hci;
use crate::host::Transport;
use crate::spoof::SpoofOutcome;
use crate::vendor::{ResetController, VendorProfile};

/// Makes the controller use the address that was just written.
///
/// Runs the vendor's reset routine and then resets the controller through the transport. A
/// vendor without a routine, or a routine that fails, leaves the power cycle to the user.
pub async fn apply_reset<T: Transport>(hci: &mut Hci<T>, profile: &VendorProfile, index: u16) -> SpoofOutcome {
    let Some(routine) = profile.reset else {
        info!("{} controllers need a power cycle to load the new address", profile.vendor);
        return SpoofOutcome::ResetRequiredManually;
    };
    debug!("Running {:?} reset routine on controller {}", routine, index);
    if let Err(err) = routine.reset_controller(hci).await {
        warn!("Reset routine failed on controller {}: {}", index, err);
        return SpoofOutcome::ResetRequiredManually;
    }
    if let Err(err) = hci.reset_device().await {
        warn!("Failed to reset controller {}: {}", index, err);
    }
    SpoofOutcome::Success
}

#[cfg(test)]
mod tests {
    use crate::hci::consts::CompanyId;
    use crate::hci::{Hci, Opcode, OpcodeGroup, Timeouts};
    use crate::host::testing::FakeController;
    use crate::host::Connector;
    use crate::spoof::{apply_reset, SpoofOutcome};
    use crate::vendor::lookup;

    #[tokio::test]
    async fn no_routine_needs_a_power_cycle() {
        let controller = FakeController::new(18);
        let mut hci = Hci::new(controller.open(0).await.unwrap(), Timeouts::default());
        let outcome = apply_reset(&mut hci, lookup(CompanyId::ZEEVO).unwrap(), 0).await;
        hci.close().await;

        assert_eq!(outcome, SpoofOutcome::ResetRequiredManually);
        assert!(controller.log().commands.is_empty());
        assert_eq!(controller.log().resets, 0);
    }

    #[tokio::test]
    async fn failed_routine_needs_a_power_cycle() {
        let controller = FakeController::new(15).failing(Opcode::new(OpcodeGroup::HciControl, 0x0003));
        let mut hci = Hci::new(controller.open(0).await.unwrap(), Timeouts::default());
        let outcome = apply_reset(&mut hci, lookup(CompanyId::BROADCOM).unwrap(), 0).await;
        hci.close().await;

        assert_eq!(outcome, SpoofOutcome::ResetRequiredManually);
        assert_eq!(controller.log().resets, 0);
    }

    #[tokio::test]
    async fn routine_is_followed_by_a_device_reset() {
        let controller = FakeController::new(57);
        let mut hci = Hci::new(controller.open(0).await.unwrap(), Timeouts::default());
        let outcome = apply_reset(&mut hci, lookup(CompanyId::ISSC).unwrap(), 0).await;
        hci.close().await;

        assert_eq!(outcome, SpoofOutcome::Success);
        assert_eq!(controller.log().resets, 1);
    }

    #[tokio::test]
    async fn failing_device_reset_still_succeeds() {
        let controller = FakeController::new(15).failing_reset();
        let mut hci = Hci::new(controller.open(0).await.unwrap(), Timeouts::default());
        let outcome = apply_reset(&mut hci, lookup(CompanyId::BROADCOM).unwrap(), 0).await;
        hci.close().await;

        assert_eq!(outcome, SpoofOutcome::Success);
        assert_eq!(controller.log().resets, 1);
    }
}
