use crate::hci::{Error, Hci, ResponseEvent};
use crate::hci::commands::{Opcode, OpcodeGroup};
use crate::host::Transport;

/// Controller and baseband commands ([Vol 4] Part E, Section 7.3).
impl<T: Transport> Hci<T> {

    /// Resets the controller's link manager, baseband, and link layer
    /// ([Vol 4] Part E, Section 7.3.2).
    ///
    /// Waits for the completion within the reset timeout instead of the command timeout.
    pub async fn reset(&mut self) -> Result<(), Error> {
        let timeout = self.timeouts().reset;
        let mut resp = self
            .exchange(Opcode::new(OpcodeGroup::HciControl, 0x0003), Default::default(), ResponseEvent::CommandComplete, timeout)
            .await?;
        Self::check_status(&mut resp)
    }

}
