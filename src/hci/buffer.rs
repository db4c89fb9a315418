use std::fmt::{Debug, Formatter};
use bytes::{Buf, Bytes};
use crate::hci::Error;

/// Cursor over the return parameters of an HCI event.
#[derive(Default, Clone)]
pub struct ReceiveBuffer {
    data: Bytes
}

impl ReceiveBuffer {

    pub fn from_payload(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    fn ensure(&self, n: usize) -> Result<(), Error> {
        match self.data.remaining() >= n {
            true => Ok(()),
            false => Err(Error::BadEventPacketSize)
        }
    }

    pub fn u8(&mut self) -> Result<u8, Error> {
        self.ensure(1)?;
        Ok(self.data.get_u8())
    }

    pub fn u16(&mut self) -> Result<u16, Error> {
        self.ensure(2)?;
        Ok(self.data.get_u16_le())
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        self.ensure(N)?;
        let mut result = [0; N];
        self.data.copy_to_slice(&mut result);
        Ok(result)
    }

    /// Takes everything that has not been read yet.
    pub fn rest(&mut self) -> Bytes {
        self.data.split_off(0)
    }

    /// Fails if the event carried more parameters than were read.
    pub fn finish(&self) -> Result<(), Error> {
        match self.data.is_empty() {
            true => Ok(()),
            false => Err(Error::BadEventPacketSize)
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }
}

impl Debug for ReceiveBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}
