use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tracing::{error, info};

const BTSNOOP_MAGIC: &[u8] = b"btsnoop\0";
const BTSNOOP_VERSION: u32 = 1;

// const BTSNOOP_FORMAT_HCI: u32 = 1001;
const BTSNOOP_FORMAT_MONITOR: u32 = 2001;

/// Microseconds between 0 AD and the unix epoch, as expected by btsnoop readers.
const BTSNOOP_EPOCH_DELTA: i64 = 0x00E03AB44A676000;

/// Writes every command and event of one controller to a btsnoop capture.
///
/// A disabled writer silently drops everything, so transports can log unconditionally.
#[derive(Default)]
pub struct LogWriter {
    file: Option<Mutex<BufWriter<File>>>,
    index: u16
}

impl LogWriter {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Creates (or truncates) a capture for the controller with the given index.
    pub fn create<P: AsRef<Path>>(path: P, index: u16) -> std::io::Result<Self> {
        let mut file = BufWriter::new(File::create(path.as_ref())?);
        file.write_all(BTSNOOP_MAGIC)?;
        file.write_all(&BTSNOOP_VERSION.to_be_bytes())?;
        file.write_all(&BTSNOOP_FORMAT_MONITOR.to_be_bytes())?;
        file.flush()?;
        info!("Writing btsnoop log to {:?}", path.as_ref());
        Ok(Self {
            file: Some(Mutex::new(file)),
            index
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn write(&self, packet_type: PacketType, data: &[u8]) {
        if let Some(file) = &self.file {
            let mut file = file.lock();
            Self::write_record(&mut *file, SystemTime::now(), self.index, packet_type, data)
                .unwrap_or_else(|err| error!("Failed to write btsnoop log: {:?}", err));
        }
    }

    fn write_record<W: Write>(out: &mut W, time: SystemTime, index: u16, packet_type: PacketType, data: &[u8]) -> std::io::Result<()> {
        const THIRTY_YEARS: Duration = Duration::from_secs(946684800);
        let timestamp = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .ok()
            .and_then(|d| d.checked_sub(THIRTY_YEARS))
            .unwrap_or_default()
            .as_micros() as i64;
        let size = data.len() as u32;
        // The monitor format keeps the controller index in the upper half of the flags.
        let flags = (index as u32) << 16 | packet_type as u32;
        out.write_all(&size.to_be_bytes())?;
        out.write_all(&size.to_be_bytes())?;
        out.write_all(&flags.to_be_bytes())?;
        out.write_all(&0u32.to_be_bytes())?; // dropped packets
        out.write_all(&(timestamp + BTSNOOP_EPOCH_DELTA).to_be_bytes())?;
        out.write_all(data)?;
        out.flush()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u32)]
pub enum PacketType {
    Command = 0x02,
    Event = 0x03,
    SystemNote = 0x0c
}
