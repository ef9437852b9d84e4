use core::fmt;

use super::poll::WaitCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtaError {
    /// Nothing answered on the controller during probing.
    NoDevice,
    /// Sector cannot be expressed in the device's CHS geometry.
    Geometry { sector: u64 },
    /// Sector number does not fit the addressing mode.
    AddressOutOfRange(u64),
    /// Status error bit was set; carries the raw error register.
    Io(u8),
    /// Native addressing was requested on a packet-command device.
    UnsupportedAddressing,
    Timeout(WaitCondition),
    /// Zero sectors, or more than one command can carry.
    InvalidCount(u32),
    BufferTooSmall { needed: usize, got: usize },
    ReadOnly,
    DeviceNotFound,
    /// Registry already holds a device under this name.
    DeviceExists,
}

impl fmt::Display for AtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtaError::NoDevice => f.write_str("no device attached"),
            AtaError::Geometry { sector } => {
                write!(f, "sector {} can not be addressed using CHS", sector)
            }
            AtaError::AddressOutOfRange(sector) => {
                write!(f, "sector {} out of range for addressing mode", sector)
            }
            AtaError::Io(code) => write!(f, "device error {:#04x}", code),
            AtaError::UnsupportedAddressing => f.write_str("unsupported addressing mode"),
            AtaError::Timeout(condition) => write!(f, "timeout waiting for {}", condition),
            AtaError::InvalidCount(count) => write!(f, "invalid sector count {}", count),
            AtaError::BufferTooSmall { needed, got } => {
                write!(f, "buffer too small: need {} bytes, got {}", needed, got)
            }
            AtaError::ReadOnly => f.write_str("device is read-only"),
            AtaError::DeviceNotFound => f.write_str("no such block device"),
            AtaError::DeviceExists => f.write_str("block device name already in use"),
        }
    }
}

pub type AtaResult<T> = Result<T, AtaError>;
