pub mod addressing;
pub mod atapi;
pub mod error;
pub mod identify;
pub mod poll;
pub mod probe;
pub mod regs;
pub mod transfer;

use log::{info, trace, warn};

use crate::config::ControllerConfig;

pub use addressing::{AddressingMode, Geometry};
pub use atapi::CDROM_SECTOR_SIZE;
pub use error::{AtaError, AtaResult};
pub use identify::{DeviceClass, DeviceKind, Identity};
pub use poll::{Delay, WaitCondition};
pub use probe::Signature;
pub use regs::{Mmio, RegisterAccess};

use regs::*;

pub const SECTOR_SIZE: usize = 512;

/// One controller's register windows plus the timing used to drive them.
pub struct Channel<R, D> {
    regs: R,
    delay: D,
    settle_us: u32,
    timeout_us: u32,
}

impl<R: RegisterAccess, D: Delay> Channel<R, D> {
    pub fn new(regs: R, delay: D, config: &ControllerConfig) -> Self {
        Self {
            regs,
            delay,
            settle_us: config.settle_us,
            timeout_us: config.timeout_us,
        }
    }

    pub fn status(&mut self) -> u8 {
        self.regs.read_u8(REG_STATUS)
    }

    pub fn command(&mut self, command: u8) {
        self.regs.write_u8(REG_COMMAND, command);
    }

    pub fn settle(&mut self) {
        self.delay.delay_us(self.settle_us);
    }

    pub fn into_parts(self) -> (R, D) {
        (self.regs, self.delay)
    }
}

/// A probed and identified controller. Only obtainable through
/// [`AtaDevice::init`], so a value of this type is always fully operative.
pub struct AtaDevice<R, D> {
    name: &'static str,
    channel: Channel<R, D>,
    identity: Identity,
}

impl<R: RegisterAccess, D: Delay> AtaDevice<R, D> {
    pub fn init(regs: R, delay: D, config: &ControllerConfig) -> AtaResult<Self> {
        let mut channel = Channel::new(regs, delay, config);

        let signature = match channel.probe() {
            Ok(signature) => signature,
            Err(e) => {
                warn!("{}: {}", config.name, e);
                return Err(e);
            }
        };
        info!(
            "{}: device at {:#010x} ({:?})",
            config.name, config.command_base, signature
        );

        let identity = match channel.identify() {
            Ok(identity) => identity,
            Err(e) => {
                warn!("{}: identify failed: {}", config.name, e);
                return Err(e);
            }
        };
        identity.log_summary(config.name);

        Ok(Self {
            name: config.name,
            channel,
            identity,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn class(&self) -> DeviceClass {
        self.identity.class()
    }

    pub fn sector_size(&self) -> usize {
        match self.class() {
            DeviceClass::Native => SECTOR_SIZE,
            DeviceClass::PacketCommand => CDROM_SECTOR_SIZE,
        }
    }

    /// Addressing mode chosen at identification. Packet-command devices have
    /// none.
    pub fn addressing_mode(&self) -> AtaResult<AddressingMode> {
        match self.identity.kind {
            DeviceKind::Native { mode, .. } => Ok(mode),
            DeviceKind::PacketCommand => Err(AtaError::UnsupportedAddressing),
        }
    }

    pub fn total_sectors(&self) -> Option<u32> {
        match self.identity.kind {
            DeviceKind::Native { total_sectors, .. } => Some(total_sectors),
            DeviceKind::PacketCommand => None,
        }
    }

    /// Reads `count` sectors starting at `sector`, returning sectors read.
    ///
    /// Packet-command devices transfer a single optical block per call.
    pub fn read_sectors(&mut self, sector: u64, count: u32, buf: &mut [u8]) -> AtaResult<u32> {
        match self.class() {
            DeviceClass::Native => self.read_native(sector, count, buf),
            DeviceClass::PacketCommand => {
                let lba = u32::try_from(sector).map_err(|_| AtaError::AddressOutOfRange(sector))?;
                self.channel.packet_read(buf, lba, count)
            }
        }
    }

    pub fn write_sectors(&mut self, sector: u64, count: u32, buf: &[u8]) -> AtaResult<u32> {
        if self.class() == DeviceClass::PacketCommand {
            return Err(AtaError::ReadOnly);
        }
        let mode = self.addressing_mode()?;

        let needed = count as usize * SECTOR_SIZE;
        if buf.len() < needed {
            return Err(AtaError::BufferTooSmall {
                needed,
                got: buf.len(),
            });
        }

        self.channel.encode_address(&mode, sector, count)?;
        self.channel.command(CMD_WRITE_SECTORS_EXT);
        self.channel.wait_ready()?;

        for (i, block) in buf[..needed].chunks_exact(SECTOR_SIZE).enumerate() {
            trace!("{}: write sector {}", self.name, sector + i as u64);
            if let Err(e) = self.channel.write_block(block, SECTOR_SIZE) {
                warn!("{}: write error at sector {}: {}", self.name, sector + i as u64, e);
                return Err(e);
            }
        }

        Ok(count)
    }

    fn read_native(&mut self, sector: u64, count: u32, buf: &mut [u8]) -> AtaResult<u32> {
        let mode = self.addressing_mode()?;
        let needed = count as usize * SECTOR_SIZE;
        if buf.len() < needed {
            return Err(AtaError::BufferTooSmall {
                needed,
                got: buf.len(),
            });
        }

        self.channel.encode_address(&mode, sector, count)?;
        self.channel.command(CMD_READ_SECTORS_EXT);
        self.channel.wait_ready()?;

        for (i, block) in buf[..needed].chunks_exact_mut(SECTOR_SIZE).enumerate() {
            trace!("{}: read sector {}", self.name, sector + i as u64);
            if let Err(e) = self.channel.read_block(block, SECTOR_SIZE) {
                warn!("{}: read error at sector {}: {}", self.name, sector + i as u64, e);
                return Err(e);
            }
        }

        Ok(count)
    }

    #[cfg(test)]
    pub(crate) fn regs_mut(&mut self) -> &mut R {
        &mut self.channel.regs
    }
}
