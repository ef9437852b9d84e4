use core::fmt;

use log::debug;

use super::{
    Channel,
    error::{AtaError, AtaResult},
    poll::Delay,
    regs::{
        DEV_LBA, REG_CYL_HIGH, REG_CYL_LOW, REG_DEVICE, REG_LBA_HIGH, REG_LBA_LOW, REG_LBA_MID,
        REG_SECTOR_COUNT, REG_SECTOR_NUMBER, RegisterAccess,
    },
};

const LBA28_LIMIT: u64 = 1 << 28;
const LBA48_LIMIT: u64 = 1 << 48;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    pub cylinders: u16,
    pub heads: u16,
    pub sectors_per_track: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChsAddress {
    pub cylinder: u32,
    pub head: u32,
    /// One-based sector within the track.
    pub sector: u32,
}

impl Geometry {
    pub fn locate(&self, sector: u64) -> AtaResult<ChsAddress> {
        let spt = self.sectors_per_track as u64;
        let heads = self.heads as u64;
        if spt == 0 || heads == 0 {
            return Err(AtaError::Geometry { sector });
        }

        let track = sector / spt;
        let s = sector % spt + 1;
        let c = track / heads;
        let h = track % heads;

        if s > spt || c > self.cylinders as u64 || h > heads {
            return Err(AtaError::Geometry { sector });
        }

        Ok(ChsAddress {
            cylinder: c as u32,
            head: h as u32,
            sector: s as u32,
        })
    }
}

/// How a native device is addressed. Chosen once at identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Chs(Geometry),
    Lba28,
    Lba48,
}

impl AddressingMode {
    /// Largest sector count a single command can carry.
    pub const fn max_count(&self) -> u32 {
        match self {
            AddressingMode::Lba48 => 65536,
            AddressingMode::Chs(_) | AddressingMode::Lba28 => 256,
        }
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddressingMode::Chs(_) => "CHS",
            AddressingMode::Lba28 => "LBA28",
            AddressingMode::Lba48 => "LBA48",
        })
    }
}

impl<R: RegisterAccess, D: Delay> Channel<R, D> {
    /// Loads the task file with the address and length of a transfer.
    ///
    /// Nothing beyond the busy wait is written when the address is rejected.
    pub fn encode_address(
        &mut self,
        mode: &AddressingMode,
        sector: u64,
        count: u32,
    ) -> AtaResult<()> {
        if count == 0 || count > mode.max_count() {
            return Err(AtaError::InvalidCount(count));
        }

        self.wait_busy_clear()?;
        debug!("ATA {} address: sector {} count {}", mode, sector, count);

        match mode {
            AddressingMode::Chs(geometry) => {
                let chs = geometry.locate(sector)?;
                // 256 encodes as 0
                self.regs.write_u8(REG_SECTOR_COUNT, count as u8);
                self.regs.write_u8(REG_SECTOR_NUMBER, chs.sector as u8);
                self.regs.write_u8(REG_CYL_LOW, chs.cylinder as u8);
                self.regs.write_u8(REG_CYL_HIGH, (chs.cylinder >> 8) as u8);
                self.regs.write_u8(REG_DEVICE, chs.head as u8);
            }
            AddressingMode::Lba28 => {
                if sector >= LBA28_LIMIT {
                    return Err(AtaError::AddressOutOfRange(sector));
                }
                self.set_lba(sector, count);
                self.regs
                    .write_u8(REG_DEVICE, DEV_LBA | ((sector >> 24) & 0x0F) as u8);
            }
            AddressingMode::Lba48 => {
                if sector >= LBA48_LIMIT {
                    return Err(AtaError::AddressOutOfRange(sector));
                }
                // 65536 encodes as 0. Each register latches two values, the
                // previous (upper) half must go first.
                let count = count & 0xFFFF;
                self.set_lba(sector >> 24, count >> 8);
                self.set_lba(sector, count);
                self.regs.write_u8(REG_DEVICE, DEV_LBA);
            }
        }

        Ok(())
    }

    fn set_lba(&mut self, sector: u64, count: u32) {
        self.regs.write_u8(REG_SECTOR_COUNT, count as u8);
        self.regs.write_u8(REG_LBA_LOW, sector as u8);
        self.regs.write_u8(REG_LBA_MID, (sector >> 8) as u8);
        self.regs.write_u8(REG_LBA_HIGH, (sector >> 16) as u8);
    }
}
