use log::info;

use super::{
    Channel,
    addressing::{AddressingMode, Geometry},
    error::{AtaError, AtaResult},
    poll::Delay,
    regs::{CMD_IDENTIFY, CMD_IDENTIFY_PACKET, DEV_LBA, ER_ABRT, REG_DEVICE, RegisterAccess},
};

pub const PARAMETER_BLOCK_SIZE: usize = 512;
pub const PACKET_PARAMETER_BLOCK_SIZE: usize = 256;

const WORD_CYLINDERS: usize = 1;
const WORD_HEADS: usize = 3;
const WORD_SECTORS_PER_TRACK: usize = 6;
const WORD_CAPABILITIES: usize = 49;
const WORD_TOTAL_SECTORS: usize = 60;
const WORD_COMMAND_SETS: usize = 83;
const WORD_TOTAL_SECTORS_LBA48: usize = 100;

const CAP_LBA: u16 = 1 << 9;
const CMDSET_LBA48: u16 = 1 << 10;

const TEXT_AREA: usize = 0x80;
const SERIAL: (usize, usize) = (20, 40);
const FIRMWARE: (usize, usize) = (46, 54);
const MODEL: (usize, usize) = (54, 94);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Native,
    PacketCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Native {
        mode: AddressingMode,
        total_sectors: u32,
    },
    PacketCommand,
}

/// Swaps every byte pair in place. Applying it twice restores the input.
pub fn swap_pairs(bytes: &mut [u8]) {
    for pair in bytes.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}

/// Identify data as it lands in memory from the data port.
pub struct ParameterBlock<'a> {
    raw: &'a [u8],
}

impl<'a> ParameterBlock<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        Self { raw }
    }

    /// Words arrive byte-swapped relative to host order.
    pub fn word(&self, index: usize) -> u16 {
        self.raw
            .get(index * 2..index * 2 + 2)
            .map_or(0, |b| u16::from_be_bytes([b[0], b[1]]).swap_bytes())
    }

    pub fn dword(&self, index: usize) -> u32 {
        self.raw
            .get(index * 2..index * 2 + 4)
            .map_or(0, |b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]).swap_bytes())
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            cylinders: self.word(WORD_CYLINDERS),
            heads: self.word(WORD_HEADS),
            sectors_per_track: self.word(WORD_SECTORS_PER_TRACK),
        }
    }

    /// Best addressing mode the device advertises. CHS is always supported.
    pub fn addressing_mode(&self) -> AddressingMode {
        if self.word(WORD_CAPABILITIES) & CAP_LBA == 0 {
            AddressingMode::Chs(self.geometry())
        } else if self.word(WORD_COMMAND_SETS) & CMDSET_LBA48 != 0 {
            AddressingMode::Lba48
        } else {
            AddressingMode::Lba28
        }
    }

    pub fn total_sectors(&self, mode: &AddressingMode) -> u32 {
        match mode {
            AddressingMode::Lba48 => self.dword(WORD_TOTAL_SECTORS_LBA48),
            AddressingMode::Chs(_) | AddressingMode::Lba28 => self.dword(WORD_TOTAL_SECTORS),
        }
    }
}

/// Serial, firmware revision and model strings, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentStrings {
    text: [u8; TEXT_AREA],
}

impl IdentStrings {
    pub fn decode(raw: &[u8]) -> Self {
        let mut text = [0u8; TEXT_AREA];
        let n = raw.len().min(TEXT_AREA);
        text[..n].copy_from_slice(&raw[..n]);
        swap_pairs(&mut text);
        Self { text }
    }

    fn field(&self, (start, end): (usize, usize)) -> &str {
        let bytes = &self.text[start..end];
        let bytes = bytes.split(|&b| b == 0).next().unwrap_or(bytes);
        core::str::from_utf8(bytes).map_or("", |s| s.trim())
    }

    pub fn serial(&self) -> &str {
        self.field(SERIAL)
    }

    pub fn firmware(&self) -> &str {
        self.field(FIRMWARE)
    }

    pub fn model(&self) -> &str {
        self.field(MODEL)
    }
}

/// Everything identification learned about a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub kind: DeviceKind,
    /// Reported geometry. Only drives addressing in CHS mode.
    pub geometry: Geometry,
    pub strings: IdentStrings,
}

impl Identity {
    pub fn from_native_block(raw: &[u8]) -> Self {
        let block = ParameterBlock::new(raw);
        let mode = block.addressing_mode();
        Self {
            kind: DeviceKind::Native {
                mode,
                total_sectors: block.total_sectors(&mode),
            },
            geometry: block.geometry(),
            strings: IdentStrings::decode(raw),
        }
    }

    pub fn from_packet_block(raw: &[u8]) -> Self {
        Self {
            kind: DeviceKind::PacketCommand,
            geometry: Geometry::default(),
            strings: IdentStrings::decode(raw),
        }
    }

    pub fn class(&self) -> DeviceClass {
        match self.kind {
            DeviceKind::Native { .. } => DeviceClass::Native,
            DeviceKind::PacketCommand => DeviceClass::PacketCommand,
        }
    }

    pub fn log_summary(&self, name: &str) {
        info!("{}:  * Serial: {}", name, self.strings.serial());
        info!("{}:  * Firmware: {}", name, self.strings.firmware());
        info!("{}:  * Model: {}", name, self.strings.model());

        if let DeviceKind::Native {
            mode,
            total_sectors,
        } = self.kind
        {
            info!("{}:  * Addressing mode: {}", name, mode);
            info!("{}:  * #cylinders: {}", name, self.geometry.cylinders);
            info!("{}:  * #heads: {}", name, self.geometry.heads);
            info!("{}:  * #sectors: {}", name, total_sectors);
        }
    }
}

impl<R: RegisterAccess, D: Delay> Channel<R, D> {
    /// Runs IDENTIFY DEVICE, falling back to IDENTIFY PACKET DEVICE when the
    /// device aborts the native command.
    pub fn identify(&mut self) -> AtaResult<Identity> {
        self.wait_busy_clear()?;
        self.regs.write_u8(REG_DEVICE, DEV_LBA);
        self.command(CMD_IDENTIFY);
        self.wait_ready()?;

        let mut block = [0u8; PARAMETER_BLOCK_SIZE];
        match self.read_block(&mut block, PARAMETER_BLOCK_SIZE) {
            Ok(_) => Ok(Identity::from_native_block(&block)),
            Err(AtaError::Io(code)) if code & ER_ABRT != 0 => self.identify_packet(),
            Err(e) => Err(e),
        }
    }

    fn identify_packet(&mut self) -> AtaResult<Identity> {
        self.wait_busy_clear()?;
        self.regs.write_u8(REG_DEVICE, DEV_LBA);
        self.command(CMD_IDENTIFY_PACKET);
        self.wait_ready()?;

        let mut block = [0u8; PACKET_PARAMETER_BLOCK_SIZE];
        self.read_block(&mut block, PACKET_PARAMETER_BLOCK_SIZE)?;
        Ok(Identity::from_packet_block(&block))
    }
}
