use log::debug;

use super::{
    Channel,
    error::{AtaError, AtaResult},
    poll::Delay,
    regs::{
        CMD_PACKET, REG_DEVICE, REG_FEATURES, REG_LBA_HIGH, REG_LBA_MID, REG_SECTOR_COUNT,
        RegisterAccess,
    },
};

pub const CDROM_SECTOR_SIZE: usize = 2048;
pub const PACKET_SIZE: usize = 12;

pub const SCSI_READ_12: u8 = 0xA8;

/// READ(12) command packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPacket {
    pub lba: u32,
    pub length: u32,
}

impl ReadPacket {
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut packet = [0u8; PACKET_SIZE];
        packet[0] = SCSI_READ_12;
        packet[2..6].copy_from_slice(&self.lba.to_be_bytes());
        packet[6..10].copy_from_slice(&self.length.to_be_bytes());
        packet
    }
}

impl<R: RegisterAccess, D: Delay> Channel<R, D> {
    /// Issues PACKET and hands the device its command bytes.
    pub fn send_packet(&mut self, packet: &[u8; PACKET_SIZE]) -> AtaResult<()> {
        self.regs.write_u8(REG_DEVICE, 0);
        self.regs.write_u8(REG_FEATURES, 0);
        self.regs.write_u8(REG_SECTOR_COUNT, 0);
        // Byte count limit; 0xFFFF lets the device pick.
        self.regs.write_u8(REG_LBA_HIGH, 0xFF);
        self.regs.write_u8(REG_LBA_MID, 0xFF);
        self.command(CMD_PACKET);
        self.wait_ready()?;

        self.write_block(packet, PACKET_SIZE)?;
        Ok(())
    }

    /// Reads from a packet-command device. One optical block is transferred
    /// per call; `buf` must hold at least [`CDROM_SECTOR_SIZE`] bytes.
    pub fn packet_read(&mut self, buf: &mut [u8], lba: u32, count: u32) -> AtaResult<u32> {
        if buf.len() < CDROM_SECTOR_SIZE {
            return Err(AtaError::BufferTooSmall {
                needed: CDROM_SECTOR_SIZE,
                got: buf.len(),
            });
        }

        debug!("ATAPI read: lba {} length {}", lba, count);
        self.send_packet(&ReadPacket { lba, length: count }.to_bytes())?;
        self.settle();
        self.read_block(buf, CDROM_SECTOR_SIZE)?;

        Ok(count)
    }
}
