use super::{
    Channel,
    error::{AtaError, AtaResult},
    poll::Delay,
    regs::{
        CTRL_NIEN, CTRL_SRST, REG_CONTROL, REG_CYL_HIGH, REG_CYL_LOW, REG_DEVICE,
        REG_SECTOR_COUNT, RegisterAccess,
    },
};

pub const SCRATCH_MARKER: u8 = 0x5A;

const PACKET_SIGNATURE: (u8, u8) = (0x14, 0xEB);
const SATA_SIGNATURE_LOW: [u8; 2] = [0x3C, 0xC3];

/// What the controller presented after reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    /// Packet-command signature (0x14, 0xEB).
    Packet,
    /// Anything else that passed the presence check.
    Generic { status: u8, cyl_low: u8, cyl_high: u8 },
}

impl<R: RegisterAccess, D: Delay> Channel<R, D> {
    /// Decides whether anything is attached to this controller.
    pub fn probe(&mut self) -> AtaResult<Signature> {
        // A floating bus will not hold a written value.
        self.regs.write_u8(REG_DEVICE, 0);
        self.settle();
        self.regs.write_u8(REG_SECTOR_COUNT, SCRATCH_MARKER);
        self.settle();
        if self.regs.read_u8(REG_SECTOR_COUNT) != SCRATCH_MARKER {
            return Err(AtaError::NoDevice);
        }

        self.reset();
        self.regs.write_u8(REG_DEVICE, 0);
        self.settle();

        let cyl_low = self.regs.read_u8(REG_CYL_LOW);
        let cyl_high = self.regs.read_u8(REG_CYL_HIGH);
        if (cyl_low, cyl_high) == PACKET_SIGNATURE {
            return Ok(Signature::Packet);
        }

        // Compatibility heuristic for devices that do not present a clean
        // signature. Keep the exact comparisons.
        let status = self.status();
        let plausible = cyl_low == 0 || cyl_high == 0 || SATA_SIGNATURE_LOW.contains(&cyl_low);
        if status == 0 || !plausible {
            return Err(AtaError::NoDevice);
        }

        Ok(Signature::Generic {
            status,
            cyl_low,
            cyl_high,
        })
    }

    /// Pulses software reset with interrupts masked.
    pub fn reset(&mut self) {
        self.regs.write_control(REG_CONTROL, CTRL_SRST | CTRL_NIEN);
        self.settle();
        self.regs.write_control(REG_CONTROL, CTRL_NIEN);
        self.settle();
    }
}
