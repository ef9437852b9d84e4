use volatile::Volatile;

use crate::config::ControllerConfig;

// Command block
pub const REG_DATA: usize = 0x00;
pub const REG_ERROR: usize = 0x01;
pub const REG_FEATURES: usize = 0x01;
pub const REG_SECTOR_COUNT: usize = 0x02;
pub const REG_LBA_LOW: usize = 0x03;
pub const REG_SECTOR_NUMBER: usize = 0x03;
pub const REG_LBA_MID: usize = 0x04;
pub const REG_CYL_LOW: usize = 0x04;
pub const REG_LBA_HIGH: usize = 0x05;
pub const REG_CYL_HIGH: usize = 0x05;
pub const REG_DEVICE: usize = 0x06;
pub const REG_COMMAND: usize = 0x07;
pub const REG_STATUS: usize = 0x07;

// Control block
pub const REG_CONTROL: usize = 0x00;

pub const SR_ERR: u8 = 0x01;
pub const SR_DRQ: u8 = 0x08;
pub const SR_DRDY: u8 = 0x40;
pub const SR_BSY: u8 = 0x80;

pub const ER_ABRT: u8 = 0x04;

pub const CTRL_NIEN: u8 = 0x02;
pub const CTRL_SRST: u8 = 0x04;

pub const DEV_LBA: u8 = 0xE0;

pub const CMD_READ_SECTORS_EXT: u8 = 0x24;
pub const CMD_WRITE_SECTORS_EXT: u8 = 0x34;
pub const CMD_PACKET: u8 = 0xA0;
pub const CMD_IDENTIFY_PACKET: u8 = 0xA1;
pub const CMD_IDENTIFY: u8 = 0xEC;

/// Raw access to one controller's command and control register windows.
///
/// Every call reaches the device; nothing is cached. Reads take `&mut self`
/// because reading status or data has side effects on real hardware.
pub trait RegisterAccess {
    fn read_u8(&mut self, reg: usize) -> u8;
    fn write_u8(&mut self, reg: usize, value: u8);
    fn read_u32(&mut self, reg: usize) -> u32;
    fn write_u32(&mut self, reg: usize, value: u32);
    fn read_control(&mut self, reg: usize) -> u8;
    fn write_control(&mut self, reg: usize, value: u8);
}

/// Memory-mapped register windows at fixed physical addresses.
pub struct Mmio {
    command_base: usize,
    control_base: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// Both bases must point at mapped controller register windows, and no
    /// other `Mmio` for the same controller may exist.
    pub unsafe fn new(command_base: usize, control_base: usize) -> Self {
        Self {
            command_base,
            control_base,
        }
    }

    /// # Safety
    ///
    /// Same contract as [`Mmio::new`] for the addresses in `config`.
    pub unsafe fn from_config(config: &ControllerConfig) -> Self {
        unsafe { Self::new(config.command_base, config.control_base) }
    }

    unsafe fn cell<T: Copy>(addr: usize) -> &'static mut Volatile<T> {
        unsafe { &mut *(addr as *mut Volatile<T>) }
    }
}

impl RegisterAccess for Mmio {
    fn read_u8(&mut self, reg: usize) -> u8 {
        unsafe { Self::cell::<u8>(self.command_base + reg).read() }
    }

    fn write_u8(&mut self, reg: usize, value: u8) {
        unsafe { Self::cell::<u8>(self.command_base + reg).write(value) }
    }

    fn read_u32(&mut self, reg: usize) -> u32 {
        unsafe { Self::cell::<u32>(self.command_base + reg).read() }
    }

    fn write_u32(&mut self, reg: usize, value: u32) {
        unsafe { Self::cell::<u32>(self.command_base + reg).write(value) }
    }

    fn read_control(&mut self, reg: usize) -> u8 {
        unsafe { Self::cell::<u8>(self.control_base + reg).read() }
    }

    fn write_control(&mut self, reg: usize, value: u8) {
        unsafe { Self::cell::<u8>(self.control_base + reg).write(value) }
    }
}
