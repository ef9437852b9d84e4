use alloc::boxed::Box;

use super::{BlockDevice, BlockHandle, BlockRegistry};
use crate::{
    config::ControllerConfig,
    drivers::ata::{AtaDevice, AtaError, AtaResult, Delay, RegisterAccess},
};

/// Exposes an [`AtaDevice`] to the block layer. Offsets are relative to
/// `window_base`.
pub struct AtaBlockDevice<R, D> {
    device: AtaDevice<R, D>,
    window_base: u64,
}

impl<R: RegisterAccess, D: Delay> AtaBlockDevice<R, D> {
    pub fn new(device: AtaDevice<R, D>) -> Self {
        Self::with_window(device, 0)
    }

    pub fn with_window(device: AtaDevice<R, D>, window_base: u64) -> Self {
        Self {
            device,
            window_base,
        }
    }

    pub fn device(&self) -> &AtaDevice<R, D> {
        &self.device
    }

    pub fn into_inner(self) -> AtaDevice<R, D> {
        self.device
    }

    fn sector(&self, start: u64) -> AtaResult<u64> {
        self.window_base
            .checked_add(start)
            .ok_or(AtaError::AddressOutOfRange(start))
    }
}

impl<R, D> BlockDevice for AtaBlockDevice<R, D>
where
    R: RegisterAccess + Send,
    D: Delay + Send,
{
    fn read_blocks(&mut self, start: u64, count: u32, buf: &mut [u8]) -> AtaResult<u32> {
        let sector = self.sector(start)?;
        self.device.read_sectors(sector, count, buf)
    }

    fn write_blocks(&mut self, start: u64, count: u32, buf: &[u8]) -> AtaResult<u32> {
        let sector = self.sector(start)?;
        self.device.write_sectors(sector, count, buf)
    }

    fn block_size(&self) -> usize {
        self.device.sector_size()
    }

    fn num_blocks(&self) -> u64 {
        self.device
            .total_sectors()
            .map_or(0, |total| (total as u64).saturating_sub(self.window_base))
    }
}

/// Probes and identifies a controller, then hands it to `registry` under
/// the configured name.
pub fn attach<R, D>(
    registry: &BlockRegistry,
    regs: R,
    delay: D,
    config: &ControllerConfig,
) -> AtaResult<BlockHandle>
where
    R: RegisterAccess + Send + 'static,
    D: Delay + Send + 'static,
{
    let device = AtaDevice::init(regs, delay, config)?;
    registry.register_device(config.name, Box::new(AtaBlockDevice::new(device)))
}
