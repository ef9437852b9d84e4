//! Polled ATA/ATAPI block driver for the platform's SATA disk and optical
//! drive controllers.
//!
//! Each controller becomes one owned [`AtaDevice`] after probing and
//! identification, and is then handed to a [`BlockRegistry`]. All register
//! handshakes are polled with bounded waits; nothing here uses interrupts.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod block;
pub mod config;
pub mod drivers;
pub mod logger;

#[cfg(test)]
mod sim;

pub use block::{AtaBlockDevice, BlockDevice, BlockHandle, BlockRegistry, attach};
pub use config::ControllerConfig;
pub use drivers::ata::{AtaDevice, AtaError, AtaResult, Delay, Mmio, RegisterAccess};

/// Outcome of bringing up both platform controllers.
#[derive(Debug)]
pub struct PlatformDevices {
    pub disk: AtaResult<BlockHandle>,
    pub optical: AtaResult<BlockHandle>,
}

/// Probes the disk and optical controllers at their fixed addresses and
/// registers whichever respond. A missing device leaves its slot as an error
/// and does not affect the other controller.
///
/// # Safety
///
/// The register windows named by [`ControllerConfig::DISK`] and
/// [`ControllerConfig::OPTICAL`] must be mapped, and nothing else may drive
/// those controllers.
pub unsafe fn attach_platform<D>(registry: &BlockRegistry, delay: D) -> PlatformDevices
where
    D: Delay + Clone + Send + 'static,
{
    let disk = unsafe { Mmio::from_config(&ControllerConfig::DISK) };
    let optical = unsafe { Mmio::from_config(&ControllerConfig::OPTICAL) };

    PlatformDevices {
        disk: attach(registry, disk, delay.clone(), &ControllerConfig::DISK),
        optical: attach(registry, optical, delay, &ControllerConfig::OPTICAL),
    }
}
