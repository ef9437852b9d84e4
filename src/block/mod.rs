pub mod ata;

use alloc::{boxed::Box, collections::BTreeMap, string::String, vec::Vec};
use spin::Mutex;

use crate::drivers::ata::{AtaError, AtaResult};

pub use ata::{AtaBlockDevice, attach};

pub trait BlockDevice: Send {
    /// Reads `count` blocks starting at `start`; returns blocks transferred.
    fn read_blocks(&mut self, start: u64, count: u32, buf: &mut [u8]) -> AtaResult<u32>;

    fn write_blocks(&mut self, _start: u64, _count: u32, _buf: &[u8]) -> AtaResult<u32> {
        Err(AtaError::ReadOnly)
    }

    fn block_size(&self) -> usize;

    fn num_blocks(&self) -> u64 {
        0
    }
}

/// Opaque reference to a registry entry. Does not keep the entry alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockHandle(u32);

struct Entry {
    handle: BlockHandle,
    device: Box<dyn BlockDevice>,
}

/// Named block devices, each owned exclusively by the registry once
/// registered.
pub struct BlockRegistry {
    devices: Mutex<BTreeMap<String, Entry>>,
    next: Mutex<u32>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(BTreeMap::new()),
            next: Mutex::new(0),
        }
    }

    /// Takes ownership of `device` under `name`. A name already in use is
    /// refused and the existing entry is left untouched.
    pub fn register_device(
        &self,
        name: &str,
        device: Box<dyn BlockDevice>,
    ) -> AtaResult<BlockHandle> {
        let mut devices = self.devices.lock();
        if devices.contains_key(name) {
            return Err(AtaError::DeviceExists);
        }

        let handle = {
            let mut next = self.next.lock();
            let handle = BlockHandle(*next);
            *next += 1;
            handle
        };
        devices.insert(name.into(), Entry { handle, device });
        Ok(handle)
    }

    pub fn unregister_device(&self, name: &str) -> Option<Box<dyn BlockDevice>> {
        self.devices.lock().remove(name).map(|entry| entry.device)
    }

    pub fn handle(&self, name: &str) -> Option<BlockHandle> {
        self.devices.lock().get(name).map(|entry| entry.handle)
    }

    pub fn names(&self) -> Vec<String> {
        self.devices.lock().keys().cloned().collect()
    }

    pub fn read(&self, name: &str, start: u64, count: u32, buf: &mut [u8]) -> AtaResult<u32> {
        let mut devices = self.devices.lock();
        let entry = devices.get_mut(name).ok_or(AtaError::DeviceNotFound)?;
        entry.device.read_blocks(start, count, buf)
    }

    pub fn write(&self, name: &str, start: u64, count: u32, buf: &[u8]) -> AtaResult<u32> {
        let mut devices = self.devices.lock();
        let entry = devices.get_mut(name).ok_or(AtaError::DeviceNotFound)?;
        entry.device.write_blocks(start, count, buf)
    }

    pub fn block_size(&self, name: &str) -> Option<usize> {
        self.devices.lock().get(name).map(|e| e.device.block_size())
    }

    pub fn num_blocks(&self, name: &str) -> Option<u64> {
        self.devices.lock().get(name).map(|e| e.device.num_blocks())
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RamDisk {
        data: Vec<u8>,
    }

    impl BlockDevice for RamDisk {
        fn read_blocks(&mut self, start: u64, count: u32, buf: &mut [u8]) -> AtaResult<u32> {
            let off = start as usize * 4;
            let len = count as usize * 4;
            buf[..len].copy_from_slice(&self.data[off..off + len]);
            Ok(count)
        }

        fn block_size(&self) -> usize {
            4
        }

        fn num_blocks(&self) -> u64 {
            (self.data.len() / 4) as u64
        }
    }

    fn ram(len: usize) -> Box<dyn BlockDevice> {
        Box::new(RamDisk {
            data: (0..len).map(|i| i as u8).collect(),
        })
    }

    #[test]
    fn registered_devices_are_reachable_by_name() {
        let registry = BlockRegistry::new();
        let a = registry.register_device("sda", ram(16)).unwrap();
        let b = registry.register_device("dvd", ram(8)).unwrap();

        assert_ne!(a, b);
        assert_eq!(registry.handle("sda"), Some(a));
        assert_eq!(registry.names(), vec!["dvd", "sda"]);
        assert_eq!(registry.num_blocks("sda"), Some(4));
        assert_eq!(registry.block_size("dvd"), Some(4));

        let mut buf = [0u8; 8];
        assert_eq!(registry.read("sda", 1, 2, &mut buf), Ok(2));
        assert_eq!(buf, [4, 5, 6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn default_write_is_read_only() {
        let registry = BlockRegistry::new();
        registry.register_device("dvd", ram(8)).unwrap();
        assert_eq!(registry.write("dvd", 0, 1, &[0; 4]), Err(AtaError::ReadOnly));
    }

    #[test]
    fn unknown_names_and_unregistering() {
        let registry = BlockRegistry::new();
        registry.register_device("sda", ram(8)).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(
            registry.read("sdb", 0, 1, &mut buf),
            Err(AtaError::DeviceNotFound)
        );
        assert!(registry.unregister_device("sda").is_some());
        assert_eq!(registry.handle("sda"), None);
    }

    #[test]
    fn duplicate_name_keeps_first_device() {
        let registry = BlockRegistry::new();
        let first = registry.register_device("sda", ram(16)).unwrap();

        assert!(matches!(
            registry.register_device("sda", ram(8)),
            Err(AtaError::DeviceExists)
        ));
        assert_eq!(registry.handle("sda"), Some(first));
        assert_eq!(registry.num_blocks("sda"), Some(4));

        registry.unregister_device("sda");
        assert!(registry.register_device("sda", ram(8)).is_ok());
    }
}
