/// Settle time after register writes that the controller needs to latch.
pub const SETTLE_US: u32 = 50;

/// Upper bound on any single busy/ready/data-request wait.
pub const POLL_TIMEOUT_US: u32 = 1_000_000;

/// Where a controller lives and how patiently it is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Tag the block registry knows the device by.
    pub name: &'static str,
    pub command_base: usize,
    pub control_base: usize,
    pub settle_us: u32,
    pub timeout_us: u32,
}

impl ControllerConfig {
    /// SATA disk controller.
    pub const DISK: Self = Self::new("sda", 0xEA00_1300, 0xEA00_1320);

    /// Optical drive controller.
    pub const OPTICAL: Self = Self::new("dvd", 0xEA00_1200, 0xEA00_1220);

    pub const fn new(name: &'static str, command_base: usize, control_base: usize) -> Self {
        Self {
            name,
            command_base,
            control_base,
            settle_us: SETTLE_US,
            timeout_us: POLL_TIMEOUT_US,
        }
    }

    pub const fn with_timeout_us(mut self, timeout_us: u32) -> Self {
        self.timeout_us = timeout_us;
        self
    }

    pub const fn with_settle_us(mut self, settle_us: u32) -> Self {
        self.settle_us = settle_us;
        self
    }
}
