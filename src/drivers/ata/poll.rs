use core::fmt;

use log::warn;

use super::{
    Channel,
    error::{AtaError, AtaResult},
    regs::{RegisterAccess, SR_BSY, SR_DRDY, SR_DRQ},
};

const POLL_INTERVAL_US: u32 = 1;

/// Platform delay primitive.
pub trait Delay {
    fn delay_us(&mut self, us: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    BusyClear,
    /// Not busy and device ready.
    Ready,
    DataRequest,
}

impl WaitCondition {
    pub fn satisfied_by(self, status: u8) -> bool {
        match self {
            WaitCondition::BusyClear => status & SR_BSY == 0,
            WaitCondition::Ready => status & (SR_BSY | SR_DRDY) == SR_DRDY,
            WaitCondition::DataRequest => status & SR_DRQ != 0,
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaitCondition::BusyClear => "busy clear",
            WaitCondition::Ready => "device ready",
            WaitCondition::DataRequest => "data request",
        })
    }
}

impl<R: RegisterAccess, D: Delay> Channel<R, D> {
    /// Polls status until `condition` holds or the timeout elapses.
    pub fn wait(&mut self, condition: WaitCondition) -> AtaResult<u8> {
        let mut elapsed = 0u32;
        loop {
            let status = self.status();
            if condition.satisfied_by(status) {
                return Ok(status);
            }
            if elapsed >= self.timeout_us {
                warn!("ATA timeout waiting for {} (status {:#04x})", condition, status);
                return Err(AtaError::Timeout(condition));
            }
            self.delay.delay_us(POLL_INTERVAL_US);
            elapsed = elapsed.saturating_add(POLL_INTERVAL_US);
        }
    }

    pub fn wait_busy_clear(&mut self) -> AtaResult<u8> {
        self.wait(WaitCondition::BusyClear)
    }

    pub fn wait_ready(&mut self) -> AtaResult<u8> {
        self.wait(WaitCondition::Ready)
    }

    pub fn wait_drq(&mut self) -> AtaResult<u8> {
        self.wait(WaitCondition::DataRequest)
    }
}
