//! Driver for the Synopsys DesignWare SSI (multi-SPI) controller
//!
//! Exposes the controller through a generic MSPI surface: standard, dual,
//! quad and octal transfers driven by an interrupt-paced packet engine,
//! plus memory-mapped execute-in-place (XIP) access per chip-select.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod common;
pub(crate) mod config;
pub(crate) mod registers;

pub use crate::common::{
    CePolarity, CppMode, DataRate, DevId, DeviceConfig, DeviceConfigMask, Endian, Error, IoMode,
    Payload, Result, Xfer, XferPacket, XipCfg,
};

mod master;
pub use crate::master::MspiDwDriver;

mod platform;
pub use crate::platform::{MspiDwOs, MspiDwVendor};

/// MspiDwDriverConfig
///
/// Static per-instance configuration, normally taken from devicetree:
/// the controller clock, the FIFO geometry and the chip-select GPIOs
/// the board wires up.
#[derive(Debug, Copy, Clone)]
pub struct MspiDwDriverConfig {
    clock_frequency: u32,
    tx_fifo_depth: u8,
    rx_fifo_depth: u8,
    tx_fifo_threshold: u8,
    rx_fifo_threshold: u8,
    ce_gpios: &'static [u8],
}

impl MspiDwDriverConfig {
    /// Create a config with the default FIFO thresholds for the given
    /// clock frequency and FIFO depth
    pub fn new(clock_frequency: u32, fifo_depth: u8) -> Self {
        let depth = u32::from(fifo_depth);
        Self {
            clock_frequency,
            tx_fifo_depth: fifo_depth,
            rx_fifo_depth: fifo_depth,
            tx_fifo_threshold: (7 * depth / 8).saturating_sub(1) as u8,
            rx_fifo_threshold: (depth / 8).saturating_sub(1) as u8,
            ce_gpios: &[],
        }
    }

    /// set rx_fifo_depth and return self
    #[inline]
    pub fn rx_fifo_depth(mut self, val: u8) -> Self {
        self.rx_fifo_depth = val;
        self
    }

    /// set tx_fifo_threshold and return self
    #[inline]
    pub fn tx_fifo_threshold(mut self, val: u8) -> Self {
        self.tx_fifo_threshold = val;
        self
    }

    /// set rx_fifo_threshold and return self
    #[inline]
    pub fn rx_fifo_threshold(mut self, val: u8) -> Self {
        self.rx_fifo_threshold = val;
        self
    }

    /// set ce_gpios and return self
    #[inline]
    pub fn ce_gpios(mut self, pins: &'static [u8]) -> Self {
        self.ce_gpios = pins;
        self
    }

    pub(crate) fn clock_frequency(&self) -> u32 {
        self.clock_frequency
    }

    pub(crate) fn tx_fifo_depth(&self) -> u32 {
        u32::from(self.tx_fifo_depth)
    }

    pub(crate) fn rx_fifo_depth_value(&self) -> u32 {
        u32::from(self.rx_fifo_depth)
    }

    pub(crate) fn tx_fifo_threshold_value(&self) -> u32 {
        u32::from(self.tx_fifo_threshold)
    }

    pub(crate) fn rx_fifo_threshold_value(&self) -> u32 {
        u32::from(self.rx_fifo_threshold)
    }

    pub(crate) fn ce_gpio_list(&self) -> &'static [u8] {
        self.ce_gpios
    }
}
