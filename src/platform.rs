//! Platform seams of the driver
//!
//! The core is portable across SoCs that integrate the DW SSI block; what
//! differs per integration lives behind these two traits. `MspiDwVendor`
//! covers the SoC-specific controller hooks (interrupt wiring and the
//! memory-region mapping backing XIP); `MspiDwOs` covers the services the
//! driver needs from its execution environment.

use crate::common::{DevId, Result, XipCfg};

/// SoC-specific controller hooks.
pub trait MspiDwVendor {
    /// One-time vendor bring-up (wrapper registers, interrupt wiring).
    fn init(&mut self);

    /// Clear the vendor-level interrupt after the core has serviced the
    /// controller.
    fn clear_irq(&mut self);

    /// Map the XIP memory region for the given chip-select and enable
    /// vendor-side XIP plumbing.
    fn xip_enable(&mut self, dev_id: &DevId, cfg: &XipCfg) -> Result<()>;

    /// Tear down the vendor-side XIP mapping for the given chip-select.
    fn xip_disable(&mut self, dev_id: &DevId, cfg: &XipCfg) -> Result<()>;
}

/// Execution-environment services.
///
/// The driver services the controller from the context that called
/// `transceive`: the hardware interrupt handler only has to ack the
/// interrupt at the vendor level, mask it, and make `wait_for_irq`
/// return. Register updates that must not be observed half-done by an
/// active XIP consumer are bracketed with `irq_lock`/`irq_unlock`.
pub trait MspiDwOs {
    /// Enter an interrupt-masked critical section.
    fn irq_lock(&mut self);

    /// Leave the critical section entered by the last [`Self::irq_lock`].
    fn irq_unlock(&mut self);

    /// Block until the controller raises an interrupt, or until
    /// `timeout_ms` elapses. Returns `false` on timeout.
    fn wait_for_irq(&mut self, timeout_ms: u32) -> bool;

    /// Configure a chip-select GPIO as an inactive output.
    fn ce_configure(&mut self, pin: u8) -> Result<()>;

    /// Drive a chip-select GPIO; `active` asserts the line.
    fn ce_set(&mut self, pin: u8, active: bool);
}
