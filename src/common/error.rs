//! Driver error type

/// Errors returned by the MSPI driver
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed or internally inconsistent request (bad I/O mode,
    /// bad command/address length, oversized packet, ...).
    InvalidArgument,
    /// Feature that this controller does not implement (asynchronous
    /// transfers, DDR, DQS, auto chip-select break, non-default
    /// endianness or chip-select polarity).
    Unsupported,
    /// The request would change a parameter that an active XIP session
    /// depends on.
    Conflict,
    /// A packet did not complete within its configured deadline.
    Timeout,
    /// The request targets a chip-select other than the one configured
    /// most recently.
    DeviceMismatch,
}

/// Result alias used throughout the crate
pub type Result<T> = core::result::Result<T, Error>;
