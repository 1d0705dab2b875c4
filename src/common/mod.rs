//! MSPI common module
//!
//! Generic multi-SPI bus types shared between the controller driver and
//! its users: I/O modes, device configuration, transfer descriptors and
//! the XIP configuration.

pub mod error;

pub use error::{Error, Result};

/// Sentinel used before any device has been configured.
pub const INVALID_DEV_IDX: u16 = 0xFFFF;

/// MSPI I/O transfer mode.
///
/// The plain `Dual`/`Quad`/`Octal` modes send command, address and data
/// all on the full line count. The `xYZ` variants name the line counts
/// used for the command, address and data phases respectively, e.g.
/// `Quad114` sends the command and address on one line and data on four.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum IoMode {
    /// Standard single-line SPI.
    #[default]
    Single,
    /// Dual I/O, command and address on two lines as well.
    Dual,
    /// Dual data, command and address in standard SPI.
    Dual112,
    /// Dual address and data, command in standard SPI.
    Dual122,
    /// Quad I/O, command and address on four lines as well.
    Quad,
    /// Quad data, command and address in standard SPI.
    Quad114,
    /// Quad address and data, command in standard SPI.
    Quad144,
    /// Octal I/O, command and address on eight lines as well.
    Octal,
    /// Octal data, command and address in standard SPI.
    Octal118,
    /// Octal address and data, command in standard SPI.
    Octal188,
    /// Hex data (not supported by this controller).
    Hex,
    /// Hex data, octal command (not supported by this controller).
    Hex8816,
    /// Hex address and data, octal command (not supported by this
    /// controller).
    Hex81616,
}

/// Clock phase and polarity mode, numbered the usual SPI way.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CppMode {
    /// CPOL = 0, CPHA = 0.
    #[default]
    Mode0,
    /// CPOL = 0, CPHA = 1.
    Mode1,
    /// CPOL = 1, CPHA = 0.
    Mode2,
    /// CPOL = 1, CPHA = 1.
    Mode3,
}

/// Data rate of the bus.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum DataRate {
    /// Single data rate.
    #[default]
    Single,
    /// Double data rate (not supported by this controller).
    Dual,
}

/// Byte order of frames on the wire.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Endian {
    Little,
    /// Most significant byte first; the only order this controller
    /// supports.
    #[default]
    Big,
}

/// Chip-select line polarity.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CePolarity {
    /// Active low; the only polarity this controller supports.
    #[default]
    ActiveLow,
    ActiveHigh,
}

bitflags::bitflags! {
    /// Names the `DeviceConfig` fields a `configure_device` call carries.
    #[repr(transparent)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct DeviceConfigMask: u32 {
        const CE_NUM      = 1 << 0;
        const FREQUENCY   = 1 << 1;
        const IO_MODE     = 1 << 2;
        const DATA_RATE   = 1 << 3;
        const CPP         = 1 << 4;
        const ENDIAN      = 1 << 5;
        const CE_POLARITY = 1 << 6;
        const DQS         = 1 << 7;
        const RX_DUMMY    = 1 << 8;
        const TX_DUMMY    = 1 << 9;
        const READ_CMD    = 1 << 10;
        const WRITE_CMD   = 1 << 11;
        const CMD_LENGTH  = 1 << 12;
        const ADDR_LENGTH = 1 << 13;
        const MEM_BOUNDARY = 1 << 14;
        const BREAK_TIME  = 1 << 15;

        const ALL = 0xFFFF;
    }
}

/// Logical device (peripheral) configuration.
///
/// A `configure_device` call applies the subset of these fields named by
/// the accompanying [`DeviceConfigMask`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub ce_num: u8,
    /// Serial clock frequency in Hz.
    pub freq: u32,
    pub io_mode: IoMode,
    pub data_rate: DataRate,
    pub cpp: CppMode,
    pub endian: Endian,
    pub ce_polarity: CePolarity,
    pub dqs_enable: bool,
    /// Dummy cycles for memory-mapped (XIP) reads.
    pub rx_dummy: u16,
    /// Dummy cycles for memory-mapped (XIP) writes.
    pub tx_dummy: u16,
    /// Opcode used for memory-mapped reads.
    pub read_cmd: u32,
    /// Opcode used for memory-mapped writes.
    pub write_cmd: u32,
    /// Command length in bytes, for memory-mapped access.
    pub cmd_length: u8,
    /// Address length in bytes, for memory-mapped access.
    pub addr_length: u8,
    /// Device memory boundary that transfers may not cross; must be 0.
    pub mem_boundary: u32,
    /// Chip-select break time on boundary crossings; must be 0.
    pub time_to_break: u32,
}

impl DeviceConfig {
    /// Create a configuration with all fields at their defaults
    pub fn new() -> DeviceConfig {
        Self::default()
    }

    /// set freq and return self
    #[inline]
    pub fn freq(mut self, val: u32) -> Self {
        self.freq = val;
        self
    }

    /// set io_mode and return self
    #[inline]
    pub fn io_mode(mut self, val: IoMode) -> Self {
        self.io_mode = val;
        self
    }

    /// set cpp and return self
    #[inline]
    pub fn cpp(mut self, val: CppMode) -> Self {
        self.cpp = val;
        self
    }

    /// set read_cmd and return self
    #[inline]
    pub fn read_cmd(mut self, val: u32) -> Self {
        self.read_cmd = val;
        self
    }

    /// set write_cmd and return self
    #[inline]
    pub fn write_cmd(mut self, val: u32) -> Self {
        self.write_cmd = val;
        self
    }

    /// set rx_dummy and return self
    #[inline]
    pub fn rx_dummy(mut self, val: u16) -> Self {
        self.rx_dummy = val;
        self
    }

    /// set tx_dummy and return self
    #[inline]
    pub fn tx_dummy(mut self, val: u16) -> Self {
        self.tx_dummy = val;
        self
    }

    /// set cmd_length and return self
    #[inline]
    pub fn cmd_length(mut self, val: u8) -> Self {
        self.cmd_length = val;
        self
    }

    /// set addr_length and return self
    #[inline]
    pub fn addr_length(mut self, val: u8) -> Self {
        self.addr_length = val;
        self
    }
}

/// Identity of the logical device a request targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DevId {
    /// Chip-select index; selects the SER bit and the XIP region.
    pub dev_idx: u16,
    /// Software chip-select GPIO, if the line is not hardware driven.
    /// The value is an opaque pin identifier passed to
    /// [`MspiDwOs::ce_set`](crate::MspiDwOs::ce_set).
    pub ce_gpio: Option<u8>,
}

impl DevId {
    pub fn new(dev_idx: u16) -> DevId {
        DevId {
            dev_idx,
            ce_gpio: None,
        }
    }

    /// set ce_gpio and return self
    #[inline]
    pub fn ce_gpio(mut self, pin: u8) -> Self {
        self.ce_gpio = Some(pin);
        self
    }
}

impl Default for DevId {
    fn default() -> DevId {
        DevId {
            dev_idx: INVALID_DEV_IDX,
            ce_gpio: None,
        }
    }
}

/// Payload of one packet; the variant selects the transfer direction.
#[derive(Debug)]
pub enum Payload<'a> {
    /// Transmit the bytes of the slice.
    Tx(&'a [u8]),
    /// Receive into the slice, filling it completely.
    Rx(&'a mut [u8]),
}

impl Payload<'_> {
    /// Number of payload bytes moved by this packet
    pub fn len(&self) -> usize {
        match self {
            Payload::Tx(buf) => buf.len(),
            Payload::Rx(buf) => buf.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this payload transmits data
    pub fn is_tx(&self) -> bool {
        matches!(self, Payload::Tx(_))
    }
}

/// One directional data transfer with optional command/address phase.
#[derive(Debug)]
pub struct XferPacket<'a> {
    /// Command (opcode) sent before the address, if `cmd_length` > 0.
    pub cmd: u32,
    /// Address sent before the data, if `addr_length` > 0.
    pub address: u32,
    pub payload: Payload<'a>,
}

/// An ordered sequence of packets sharing one command/address-length and
/// dummy-cycle configuration.
#[derive(Debug)]
pub struct Xfer<'a, 'p> {
    pub packets: &'a mut [XferPacket<'p>],
    /// Command length in bytes: 0, 1 or 2.
    pub cmd_length: u8,
    /// Address length in bytes: 0 to 4.
    pub addr_length: u8,
    /// Dummy cycles inserted before receive data.
    pub rx_dummy: u16,
    /// Dummy cycles inserted after transmit control fields.
    pub tx_dummy: u16,
    /// Deadline applied to each packet, in milliseconds.
    pub timeout_ms: u32,
    /// Request a non-blocking transfer; not supported by this driver.
    pub async_mode: bool,
}

/// Memory-mapped (execute-in-place) access configuration for one
/// chip-select.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct XipCfg {
    /// Enable or disable the XIP mapping.
    pub enable: bool,
    /// Offset of the mapped window within the device.
    pub address_offset: u32,
    /// Size of the mapped window in bytes.
    pub size: u32,
}
