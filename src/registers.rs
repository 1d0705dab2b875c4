//! The official documentation: <https://www.synopsys.com/dw/ipdir.php?c=DW_ssi>

use core::ops::Deref;
use core::ptr::NonNull;

use tock_registers::register_bitfields;
use tock_registers::registers::{ReadOnly, ReadWrite};

/// DwSsiRegisters pointer wrapper
pub(crate) struct DwSsiRegistersRef {
    ptr: NonNull<DwSsiRegisters>,
}

impl DwSsiRegistersRef {
    /// Create a new `DwSsiRegistersRef` from a raw pointer
    ///
    /// ## Safety
    ///
    /// - `ptr` must be aligned, non-null, and dereferencable as `T`.
    /// - `*ptr` must be valid for the program duration.
    pub(crate) fn new(ptr: *mut u8) -> DwSsiRegistersRef {
        DwSsiRegistersRef {
            ptr: NonNull::new(ptr).expect("ptr is null").cast(),
        }
    }
}

impl Deref for DwSsiRegistersRef {
    type Target = DwSsiRegisters;

    fn deref(&self) -> &DwSsiRegisters {
        // SAFETY: `ptr` is aligned and dereferencable for the program
        // duration as promised by the caller of `DwSsiRegistersRef::new`.
        unsafe { self.ptr.as_ref() }
    }
}

#[repr(C)]
#[allow(non_snake_case)]
pub(crate) struct DwSsiRegisters {
    /// Control Register 0.
    pub(crate) CTRLR0: ReadWrite<u32, CTRLR0::Register>,
    /// Control Register 1 (number of data frames).
    pub(crate) CTRLR1: ReadWrite<u32, CTRLR1::Register>,
    /// SSI Enable Register.
    pub(crate) SSIENR: ReadWrite<u32, SSIENR::Register>,
    _reserved0: [u32; 1], // 0x0c MWCR, Microwire only
    /// Slave Enable Register.
    pub(crate) SER: ReadWrite<u32, SER::Register>,
    /// Baud Rate Select.
    pub(crate) BAUDR: ReadWrite<u32, BAUDR::Register>,
    /// Transmit FIFO Threshold Level.
    pub(crate) TXFTLR: ReadWrite<u32, TXFTLR::Register>,
    /// Receive FIFO Threshold Level.
    pub(crate) RXFTLR: ReadWrite<u32, RXFTLR::Register>,
    /// Transmit FIFO Level.
    pub(crate) TXFLR: ReadOnly<u32, TXFLR::Register>,
    /// Receive FIFO Level.
    pub(crate) RXFLR: ReadOnly<u32, RXFLR::Register>,
    /// Status Register.
    pub(crate) SR: ReadOnly<u32, SR::Register>,
    /// Interrupt Mask Register.
    pub(crate) IMR: ReadWrite<u32, INTR::Register>,
    /// Interrupt Status Register (masked).
    pub(crate) ISR: ReadOnly<u32, INTR::Register>,
    _reserved1: [u32; 11], // 0x34-0x5c raw status, clear and DMA registers
    /// Data Register (first of the DRx window).
    pub(crate) DR: ReadWrite<u32, DR::Register>,
    _reserved2: [u32; 36], // 0x64-0xf0 remaining DRx, RX sample delay
    /// SPI Control Register (enhanced SPI modes).
    pub(crate) SPI_CTRLR0: ReadWrite<u32, SPI_CTRLR0::Register>,
    _reserved3: [u32; 2], // 0xf8-0xfc
    /// XIP INCR transfer opcode.
    pub(crate) XIP_INCR_INST: ReadWrite<u32, XIP_INST::Register>,
    /// XIP WRAP transfer opcode.
    pub(crate) XIP_WRAP_INST: ReadWrite<u32, XIP_INST::Register>,
    /// XIP Control Register (read path).
    pub(crate) XIP_CTRL: ReadWrite<u32, XIP_CTRL::Register>,
    _reserved4: [u32; 13], // 0x10c-0x13c
    /// XIP write INCR transfer opcode.
    pub(crate) XIP_WRITE_INCR_INST: ReadWrite<u32, XIP_INST::Register>,
    /// XIP write WRAP transfer opcode.
    pub(crate) XIP_WRITE_WRAP_INST: ReadWrite<u32, XIP_INST::Register>,
    /// XIP Write Control Register.
    pub(crate) XIP_WRITE_CTRL: ReadWrite<u32, XIP_WRITE_CTRL::Register>,
}

register_bitfields![u32,
    pub(crate) CTRLR0 [
        /// Data frame size, in bits minus one.
        DFS OFFSET(0) NUMBITS(5) [],
        /// Frame format (protocol).
        FRF OFFSET(6) NUMBITS(2) [
            MotorolaSpi = 0,
        ],
        /// Serial clock phase.
        SCPH OFFSET(8) NUMBITS(1) [],
        /// Serial clock polarity.
        SCPOL OFFSET(9) NUMBITS(1) [],
        /// Transfer mode.
        TMOD OFFSET(10) NUMBITS(2) [
            TxAndRx = 0,
            TxOnly = 1,
            RxOnly = 2,
            EepromRead = 3,
        ],
        /// SPI frame format (number of data lines).
        SPI_FRF OFFSET(22) NUMBITS(2) [
            Standard = 0,
            Dual = 1,
            Quad = 2,
            Octal = 3,
        ],
    ],

    pub(crate) CTRLR1 [
        /// Number of data frames minus one.
        NDF OFFSET(0) NUMBITS(16) [],
    ],

    pub(crate) SSIENR [
        SSIC_EN OFFSET(0) NUMBITS(1) [],
    ],

    pub(crate) SER [
        SER OFFSET(0) NUMBITS(16) [],
    ],

    pub(crate) BAUDR [
        /// Clock divider; SCLK = SSI_CLK / SCKDV.
        SCKDV OFFSET(0) NUMBITS(16) [],
    ],

    pub(crate) TXFTLR [
        /// Transmit FIFO threshold (interrupt trigger level).
        TFT OFFSET(0) NUMBITS(8) [],
        /// Transfer start FIFO level.
        TXFTHR OFFSET(16) NUMBITS(8) [],
    ],

    pub(crate) RXFTLR [
        /// Receive FIFO threshold (interrupt trigger level).
        RFT OFFSET(0) NUMBITS(8) [],
    ],

    pub(crate) TXFLR [
        TXTFL OFFSET(0) NUMBITS(8) [],
    ],

    pub(crate) RXFLR [
        RXTFL OFFSET(0) NUMBITS(8) [],
    ],

    pub(crate) SR [
        BUSY OFFSET(0) NUMBITS(1) [],
        TFNF OFFSET(1) NUMBITS(1) [],
        TFE OFFSET(2) NUMBITS(1) [],
        RFNE OFFSET(3) NUMBITS(1) [],
        RFF OFFSET(4) NUMBITS(1) [],
    ],

    /// Shared layout of IMR and ISR.
    pub(crate) INTR [
        /// Transmit FIFO empty.
        TXEI OFFSET(0) NUMBITS(1) [],
        /// Transmit FIFO overflow.
        TXOI OFFSET(1) NUMBITS(1) [],
        /// Receive FIFO underflow.
        RXUI OFFSET(2) NUMBITS(1) [],
        /// Receive FIFO overflow.
        RXOI OFFSET(3) NUMBITS(1) [],
        /// Receive FIFO full (threshold reached).
        RXFI OFFSET(4) NUMBITS(1) [],
        /// Multi-master contention.
        MSTI OFFSET(5) NUMBITS(1) [],
    ],

    pub(crate) DR [
        DR OFFSET(0) NUMBITS(32) [],
    ],

    pub(crate) SPI_CTRLR0 [
        /// How the instruction and address fields are transferred.
        TRANS_TYPE OFFSET(0) NUMBITS(2) [
            /// Instruction and address both in standard SPI mode.
            Tt0 = 0,
            /// Instruction in standard SPI mode, address as data.
            Tt1 = 1,
            /// Instruction and address both as data.
            Tt2 = 2,
        ],
        /// Address length, in 4-bit increments.
        ADDR_L OFFSET(2) NUMBITS(4) [],
        /// Instruction length.
        INST_L OFFSET(8) NUMBITS(2) [
            L0 = 0,
            L4 = 1,
            L8 = 2,
            L16 = 3,
        ],
        /// Wait (dummy) cycles between control and data phases.
        WAIT_CYCLES OFFSET(11) NUMBITS(5) [],
        /// Stretch the serial clock when the FIFO runs dry/full.
        CLK_STRETCH_EN OFFSET(30) NUMBITS(1) [],
    ],

    pub(crate) XIP_INST [
        INST OFFSET(0) NUMBITS(16) [],
    ],

    pub(crate) XIP_CTRL [
        FRF OFFSET(0) NUMBITS(2) [
            Dual = 1,
            Quad = 2,
            Octal = 3,
        ],
        TRANS_TYPE OFFSET(2) NUMBITS(2) [
            Tt0 = 0,
            Tt1 = 1,
            Tt2 = 2,
        ],
        ADDR_L OFFSET(4) NUMBITS(4) [],
        INST_L OFFSET(9) NUMBITS(2) [
            L0 = 0,
            L4 = 1,
            L8 = 2,
            L16 = 3,
        ],
        WAIT_CYCLES OFFSET(13) NUMBITS(5) [],
        /// Send the instruction phase on XIP fetches.
        INST_EN OFFSET(22) NUMBITS(1) [],
    ],

    pub(crate) XIP_WRITE_CTRL [
        FRF OFFSET(0) NUMBITS(2) [
            Dual = 1,
            Quad = 2,
            Octal = 3,
        ],
        TRANS_TYPE OFFSET(2) NUMBITS(2) [
            Tt0 = 0,
            Tt1 = 1,
            Tt2 = 2,
        ],
        ADDR_L OFFSET(4) NUMBITS(4) [],
        INST_L OFFSET(8) NUMBITS(2) [
            L0 = 0,
            L4 = 1,
            L8 = 2,
            L16 = 3,
        ],
        WAIT_CYCLES OFFSET(16) NUMBITS(5) [],
    ],
];

/// Maximum value of the SPI_CTRLR0 WAIT_CYCLES field.
pub(crate) const WAIT_CYCLES_MAX: u32 = 31;

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;

    #[test]
    fn register_offsets_match_the_map() {
        assert_eq!(offset_of!(DwSsiRegisters, CTRLR0), 0x00);
        assert_eq!(offset_of!(DwSsiRegisters, CTRLR1), 0x04);
        assert_eq!(offset_of!(DwSsiRegisters, SSIENR), 0x08);
        assert_eq!(offset_of!(DwSsiRegisters, SER), 0x10);
        assert_eq!(offset_of!(DwSsiRegisters, BAUDR), 0x14);
        assert_eq!(offset_of!(DwSsiRegisters, TXFTLR), 0x18);
        assert_eq!(offset_of!(DwSsiRegisters, RXFTLR), 0x1c);
        assert_eq!(offset_of!(DwSsiRegisters, TXFLR), 0x20);
        assert_eq!(offset_of!(DwSsiRegisters, RXFLR), 0x24);
        assert_eq!(offset_of!(DwSsiRegisters, SR), 0x28);
        assert_eq!(offset_of!(DwSsiRegisters, IMR), 0x2c);
        assert_eq!(offset_of!(DwSsiRegisters, ISR), 0x30);
        assert_eq!(offset_of!(DwSsiRegisters, DR), 0x60);
        assert_eq!(offset_of!(DwSsiRegisters, SPI_CTRLR0), 0xf4);
        assert_eq!(offset_of!(DwSsiRegisters, XIP_INCR_INST), 0x100);
        assert_eq!(offset_of!(DwSsiRegisters, XIP_WRAP_INST), 0x104);
        assert_eq!(offset_of!(DwSsiRegisters, XIP_CTRL), 0x108);
        assert_eq!(offset_of!(DwSsiRegisters, XIP_WRITE_INCR_INST), 0x140);
        assert_eq!(offset_of!(DwSsiRegisters, XIP_WRITE_WRAP_INST), 0x144);
        assert_eq!(offset_of!(DwSsiRegisters, XIP_WRITE_CTRL), 0x148);
    }
}
