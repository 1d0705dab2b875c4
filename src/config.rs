//! Transfer configuration builder
//!
//! Pure derivation of the control-register bit fields from a logical
//! device configuration. The same field encodings apply to both the
//! live-transfer register bank (CTRLR0/SPI_CTRLR0) and the XIP register
//! bank, so the lookup tables live here and return plain values; the
//! driver commits them to whichever bank is being programmed.

use tock_registers::LocalRegisterCopy;

use crate::common::{Error, IoMode, Result};
use crate::registers::{XIP_CTRL, XIP_WRITE_CTRL};

/// Frame format: number of data lines used for the data phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum FrameFormat {
    Standard,
    Dual,
    Quad,
    Octal,
}

impl FrameFormat {
    /// Field encoding, shared by CTRLR0.SPI_FRF and the XIP FRF fields
    pub(crate) fn code(self) -> u32 {
        match self {
            FrameFormat::Standard => 0,
            FrameFormat::Dual => 1,
            FrameFormat::Quad => 2,
            FrameFormat::Octal => 3,
        }
    }
}

/// How the instruction and address phases go out on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum TransferType {
    /// Instruction and address both in standard SPI mode.
    Standard,
    /// Instruction in standard SPI mode, address as data.
    AddressAsData,
    /// Instruction and address both as data.
    AllAsData,
}

impl TransferType {
    /// TRANS_TYPE field encoding, shared by SPI_CTRLR0 and XIP banks
    pub(crate) fn code(self) -> u32 {
        match self {
            TransferType::Standard => 0,
            TransferType::AddressAsData => 1,
            TransferType::AllAsData => 2,
        }
    }
}

/// Bit-layout relevant properties of an I/O mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct IoModeLayout {
    pub(crate) format: FrameFormat,
    pub(crate) trans_type: TransferType,
}

impl IoModeLayout {
    pub(crate) fn is_standard_spi(&self) -> bool {
        self.format == FrameFormat::Standard
    }
}

/// Map an I/O mode to its frame format and transfer type.
///
/// Modes this controller cannot express (the hex family) are rejected.
pub(crate) fn io_mode_layout(io_mode: IoMode) -> Result<IoModeLayout> {
    let format = match io_mode {
        IoMode::Single => FrameFormat::Standard,
        IoMode::Dual | IoMode::Dual112 | IoMode::Dual122 => FrameFormat::Dual,
        IoMode::Quad | IoMode::Quad114 | IoMode::Quad144 => FrameFormat::Quad,
        IoMode::Octal | IoMode::Octal118 | IoMode::Octal188 => FrameFormat::Octal,
        _ => {
            log::error!("IO mode {:?} not supported", io_mode);
            return Err(Error::InvalidArgument);
        }
    };

    let trans_type = match io_mode {
        IoMode::Dual112 | IoMode::Quad114 | IoMode::Octal118 => TransferType::Standard,
        IoMode::Dual122 | IoMode::Quad144 | IoMode::Octal188 => TransferType::AddressAsData,
        _ => TransferType::AllAsData,
    };

    Ok(IoModeLayout { format, trans_type })
}

/// Encode a command length in bytes into the INST_L field value.
pub(crate) fn cmd_length_code(cmd_length: u8) -> Result<u32> {
    match cmd_length {
        0 => Ok(0), // no instruction phase
        1 => Ok(2), // 8-bit instruction
        2 => Ok(3), // 16-bit instruction
        _ => {
            log::error!("Command length {} not supported", cmd_length);
            Err(Error::InvalidArgument)
        }
    }
}

/// Encode an address length in bytes into the ADDR_L field value.
///
/// The field counts 4-bit increments, hence the linear `length * 2`.
pub(crate) fn addr_length_code(addr_length: u8) -> Result<u32> {
    if addr_length > 4 {
        log::error!("Address length {} not supported", addr_length);
        return Err(Error::InvalidArgument);
    }

    Ok(u32::from(addr_length) * 2)
}

/// Parameters of a memory-mapped (XIP) access configuration.
///
/// `stored` holds whatever `configure_device` saw most recently; a
/// frozen copy becomes `active` when XIP is enabled.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub(crate) struct XipParams {
    pub(crate) read_cmd: u32,
    pub(crate) write_cmd: u32,
    pub(crate) rx_dummy: u16,
    pub(crate) tx_dummy: u16,
    pub(crate) cmd_length: u8,
    pub(crate) addr_length: u8,
    pub(crate) io_mode: IoMode,
}

/// Values for the read-path and write-path XIP control registers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct XipCtrl {
    pub(crate) read: u32,
    pub(crate) write: u32,
}

/// Derive both XIP control registers from one parameter set.
///
/// Single-line mode has no continuous-read register scheme on this
/// controller and is rejected outright.
pub(crate) fn build_xip_ctrl(params: &XipParams) -> Result<XipCtrl> {
    let layout = io_mode_layout(params.io_mode)?;

    if layout.is_standard_spi() {
        log::error!("XIP not available in single line mode");
        return Err(Error::InvalidArgument);
    }

    let inst_l = cmd_length_code(params.cmd_length)?;
    let addr_l = addr_length_code(params.addr_length)?;

    let mut read = LocalRegisterCopy::<u32, XIP_CTRL::Register>::new(0);
    let mut write = LocalRegisterCopy::<u32, XIP_WRITE_CTRL::Register>::new(0);

    read.modify(
        XIP_CTRL::FRF.val(layout.format.code())
            + XIP_CTRL::TRANS_TYPE.val(layout.trans_type.code())
            + XIP_CTRL::INST_L.val(inst_l)
            + XIP_CTRL::ADDR_L.val(addr_l)
            + XIP_CTRL::WAIT_CYCLES.val(u32::from(params.rx_dummy)),
    );
    if params.cmd_length != 0 {
        read.modify(XIP_CTRL::INST_EN::SET);
    }

    write.modify(
        XIP_WRITE_CTRL::FRF.val(layout.format.code())
            + XIP_WRITE_CTRL::TRANS_TYPE.val(layout.trans_type.code())
            + XIP_WRITE_CTRL::INST_L.val(inst_l)
            + XIP_WRITE_CTRL::ADDR_L.val(addr_l)
            + XIP_WRITE_CTRL::WAIT_CYCLES.val(u32::from(params.tx_dummy)),
    );

    Ok(XipCtrl {
        read: read.get(),
        write: write.get(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_is_the_only_standard_spi_mode() {
        assert!(io_mode_layout(IoMode::Single).unwrap().is_standard_spi());

        for mode in [
            IoMode::Dual,
            IoMode::Dual112,
            IoMode::Dual122,
            IoMode::Quad,
            IoMode::Quad114,
            IoMode::Quad144,
            IoMode::Octal,
            IoMode::Octal118,
            IoMode::Octal188,
        ] {
            assert!(!io_mode_layout(mode).unwrap().is_standard_spi());
        }
    }

    #[test]
    fn frame_format_follows_the_line_count() {
        for (mode, format) in [
            (IoMode::Dual, FrameFormat::Dual),
            (IoMode::Dual112, FrameFormat::Dual),
            (IoMode::Dual122, FrameFormat::Dual),
            (IoMode::Quad, FrameFormat::Quad),
            (IoMode::Quad114, FrameFormat::Quad),
            (IoMode::Quad144, FrameFormat::Quad),
            (IoMode::Octal, FrameFormat::Octal),
            (IoMode::Octal118, FrameFormat::Octal),
            (IoMode::Octal188, FrameFormat::Octal),
        ] {
            assert_eq!(io_mode_layout(mode).unwrap().format, format);
        }
    }

    #[test]
    fn transfer_type_follows_the_control_phase_lines() {
        for (mode, tt) in [
            (IoMode::Dual112, TransferType::Standard),
            (IoMode::Quad114, TransferType::Standard),
            (IoMode::Octal118, TransferType::Standard),
            (IoMode::Dual122, TransferType::AddressAsData),
            (IoMode::Quad144, TransferType::AddressAsData),
            (IoMode::Octal188, TransferType::AddressAsData),
            (IoMode::Dual, TransferType::AllAsData),
            (IoMode::Quad, TransferType::AllAsData),
            (IoMode::Octal, TransferType::AllAsData),
        ] {
            assert_eq!(io_mode_layout(mode).unwrap().trans_type, tt);
        }
    }

    #[test]
    fn hex_modes_are_rejected() {
        for mode in [IoMode::Hex, IoMode::Hex8816, IoMode::Hex81616] {
            assert_eq!(io_mode_layout(mode), Err(Error::InvalidArgument));
        }
    }

    #[test]
    fn cmd_length_encoding() {
        assert_eq!(cmd_length_code(0), Ok(0));
        assert_eq!(cmd_length_code(1), Ok(2));
        assert_eq!(cmd_length_code(2), Ok(3));
        assert_eq!(cmd_length_code(3), Err(Error::InvalidArgument));
        assert_eq!(cmd_length_code(255), Err(Error::InvalidArgument));
    }

    #[test]
    fn addr_length_encoding_is_linear() {
        for len in 0..=4u8 {
            assert_eq!(addr_length_code(len), Ok(u32::from(len) * 2));
        }
        assert_eq!(addr_length_code(5), Err(Error::InvalidArgument));
    }

    #[test]
    fn xip_rejects_single_line_mode() {
        let params = XipParams {
            io_mode: IoMode::Single,
            ..Default::default()
        };
        assert_eq!(build_xip_ctrl(&params), Err(Error::InvalidArgument));
    }

    #[test]
    fn xip_ctrl_fields() {
        let params = XipParams {
            read_cmd: 0xEB,
            write_cmd: 0x38,
            rx_dummy: 6,
            tx_dummy: 2,
            cmd_length: 1,
            addr_length: 3,
            io_mode: IoMode::Quad144,
        };
        let ctrl = build_xip_ctrl(&params).unwrap();

        let read = LocalRegisterCopy::<u32, XIP_CTRL::Register>::new(ctrl.read);
        assert_eq!(read.read(XIP_CTRL::FRF), 2);
        assert_eq!(read.read(XIP_CTRL::TRANS_TYPE), 1);
        assert_eq!(read.read(XIP_CTRL::INST_L), 2);
        assert_eq!(read.read(XIP_CTRL::ADDR_L), 6);
        assert_eq!(read.read(XIP_CTRL::WAIT_CYCLES), 6);
        assert!(read.is_set(XIP_CTRL::INST_EN));

        let write = LocalRegisterCopy::<u32, XIP_WRITE_CTRL::Register>::new(ctrl.write);
        assert_eq!(write.read(XIP_WRITE_CTRL::FRF), 2);
        assert_eq!(write.read(XIP_WRITE_CTRL::TRANS_TYPE), 1);
        assert_eq!(write.read(XIP_WRITE_CTRL::INST_L), 2);
        assert_eq!(write.read(XIP_WRITE_CTRL::ADDR_L), 6);
        assert_eq!(write.read(XIP_WRITE_CTRL::WAIT_CYCLES), 2);
    }

    #[test]
    fn xip_inst_phase_disabled_without_command() {
        let params = XipParams {
            cmd_length: 0,
            addr_length: 3,
            io_mode: IoMode::Quad,
            ..Default::default()
        };
        let ctrl = build_xip_ctrl(&params).unwrap();
        let read = LocalRegisterCopy::<u32, XIP_CTRL::Register>::new(ctrl.read);
        assert!(!read.is_set(XIP_CTRL::INST_EN));
        assert_eq!(read.read(XIP_CTRL::INST_L), 0);
    }
}
