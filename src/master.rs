//! The DW SSI MSPI driver
//!
//! Owns the controller registers and the per-instance runtime state and
//! implements the MSPI operations: device configuration, packet
//! transfers and XIP control.
//!
//! A transfer runs one packet at a time. The foreground call programs
//! the controller and primes the FIFO, then the interrupt service
//! advances the byte cursor until the packet completes. The service
//! runs in the calling context, woken per controller interrupt through
//! [`MspiDwOs::wait_for_irq`]; the hardware interrupt handler only acks
//! at the vendor level and signals that wait.

use tock_registers::fields::FieldValue;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::LocalRegisterCopy;

use crate::common::{
    CePolarity, CppMode, DataRate, DevId, DeviceConfig, DeviceConfigMask, Endian, Error, Payload,
    Result, Xfer, XferPacket, XipCfg,
};
use crate::config::{self, XipParams};
use crate::platform::{MspiDwOs, MspiDwVendor};
use crate::registers::{
    DwSsiRegistersRef, CTRLR0, CTRLR1, INTR, RXFLR, RXFTLR, SPI_CTRLR0, SR, SSIENR, TXFLR, TXFTLR,
    WAIT_CYCLES_MAX,
};
use crate::MspiDwDriverConfig;

/// Filler written to the TX FIFO when clock edges are needed without
/// meaningful data.
const DUMMY_BYTE: u32 = 0xAA;

/// Cap on the end-of-packet poll of the BUSY flag.
const BUSY_SPIN_LIMIT: u32 = 100_000;

/// Packets of this many bytes or more are rejected.
const MAX_PACKET_BYTES: usize = u16::MAX as usize;

/// Chip-select lines addressable through SER (and the XIP bitmap).
const CE_LINES_MAX: u16 = 16;

/// Where the in-flight packet stands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Shifting out dummy TX bytes to generate clock edges for the
    /// receive path of a standard-SPI read.
    Priming,
    /// Moving payload bytes through the FIFOs.
    Streaming,
    Done,
}

/// Per-packet engine state, reset when a packet starts.
#[derive(Debug)]
struct PacketState {
    phase: Phase,
    /// Byte cursor into the packet payload; `buf_pos <= buf_len`.
    buf_pos: usize,
    buf_len: usize,
    /// Dummy TX bytes still to shift out while priming.
    dummy_bytes: u16,
    /// Leading RX bytes to drop (command/address echo).
    bytes_to_discard: u8,
    bytes_per_frame: u8,
}

impl PacketState {
    fn new() -> PacketState {
        PacketState {
            phase: Phase::Idle,
            buf_pos: 0,
            buf_len: 0,
            dummy_bytes: 0,
            bytes_to_discard: 0,
            bytes_per_frame: 1,
        }
    }
}

/// Per-transfer parameters shared by all packets of one `transceive`.
struct XferParams {
    cmd_length: u8,
    addr_length: u8,
    rx_dummy: u16,
    tx_dummy: u16,
    timeout_ms: u32,
}

/// Pack up to four payload bytes into one frame, big endian.
fn pack_frame(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

/// Unpack one received frame into payload bytes, big endian.
fn unpack_frame(data: u32, bytes: &mut [u8]) {
    let mut shift = 8 * bytes.len();
    for byte in bytes {
        shift -= 8;
        *byte = (data >> shift) as u8;
    }
}

/// The DW SSI MSPI driver
pub struct MspiDwDriver<V, O> {
    regs: DwSsiRegistersRef,
    config: MspiDwDriverConfig,
    vendor: V,
    os: O,

    /// Shadow of CTRLR0; rebuilt incrementally, rewritten per packet.
    ctrlr0: LocalRegisterCopy<u32, CTRLR0::Register>,
    /// Shadow of SPI_CTRLR0.
    spi_ctrlr0: LocalRegisterCopy<u32, SPI_CTRLR0::Register>,
    baudr: u32,
    standard_spi: bool,

    xip_freq: u32,
    xip_cpp: CppMode,
    xip_params_stored: XipParams,
    xip_params_active: XipParams,
    /// Bitmap of chip-select indices with live XIP access.
    xip_enabled: u16,

    packets_done: u32,
    packet: PacketState,
    dev_id: DevId,
}

unsafe impl<V: Send, O: Send> Send for MspiDwDriver<V, O> {}
unsafe impl<V: Sync, O: Sync> Sync for MspiDwDriver<V, O> {}

impl<V: MspiDwVendor, O: MspiDwOs> MspiDwDriver<V, O> {
    /// Create a new driver over the controller at `base_addr`
    pub fn new(
        config: MspiDwDriverConfig,
        base_addr: *mut u8,
        vendor: V,
        os: O,
    ) -> MspiDwDriver<V, O> {
        MspiDwDriver {
            regs: DwSsiRegistersRef::new(base_addr),
            config,
            vendor,
            os,
            ctrlr0: LocalRegisterCopy::new(0),
            spi_ctrlr0: LocalRegisterCopy::new(0),
            baudr: 0,
            standard_spi: false,
            xip_freq: 0,
            xip_cpp: CppMode::Mode0,
            xip_params_stored: XipParams::default(),
            xip_params_active: XipParams::default(),
            xip_enabled: 0,
            packets_done: 0,
            packet: PacketState::new(),
            dev_id: DevId::default(),
        }
    }

    /// One-time hardware bring-up
    pub fn setup(&mut self) -> Result<()> {
        self.vendor.init();

        self.dev_id = DevId::default();

        for &pin in self.config.ce_gpio_list() {
            self.os.ce_configure(pin)?;
        }

        log::info!(
            "DW SSI fifo depth RX:TX = {}:{}",
            self.config.rx_fifo_depth_value(),
            self.config.tx_fifo_depth(),
        );
        Ok(())
    }

    /// Link-level configuration; this controller has none.
    pub fn configure_link(&mut self) -> Result<()> {
        Err(Error::Unsupported)
    }

    /// Per-channel busy state; this driver tracks none, channels are
    /// always ready.
    pub fn channel_status(&self, _ch: u8) -> Result<()> {
        Ok(())
    }

    /// Index of the packet currently (or last) in flight within the
    /// active transfer
    pub fn packets_done(&self) -> u32 {
        self.packets_done
    }

    /// Apply the device parameters named by `param_mask`.
    ///
    /// Validation happens before any register write; the merged shadow
    /// registers are committed at the end, under an interrupt-masked
    /// enable cycle when XIP is live.
    pub fn configure_device(
        &mut self,
        dev_id: &DevId,
        param_mask: DeviceConfigMask,
        cfg: &DeviceConfig,
    ) -> Result<()> {
        if dev_id.dev_idx >= CE_LINES_MAX {
            log::error!("Invalid chip-select index: {}", dev_id.dev_idx);
            return Err(Error::InvalidArgument);
        }

        let xip_enabled = self.xip_enabled != 0;
        let mut baudr = 0u32;

        if param_mask.contains(DeviceConfigMask::ENDIAN) && cfg.endian != Endian::Big {
            log::error!("Only big endian transfers are supported");
            return Err(Error::Unsupported);
        }

        if param_mask.contains(DeviceConfigMask::CE_POLARITY)
            && cfg.ce_polarity != CePolarity::ActiveLow
        {
            log::error!("Only active low CE is supported");
            return Err(Error::Unsupported);
        }

        if param_mask.contains(DeviceConfigMask::MEM_BOUNDARY) && cfg.mem_boundary != 0 {
            log::error!("Auto CE break is not supported");
            return Err(Error::Unsupported);
        }

        if param_mask.contains(DeviceConfigMask::BREAK_TIME) && cfg.time_to_break != 0 {
            log::error!("Auto CE break is not supported");
            return Err(Error::Unsupported);
        }

        if param_mask.contains(DeviceConfigMask::IO_MODE) {
            self.xip_params_stored.io_mode = cfg.io_mode;

            let layout = config::io_mode_layout(cfg.io_mode)?;
            self.standard_spi = layout.is_standard_spi();
            self.ctrlr0
                .modify(CTRLR0::SPI_FRF.val(layout.format.code()));
            self.spi_ctrlr0
                .modify(SPI_CTRLR0::TRANS_TYPE.val(layout.trans_type.code()));
        }

        if param_mask.contains(DeviceConfigMask::CPP) {
            // The new setting must be compatible with the one already
            // committed to XIP, if any.
            if self.xip_enabled == 0 {
                self.xip_cpp = cfg.cpp;
            } else if self.xip_cpp != cfg.cpp {
                log::error!("Conflict with configuration used for XIP");
                return Err(Error::Conflict);
            }

            let (scpol, scph) = match cfg.cpp {
                CppMode::Mode0 => (0, 0),
                CppMode::Mode1 => (0, 1),
                CppMode::Mode2 => (1, 0),
                CppMode::Mode3 => (1, 1),
            };
            self.ctrlr0
                .modify(CTRLR0::SCPOL.val(scpol) + CTRLR0::SCPH.val(scph));
        }

        if param_mask.contains(DeviceConfigMask::FREQUENCY) {
            let clock = self.config.clock_frequency();

            if cfg.freq > clock / 2 || cfg.freq < clock / 65534 {
                log::error!(
                    "Invalid frequency: {}, MIN: {}, MAX: {}",
                    cfg.freq,
                    clock / 65534,
                    clock / 2
                );
                return Err(Error::InvalidArgument);
            }

            // Same compatibility rule as for the clock mode.
            if self.xip_enabled == 0 {
                self.xip_freq = cfg.freq;
            } else if self.xip_freq != cfg.freq {
                log::error!("Conflict with configuration used for XIP");
                return Err(Error::Conflict);
            }

            baudr = clock / cfg.freq;
        }

        if param_mask.contains(DeviceConfigMask::DATA_RATE) && cfg.data_rate != DataRate::Single {
            log::error!("Only single data rate is supported");
            return Err(Error::Unsupported);
        }

        if param_mask.contains(DeviceConfigMask::DQS) && cfg.dqs_enable {
            log::error!("DQS sampling is not supported");
            return Err(Error::Unsupported);
        }

        if param_mask.contains(DeviceConfigMask::READ_CMD) {
            self.xip_params_stored.read_cmd = cfg.read_cmd;
        }
        if param_mask.contains(DeviceConfigMask::WRITE_CMD) {
            self.xip_params_stored.write_cmd = cfg.write_cmd;
        }
        if param_mask.contains(DeviceConfigMask::RX_DUMMY) {
            self.xip_params_stored.rx_dummy = cfg.rx_dummy;
        }
        if param_mask.contains(DeviceConfigMask::TX_DUMMY) {
            self.xip_params_stored.tx_dummy = cfg.tx_dummy;
        }
        if param_mask.contains(DeviceConfigMask::CMD_LENGTH) {
            self.xip_params_stored.cmd_length = cfg.cmd_length;
        }
        if param_mask.contains(DeviceConfigMask::ADDR_LENGTH) {
            self.xip_params_stored.addr_length = cfg.addr_length;
        }

        // Always Motorola SPI frame format, with clock stretching.
        self.ctrlr0.modify(CTRLR0::FRF::MotorolaSpi);
        self.spi_ctrlr0.modify(SPI_CTRLR0::CLK_STRETCH_EN::SET);

        if xip_enabled {
            self.os.irq_lock();
            self.regs.SSIENR.set(0);
        }

        if baudr != 0 {
            self.baudr = baudr;
            self.regs.BAUDR.set(self.baudr);
        }
        self.regs.CTRLR0.set(self.ctrlr0.get());
        self.regs.SPI_CTRLR0.set(self.spi_ctrlr0.get());
        self.regs.SER.set(1 << dev_id.dev_idx);

        if xip_enabled {
            self.regs.SSIENR.write(SSIENR::SSIC_EN::SET);
            self.os.irq_unlock();
        }

        self.dev_id = *dev_id;

        Ok(())
    }

    /// Execute the packets of `xfer` in order.
    ///
    /// The first failing packet aborts the transfer; the per-packet
    /// timeout is `xfer.timeout_ms`.
    pub fn transceive(&mut self, dev_id: &DevId, xfer: &mut Xfer<'_, '_>) -> Result<()> {
        if dev_id.dev_idx != self.dev_id.dev_idx {
            return Err(Error::DeviceMismatch);
        }

        if xfer.async_mode {
            return Err(Error::Unsupported);
        }

        let inst_l = config::cmd_length_code(xfer.cmd_length)?;
        let addr_l = config::addr_length_code(xfer.addr_length)?;
        self.spi_ctrlr0.modify(
            SPI_CTRLR0::WAIT_CYCLES.val(0)
                + SPI_CTRLR0::INST_L.val(inst_l)
                + SPI_CTRLR0::ADDR_L.val(addr_l),
        );

        if self.standard_spi {
            // Dummy cycles are emulated with whole dummy bytes here.
            if xfer.rx_dummy % 8 != 0 || xfer.tx_dummy % 8 != 0 {
                return Err(Error::InvalidArgument);
            }
        } else if u32::from(xfer.rx_dummy) > WAIT_CYCLES_MAX
            || u32::from(xfer.tx_dummy) > WAIT_CYCLES_MAX
        {
            return Err(Error::InvalidArgument);
        }

        let params = XferParams {
            cmd_length: xfer.cmd_length,
            addr_length: xfer.addr_length,
            rx_dummy: xfer.rx_dummy,
            tx_dummy: xfer.tx_dummy,
            timeout_ms: xfer.timeout_ms,
        };

        self.packets_done = 0;
        for packet in xfer.packets.iter_mut() {
            self.start_next_packet(&params, packet)?;
            self.packets_done += 1;
        }

        Ok(())
    }

    /// Enable or disable memory-mapped access for one chip-select.
    pub fn configure_xip(&mut self, dev_id: &DevId, cfg: &XipCfg) -> Result<()> {
        if dev_id.dev_idx >= CE_LINES_MAX {
            log::error!("Invalid chip-select index: {}", dev_id.dev_idx);
            return Err(Error::InvalidArgument);
        }

        if dev_id.dev_idx != self.dev_id.dev_idx {
            return Err(Error::DeviceMismatch);
        }

        if !cfg.enable {
            self.vendor.xip_disable(dev_id, cfg)?;

            self.xip_enabled &= !(1 << dev_id.dev_idx);

            if self.xip_enabled == 0 {
                self.regs.SSIENR.set(0);
            }

            return Ok(());
        }

        if self.xip_enabled == 0 {
            self.xip_params_active = self.xip_params_stored;

            let ctrl = config::build_xip_ctrl(&self.xip_params_active)?;
            let params = &self.xip_params_active;

            self.regs.XIP_INCR_INST.set(params.read_cmd);
            self.regs.XIP_WRAP_INST.set(params.read_cmd);
            self.regs.XIP_CTRL.set(ctrl.read);
            self.regs.XIP_WRITE_INCR_INST.set(params.write_cmd);
            self.regs.XIP_WRITE_WRAP_INST.set(params.write_cmd);
            self.regs.XIP_WRITE_CTRL.set(ctrl.write);
        } else if self.xip_params_active.read_cmd != self.xip_params_stored.read_cmd
            || self.xip_params_active.write_cmd != self.xip_params_stored.write_cmd
            || self.xip_params_active.cmd_length != self.xip_params_stored.cmd_length
            || self.xip_params_active.addr_length != self.xip_params_stored.addr_length
            || self.xip_params_active.rx_dummy != self.xip_params_stored.rx_dummy
            || self.xip_params_active.tx_dummy != self.xip_params_stored.tx_dummy
        {
            log::error!("Conflict with configuration already used for XIP");
            return Err(Error::Conflict);
        }

        self.vendor.xip_enable(dev_id, cfg)?;

        self.regs.SSIENR.write(SSIENR::SSIC_EN::SET);

        self.xip_enabled |= 1 << dev_id.dev_idx;

        Ok(())
    }

    /// Program the controller for one packet, prime the FIFO and wait
    /// for the interrupt service to finish the packet.
    fn start_next_packet(&mut self, params: &XferParams, packet: &mut XferPacket<'_>) -> Result<()> {
        let num_bytes = packet.payload.len();

        if num_bytes == 0 && params.cmd_length == 0 && params.addr_length == 0 {
            return Ok(());
        }

        if num_bytes >= MAX_PACKET_BYTES {
            return Err(Error::InvalidArgument);
        }

        self.packet.dummy_bytes = 0;
        self.packet.bytes_to_discard = 0;

        // Receive-only and standard-SPI packets always use single-byte
        // frames; multi-line transmits widen when the length divides
        // evenly. Byte order within a frame stays big endian either way.
        let bytes_per_frame: usize = if self.standard_spi || !packet.payload.is_tx() {
            1
        } else if num_bytes % 4 == 0 {
            4
        } else if num_bytes % 2 == 0 {
            2
        } else {
            1
        };
        self.packet.bytes_per_frame = bytes_per_frame as u8;
        self.ctrlr0
            .modify(CTRLR0::DFS.val(8 * bytes_per_frame as u32 - 1));

        let mut imr: FieldValue<u32, INTR::Register>;
        let txei_enabled;
        let tx_fifo_threshold;

        if packet.payload.is_tx() || num_bytes == 0 {
            imr = INTR::TXEI::SET;
            txei_enabled = true;
            self.ctrlr0.modify(CTRLR0::TMOD::TxOnly);
            self.spi_ctrlr0
                .modify(SPI_CTRLR0::WAIT_CYCLES.val(u32::from(params.tx_dummy)));

            self.regs.RXFTLR.set(0);
            tx_fifo_threshold = self.config.tx_fifo_threshold_value();
        } else {
            let rx_fifo_threshold;

            // In standard SPI mode the controller cannot send the
            // command and address as separate control fields; they go
            // out as data in TX/RX mode, dummy bytes provide the clock
            // edges for the receive part, and the echoed control bytes
            // are discarded from the receive stream.
            if self.standard_spi && (params.cmd_length != 0 || params.addr_length != 0) {
                self.packet.bytes_to_discard = params.cmd_length + params.addr_length;
                let rx_total = usize::from(self.packet.bytes_to_discard) + num_bytes;

                self.packet.dummy_bytes = num_bytes as u16;

                imr = INTR::TXEI::SET + INTR::RXFI::SET;
                txei_enabled = true;
                self.ctrlr0.modify(CTRLR0::TMOD::TxAndRx);
                tx_fifo_threshold = self.config.tx_fifo_threshold_value();
                rx_fifo_threshold = core::cmp::min(
                    rx_total as u32 - 1,
                    self.config.rx_fifo_threshold_value(),
                );
            } else {
                imr = INTR::RXFI::SET;
                txei_enabled = false;
                self.ctrlr0.modify(CTRLR0::TMOD::RxOnly);
                tx_fifo_threshold = 0;
                rx_fifo_threshold = core::cmp::min(
                    num_bytes as u32 - 1,
                    self.config.rx_fifo_threshold_value(),
                );
            }

            self.spi_ctrlr0
                .modify(SPI_CTRLR0::WAIT_CYCLES.val(u32::from(params.rx_dummy)));

            self.regs.RXFTLR.write(RXFTLR::RFT.val(rx_fifo_threshold));
        }

        let xip_enabled = self.xip_enabled != 0;

        if xip_enabled {
            self.os.irq_lock();
            self.regs.SSIENR.set(0);
        }

        self.regs.CTRLR0.set(self.ctrlr0.get());
        self.regs.CTRLR1.write(CTRLR1::NDF.val(if num_bytes > 0 {
            (num_bytes / bytes_per_frame) as u32 - 1
        } else {
            0
        }));
        self.regs.SPI_CTRLR0.set(self.spi_ctrlr0.get());

        if xip_enabled {
            self.regs.SSIENR.write(SSIENR::SSIC_EN::SET);
            self.os.irq_unlock();
        }

        if let Some(pin) = self.dev_id.ce_gpio {
            self.os.ce_set(pin, true);
        }

        self.packet.buf_pos = 0;
        self.packet.buf_len = num_bytes;

        if txei_enabled && num_bytes > 0 {
            let mut start_level = tx_fifo_threshold;

            if self.packet.dummy_bytes != 0 {
                let tx_total =
                    u32::from(self.packet.bytes_to_discard) + u32::from(self.packet.dummy_bytes);

                if start_level > tx_total - 1 {
                    start_level = tx_total - 1;
                }
            }

            self.regs
                .TXFTLR
                .write(TXFTLR::TXFTHR.val(start_level) + TXFTLR::TFT.val(tx_fifo_threshold));
        } else {
            self.regs.TXFTLR.set(0);
        }

        // No interrupt from the controller until everything is primed.
        self.regs.IMR.set(0);
        // The controller must be enabled before DR is written.
        self.regs.SSIENR.write(SSIENR::SSIC_EN::SET);

        if self.standard_spi {
            if params.cmd_length != 0 {
                self.tx_control_field(packet.cmd, params.cmd_length);
            }

            if params.addr_length != 0 {
                self.tx_control_field(packet.address, params.addr_length);
            }
        } else {
            if params.cmd_length != 0 {
                self.regs.DR.set(packet.cmd);
            }

            if params.addr_length != 0 {
                self.regs.DR.set(packet.address);
            }
        }

        self.packet.phase = Phase::Streaming;
        if self.packet.dummy_bytes != 0 {
            self.packet.phase = Phase::Priming;
            if self.make_rx_cycles() {
                imr = INTR::RXFI::SET;
                self.packet.phase = Phase::Streaming;
            }
        } else if num_bytes != 0 {
            if let Payload::Tx(buf) = &packet.payload {
                self.tx_data(buf);
            }
        }

        // Interrupts on; the service below runs once per event.
        self.regs.IMR.write(imr);

        let mut rc = Ok(());
        while self.packet.phase != Phase::Done {
            if !self.os.wait_for_irq(params.timeout_ms) {
                rc = Err(Error::Timeout);
                break;
            }
            self.on_interrupt(&mut packet.payload);
        }

        // Disabling the controller halts the transfer immediately if it
        // is still running. With XIP live it has to come straight back.
        if self.xip_enabled != 0 {
            self.os.irq_lock();

            self.regs.SSIENR.set(0);
            self.regs.SSIENR.write(SSIENR::SSIC_EN::SET);

            self.os.irq_unlock();
        } else {
            self.regs.SSIENR.set(0);
        }

        if let Some(pin) = self.dev_id.ce_gpio {
            self.os.ce_set(pin, false);
        }

        rc
    }

    /// Serialize a command or address field through DR, most
    /// significant byte first (standard SPI mode only).
    fn tx_control_field(&mut self, field: u32, len: u8) {
        let mut shift = 8 * u32::from(len);

        loop {
            shift -= 8;
            self.regs.DR.set(field >> shift);
            if shift == 0 {
                break;
            }
        }
    }

    /// Fill the TX FIFO with payload frames.
    ///
    /// At entry at least one item fits. The loop writes the number of
    /// items known to fit and refreshes that number from the actual
    /// FIFO level only when it runs out, because data drains while the
    /// FIFO is being written.
    fn tx_data(&mut self, buf: &[u8]) {
        let bytes_per_frame = usize::from(self.packet.bytes_per_frame);
        let tx_fifo_depth = self.config.tx_fifo_depth();
        let end = self.packet.buf_len;
        let mut pos = self.packet.buf_pos;
        let mut room: u32 = 1;

        loop {
            let data = pack_frame(&buf[pos..pos + bytes_per_frame]);
            pos += bytes_per_frame;
            self.regs.DR.set(data);

            if pos >= end {
                self.regs.TXFTLR.set(0);
                break;
            }

            room -= 1;
            if room == 0 {
                room = tx_fifo_depth - self.regs.TXFLR.read(TXFLR::TXTFL);
                if room == 0 {
                    break;
                }
            }
        }

        self.packet.buf_pos = pos;
    }

    /// Shift out dummy bytes so the receive path gets clock edges.
    /// Returns `true` once all of them have been queued.
    fn make_rx_cycles(&mut self) -> bool {
        let tx_fifo_depth = self.config.tx_fifo_depth();
        let mut dummy_bytes = self.packet.dummy_bytes;
        // See `room` in tx_data().
        let mut room: u32 = 1;

        loop {
            self.regs.DR.set(DUMMY_BYTE);

            dummy_bytes -= 1;
            if dummy_bytes == 0 {
                self.packet.dummy_bytes = 0;
                return true;
            }

            room -= 1;
            if room == 0 {
                room = tx_fifo_depth - self.regs.TXFLR.read(TXFLR::TXTFL);
                if room == 0 {
                    break;
                }
            }
        }

        self.packet.dummy_bytes = dummy_bytes;
        false
    }

    /// Drain the RX FIFO into the payload buffer, dropping the leading
    /// command/address echo first.
    fn read_rx_fifo(&mut self, buf: &mut [u8]) {
        let bytes_per_frame = usize::from(self.packet.bytes_per_frame);
        let end = self.packet.buf_len;
        let mut bytes_to_discard = self.packet.bytes_to_discard;
        let mut pos = self.packet.buf_pos;
        // See `room` in tx_data().
        let mut in_fifo: u32 = 1;

        loop {
            let data = self.regs.DR.get();

            if bytes_to_discard > 0 {
                bytes_to_discard -= 1;
            } else {
                unpack_frame(data, &mut buf[pos..pos + bytes_per_frame]);
                pos += bytes_per_frame;

                if pos >= end {
                    self.packet.bytes_to_discard = bytes_to_discard;
                    self.packet.buf_pos = pos;
                    return;
                }
            }

            in_fifo -= 1;
            if in_fifo == 0 {
                in_fifo = self.regs.RXFLR.read(RXFLR::RXTFL);
                if in_fifo == 0 {
                    break;
                }
            }
        }

        let remaining_bytes = (usize::from(bytes_to_discard) + end - pos) as u32;
        if remaining_bytes - 1 < self.config.rx_fifo_threshold_value() {
            self.regs.RXFTLR.write(RXFTLR::RFT.val(remaining_bytes - 1));
        }

        self.packet.bytes_to_discard = bytes_to_discard;
        self.packet.buf_pos = pos;
    }

    /// Service one controller interrupt for the in-flight packet.
    fn on_interrupt(&mut self, payload: &mut Payload<'_>) {
        let int_status = self.regs.ISR.extract();

        if int_status.is_set(INTR::RXFI) {
            if let Payload::Rx(buf) = payload {
                self.read_rx_fifo(buf);
            }
        }

        if self.packet.buf_pos >= self.packet.buf_len {
            self.regs.IMR.set(0);
            // The last interrupt comes when the TX FIFO empties; the
            // controller may still be shifting out the final frame.
            let mut spins: u32 = 0;
            while self.regs.SR.is_set(SR::BUSY) {
                spins += 1;
                if spins >= BUSY_SPIN_LIMIT {
                    log::warn!("BUSY stuck after {} polls", spins);
                    break;
                }
            }

            self.packet.phase = Phase::Done;
        } else if int_status.is_set(INTR::TXEI) {
            if self.packet.phase == Phase::Priming {
                if self.make_rx_cycles() {
                    self.regs.IMR.write(INTR::RXFI::SET);
                    self.packet.phase = Phase::Streaming;
                }
            } else if let Payload::Tx(buf) = payload {
                self.tx_data(buf);
            }
        }

        self.vendor.clear_irq();
    }
}
