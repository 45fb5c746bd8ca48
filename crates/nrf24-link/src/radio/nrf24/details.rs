use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};
use ufmt::{uDisplay, uWrite, Formatter};

use super::{
    bit_fields::{Config, SetupRetry},
    fifo::decode_fifo_state,
    mnemonics, registers, LinkError, Nrf24Link,
};
use crate::{
    radio::prelude::EsbDetails,
    types::{DataRate, FifoState, OperatingState, PaLevel, StatusFlags},
};

/// A snapshot of the radio's registers, taken by
/// [`EsbDetails::details()`](fn@crate::radio::prelude::EsbDetails::details).
///
/// Print it on a [`uWrite`] sink (like the [`Console`](crate::console::Console))
/// with `uwrite!(&mut console, "{}", details)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadioDetails {
    pub state: OperatingState,
    pub channel: u8,
    pub data_rate: DataRate,
    pub pa_level: PaLevel,
    pub continuous_carrier: bool,
    /// 0 (disabled), 8 or 16.
    pub crc_bits: u8,
    pub powered: bool,
    pub primary_rx: bool,
    pub irq_rx_dr: bool,
    pub irq_tx_ds: bool,
    pub irq_max_rt: bool,
    /// EN_AA, one bit per pipe.
    pub auto_ack: u8,
    /// EN_RXADDR, one bit per pipe.
    pub open_pipes: u8,
    /// DYNPD, one bit per pipe.
    pub dynamic_payloads: u8,
    pub feature: u8,
    pub address_width: u8,
    pub retry_delay_us: u16,
    pub retry_count: u8,
    pub lost_packets: u8,
    pub last_retransmits: u8,
    pub rx_address: [u8; 5],
    pub tx_address: [u8; 5],
    pub status: StatusFlags,
    pub rx_fifo: FifoState,
    pub tx_fifo: FifoState,
}

impl<SPI, DO, DELAY> EsbDetails for Nrf24Link<SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type DetailsErrorType = LinkError<SPI::Error, DO::Error>;

    fn details(&mut self) -> Result<RadioDetails, Self::DetailsErrorType> {
        let config = Config::from_bits(self.read_byte(registers::CONFIG)?);
        let auto_ack = self.read_byte(registers::EN_AA)?;
        let open_pipes = self.read_byte(registers::EN_RXADDR)?;
        let setup_aw = self.read_byte(registers::SETUP_AW)?;
        let retries = SetupRetry::from_bits(self.read_byte(registers::SETUP_RETR)?);
        let channel = self.read_byte(registers::RF_CH)?;
        let rf_setup = self.read_byte(registers::RF_SETUP)?;
        let observe_tx = self.read_byte(registers::OBSERVE_TX)?;
        let fifo_status = self.read_byte(registers::FIFO_STATUS)?;
        let dynamic_payloads = self.read_byte(registers::DYNPD)?;
        let feature = self.read_byte(registers::FEATURE)?;

        let mut rx_address = [0u8; 5];
        self.read_register(registers::RX_ADDR_P0, &mut rx_address)?;
        let mut tx_address = [0u8; 5];
        self.read_register(registers::TX_ADDR, &mut tx_address)?;

        Ok(RadioDetails {
            state: self._state,
            channel,
            data_rate: DataRate::from_bits(rf_setup),
            pa_level: PaLevel::from_bits(rf_setup),
            continuous_carrier: rf_setup & mnemonics::CONT_WAVE != 0,
            crc_bits: match (config.en_crc(), config.crc0()) {
                (false, _) => 0,
                (true, false) => 8,
                (true, true) => 16,
            },
            powered: config.power(),
            primary_rx: config.is_rx(),
            irq_rx_dr: config.rx_dr(),
            irq_tx_ds: config.tx_ds(),
            irq_max_rt: config.max_rt(),
            auto_ack,
            open_pipes,
            dynamic_payloads,
            feature,
            // 1 => 3 bytes .. 3 => 5 bytes
            address_width: (setup_aw & 3) + 2,
            retry_delay_us: retries.delay_us(),
            retry_count: retries.arc(),
            lost_packets: observe_tx >> 4,
            last_retransmits: observe_tx & 0xF,
            rx_address,
            tx_address,
            status: self._status,
            rx_fifo: decode_fifo_state(fifo_status, false),
            tx_fifo: decode_fifo_state(fifo_status, true),
        })
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Write one `label____value` line.
fn line<W, T>(f: &mut Formatter<'_, W>, label: &str, value: &T) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
    T: uDisplay + ?Sized,
{
    f.write_str(label)?;
    value.fmt(f)?;
    f.write_str("\n")
}

/// Write one `label____0x..` line.
fn hex_line<W>(f: &mut Formatter<'_, W>, label: &str, bytes: &[u8]) -> Result<(), W::Error>
where
    W: uWrite + ?Sized,
{
    const DIGITS: [&str; 16] = [
        "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "A", "B", "C", "D", "E", "F",
    ];
    f.write_str(label)?;
    f.write_str("0x")?;
    for byte in bytes {
        f.write_str(DIGITS[(byte >> 4) as usize])?;
        f.write_str(DIGITS[(byte & 0xF) as usize])?;
    }
    f.write_str("\n")
}

impl uDisplay for RadioDetails {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        line(f, "Driver state______________", &self.state)?;
        f.write_str("Channel___________________")?;
        self.channel.fmt(f)?;
        f.write_str(" ~ ")?;
        (self.channel as u16 + 2400).fmt(f)?;
        f.write_str(" MHz\n")?;
        line(f, "RF Data Rate______________", &self.data_rate)?;
        line(f, "RF Power Amplifier________", &self.pa_level)?;
        line(
            f,
            "Continuous carrier________",
            yes_no(self.continuous_carrier),
        )?;
        match self.crc_bits {
            0 => line(f, "CRC Length________________", "disabled")?,
            8 => line(f, "CRC Length________________", "8 bit")?,
            _ => line(f, "CRC Length________________", "16 bit")?,
        }
        line(f, "Address length (bytes)____", &self.address_width)?;
        line(f, "Auto retry delay (us)_____", &self.retry_delay_us)?;
        line(f, "Auto retry attempts_______", &self.retry_count)?;
        line(f, "Packets lost______________", &self.lost_packets)?;
        line(f, "Retries of last payload___", &self.last_retransmits)?;
        line(f, "Powered up________________", yes_no(self.powered))?;
        line(f, "Primary RX________________", yes_no(self.primary_rx))?;
        line(f, "IRQ on RX data ready______", yes_no(self.irq_rx_dr))?;
        line(f, "IRQ on TX data sent_______", yes_no(self.irq_tx_ds))?;
        line(f, "IRQ on max retransmits____", yes_no(self.irq_max_rt))?;
        hex_line(f, "Auto ACK pipes____________", &[self.auto_ack])?;
        hex_line(f, "Open RX pipes_____________", &[self.open_pipes])?;
        hex_line(f, "Dynamic payload pipes_____", &[self.dynamic_payloads])?;
        hex_line(f, "FEATURE___________________", &[self.feature])?;
        hex_line(f, "RX address (pipe 0)_______", &self.rx_address)?;
        hex_line(f, "TX address________________", &self.tx_address)?;
        line(f, "RX FIFO___________________", &self.rx_fifo)?;
        line(f, "TX FIFO___________________", &self.tx_fifo)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RadioDetails {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "RadioDetails state: {}, channel: {=u8}, data_rate: {}, pa_level: {}, crc_bits: {=u8}, powered: {=bool}, primary_rx: {=bool}, open_pipes: {=u8:#x}, rx_address: {=[u8]:#x}, tx_address: {=[u8]:#x}, rx_fifo: {}, tx_fifo: {}",
            self.state,
            self.channel,
            self.data_rate,
            self.pa_level,
            self.crc_bits,
            self.powered,
            self.primary_rx,
            self.open_pipes,
            self.rx_address,
            self.tx_address,
            self.rx_fifo,
            self.tx_fifo
        )
    }
}
