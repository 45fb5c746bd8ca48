//! A simulated nRF24L01+ for host tests.
//!
//! [`SimRadio`] keeps a register file, the three-level RX and TX FIFOs and
//! the CE level. It decodes every SPI frame the driver sends. Two radios
//! joined with [`connect()`] share the air: a payload leaves the TX FIFO
//! as soon as the radio is a powered primary transmitter with CE high, and
//! it lands in the peer's RX FIFO if the peer listens on the same channel
//! and address. ACK payloads are recorded but not carried back.
//!
//! The IRQ line is modelled as a falling edge: an attached [`PendingReceipt`]
//! is notified when an unmasked event flag goes up.

extern crate std;

use core::convert::Infallible;
use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::{Rc, Weak},
    vec::Vec,
};

use embedded_hal::{
    delay::DelayNs,
    digital::{self, OutputPin},
    spi::{self, Operation, SpiDevice},
};

use crate::{
    irq::{self, PendingReceipt},
    radio::{commands, mnemonics, registers, Nrf24Link, RadioConfig, MAX_PAYLOAD_SIZE},
    StatusFlags,
};

const FIFO_DEPTH: usize = 3;
const REGISTER_COUNT: usize = 0x1E;
/// CONFIG
const PWR_UP: u8 = 1 << 1;
const PRIM_RX: u8 = 1;
/// STATUS
const RX_DR: u8 = 1 << 6;
const TX_DS: u8 = 1 << 5;
const MAX_RT: u8 = 1 << 4;

pub type Shared = Rc<RefCell<SimRadio>>;

pub struct SimRadio {
    regs: [u8; REGISTER_COUNT],
    rx_addr_p0: [u8; 5],
    rx_addr_p1: [u8; 5],
    tx_addr: [u8; 5],
    rx_fifo: VecDeque<Vec<u8>>,
    /// Payloads waiting to go out, with their no-ack flag.
    tx_fifo: VecDeque<(Vec<u8>, bool)>,
    ack_payloads: Vec<Vec<u8>>,
    ce: bool,
    irq_active: bool,
    transactions: usize,
    peer: Option<Weak<RefCell<SimRadio>>>,
    irq: Option<Rc<PendingReceipt>>,
}

impl SimRadio {
    /// A radio with the register values of a power-on reset.
    pub fn shared() -> Shared {
        let mut regs = [0u8; REGISTER_COUNT];
        regs[registers::CONFIG as usize] = 0x08;
        regs[registers::EN_AA as usize] = 0x3F;
        regs[registers::EN_RXADDR as usize] = 0x03;
        regs[registers::SETUP_AW as usize] = 0x03;
        regs[registers::SETUP_RETR as usize] = 0x03;
        regs[registers::RF_CH as usize] = 0x02;
        regs[registers::RF_SETUP as usize] = 0x0E;
        regs[0x0C..=0x0F].copy_from_slice(&[0xC3, 0xC4, 0xC5, 0xC6]);
        Rc::new(RefCell::new(Self {
            regs,
            rx_addr_p0: [0xE7; 5],
            rx_addr_p1: [0xC2; 5],
            tx_addr: [0xE7; 5],
            rx_fifo: VecDeque::new(),
            tx_fifo: VecDeque::new(),
            ack_payloads: Vec::new(),
            ce: false,
            irq_active: false,
            transactions: 0,
            peer: None,
            irq: None,
        }))
    }

    /// Route this radio's IRQ edges to `receipt`.
    pub fn attach_irq(&mut self, receipt: Rc<PendingReceipt>) {
        self.irq = Some(receipt);
    }

    /// The number of SPI transactions seen so far.
    pub fn transactions(&self) -> usize {
        self.transactions
    }

    pub fn register(&self, register: u8) -> u8 {
        self.regs[register as usize]
    }

    pub fn ce(&self) -> bool {
        self.ce
    }

    pub fn rx_fifo_len(&self) -> usize {
        self.rx_fifo.len()
    }

    pub fn tx_fifo_len(&self) -> usize {
        self.tx_fifo.len()
    }

    pub fn ack_payloads(&self) -> &[Vec<u8>] {
        &self.ack_payloads
    }

    /// Put a payload straight into the RX FIFO, as if it came over the air.
    pub fn inject(&mut self, payload: &[u8]) {
        self.rx_fifo.push_back(payload.to_vec());
        self.regs[registers::STATUS as usize] |= RX_DR;
        self.update_irq();
    }

    fn powered(&self) -> bool {
        self.regs[registers::CONFIG as usize] & PWR_UP != 0
    }

    fn primary_rx(&self) -> bool {
        self.regs[registers::CONFIG as usize] & PRIM_RX != 0
    }

    fn status_byte(&self) -> u8 {
        let rx_pipe = if self.rx_fifo.is_empty() { 7 } else { 0 };
        let tx_full = (self.tx_fifo.len() == FIFO_DEPTH) as u8;
        (self.regs[registers::STATUS as usize] & StatusFlags::IRQ_MASK) | (rx_pipe << 1) | tx_full
    }

    fn fifo_status(&self) -> u8 {
        let mut value = 0;
        if self.rx_fifo.is_empty() {
            value |= mnemonics::RX_EMPTY;
        }
        if self.rx_fifo.len() == FIFO_DEPTH {
            value |= mnemonics::RX_FULL;
        }
        if self.tx_fifo.is_empty() {
            value |= mnemonics::TX_EMPTY;
        }
        if self.tx_fifo.len() == FIFO_DEPTH {
            value |= mnemonics::TX_FULL;
        }
        value
    }

    fn read_register(&self, register: u8, data: &mut [u8]) {
        data.fill(0);
        let address = match register {
            registers::RX_ADDR_P0 => Some(&self.rx_addr_p0),
            registers::RX_ADDR_P1 => Some(&self.rx_addr_p1),
            registers::TX_ADDR => Some(&self.tx_addr),
            _ => None,
        };
        if let Some(address) = address {
            let len = data.len().min(5);
            data[..len].copy_from_slice(&address[..len]);
            return;
        }
        if let Some(first) = data.first_mut() {
            *first = match register {
                registers::STATUS => self.status_byte(),
                registers::FIFO_STATUS => self.fifo_status(),
                r if (r as usize) < REGISTER_COUNT => self.regs[r as usize],
                _ => 0,
            };
        }
    }

    fn write_register(&mut self, register: u8, data: &[u8]) {
        let Some(&value) = data.first() else {
            return;
        };
        match register {
            registers::RX_ADDR_P0 | registers::RX_ADDR_P1 | registers::TX_ADDR => {
                let address = match register {
                    registers::RX_ADDR_P0 => &mut self.rx_addr_p0,
                    registers::RX_ADDR_P1 => &mut self.rx_addr_p1,
                    _ => &mut self.tx_addr,
                };
                let len = data.len().min(5);
                address[..len].copy_from_slice(&data[..len]);
            }
            // write 1 to clear
            registers::STATUS => {
                self.regs[registers::STATUS as usize] &= !(value & StatusFlags::IRQ_MASK);
            }
            registers::OBSERVE_TX | registers::RPD | registers::FIFO_STATUS => {}
            registers::RF_CH => {
                self.regs[registers::RF_CH as usize] = value & 0x7F;
                // a channel change resets the lost packet count
                self.regs[registers::OBSERVE_TX as usize] &= 0x0F;
            }
            r if (r as usize) < REGISTER_COUNT => self.regs[r as usize] = value,
            _ => {}
        }
    }

    /// Decode one SPI frame in place: `frame[0]` is the command going out
    /// and the STATUS byte coming back.
    fn process(&mut self, frame: &mut [u8]) {
        let Some((&mut command, data)) = frame.split_first_mut() else {
            return;
        };
        let status = self.status_byte();
        match command {
            c if c & 0xE0 == commands::R_REGISTER => {
                self.read_register(c & registers::MASK, data)
            }
            c if c & 0xE0 == commands::W_REGISTER => {
                self.write_register(c & registers::MASK, data);
                data.fill(0);
            }
            commands::R_RX_PL_WID => {
                data.fill(0);
                if let (Some(width), Some(front)) = (data.first_mut(), self.rx_fifo.front()) {
                    *width = front.len() as u8;
                }
            }
            commands::R_RX_PAYLOAD => {
                data.fill(0);
                if let Some(payload) = self.rx_fifo.pop_front() {
                    let len = payload.len().min(data.len());
                    data[..len].copy_from_slice(&payload[..len]);
                }
            }
            commands::W_TX_PAYLOAD | commands::W_TX_PAYLOAD_NO_ACK => {
                if self.tx_fifo.len() < FIFO_DEPTH {
                    let len = data.len().min(MAX_PAYLOAD_SIZE);
                    let no_ack = command == commands::W_TX_PAYLOAD_NO_ACK;
                    self.tx_fifo.push_back((data[..len].to_vec(), no_ack));
                }
            }
            c if c & 0xF8 == commands::W_ACK_PAYLOAD => {
                let len = data.len().min(MAX_PAYLOAD_SIZE);
                self.ack_payloads.push(data[..len].to_vec());
            }
            commands::FLUSH_TX => self.tx_fifo.clear(),
            commands::FLUSH_RX => self.rx_fifo.clear(),
            _ => {}
        }
        frame[0] = status;
    }

    /// Let pending transmissions happen and refresh the IRQ line.
    fn settle(&mut self) {
        while self.ce
            && self.powered()
            && !self.primary_rx()
            && self.regs[registers::STATUS as usize] & MAX_RT == 0
        {
            let Some((payload, no_ack)) = self.tx_fifo.pop_front() else {
                break;
            };
            let channel = self.regs[registers::RF_CH as usize];
            let delivered = match self.peer.as_ref().and_then(Weak::upgrade) {
                Some(peer) => peer.borrow_mut().receive(channel, &self.tx_addr, &payload),
                None => false,
            };
            let needs_ack = !no_ack && self.regs[registers::EN_AA as usize] & 1 != 0;
            if delivered || !needs_ack {
                self.regs[registers::STATUS as usize] |= TX_DS;
                self.regs[registers::OBSERVE_TX as usize] &= 0xF0;
            } else {
                // the payload stays in the FIFO until it is flushed
                self.tx_fifo.push_front((payload, no_ack));
                self.regs[registers::STATUS as usize] |= MAX_RT;
                let observe = self.regs[registers::OBSERVE_TX as usize];
                let lost = ((observe >> 4) + 1).min(15);
                let retries = self.regs[registers::SETUP_RETR as usize] & 0x0F;
                self.regs[registers::OBSERVE_TX as usize] = (lost << 4) | retries;
            }
        }
        self.update_irq();
    }

    fn receive(&mut self, channel: u8, address: &[u8; 5], payload: &[u8]) -> bool {
        let listening = self.powered() && self.primary_rx() && self.ce;
        let pipe_open = self.regs[registers::EN_RXADDR as usize] & 1 != 0;
        if !listening
            || !pipe_open
            || self.regs[registers::RF_CH as usize] != channel
            || self.rx_addr_p0 != *address
            || self.rx_fifo.len() == FIFO_DEPTH
        {
            return false;
        }
        self.rx_fifo.push_back(payload.to_vec());
        self.regs[registers::STATUS as usize] |= RX_DR;
        self.update_irq();
        true
    }

    fn update_irq(&mut self) {
        let flags = self.regs[registers::STATUS as usize] & StatusFlags::IRQ_MASK;
        let masked = self.regs[registers::CONFIG as usize] & StatusFlags::IRQ_MASK;
        let active = flags & !masked != 0;
        if active && !self.irq_active {
            if let Some(receipt) = &self.irq {
                irq::on_irq_edge(receipt);
            }
        }
        self.irq_active = active;
    }
}

/// Share the air between `a` and `b`.
pub fn connect(a: &Shared, b: &Shared) {
    a.borrow_mut().peer = Some(Rc::downgrade(b));
    b.borrow_mut().peer = Some(Rc::downgrade(a));
}

/// The SPI side of a [`SimRadio`]. Chip select is implied by the transaction.
pub struct SimSpi(Shared);

impl spi::ErrorType for SimSpi {
    type Error = Infallible;
}

impl SpiDevice for SimSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        let mut radio = self.0.borrow_mut();
        radio.transactions += 1;
        for operation in operations.iter_mut() {
            match operation {
                Operation::TransferInPlace(buf) => radio.process(buf),
                Operation::Write(buf) => radio.process(&mut buf.to_vec()),
                _ => unimplemented!("the driver only issues in-place transfers"),
            }
        }
        radio.settle();
        Ok(())
    }
}

/// The CE pin of a [`SimRadio`].
pub struct SimCe(Shared);

impl digital::ErrorType for SimCe {
    type Error = Infallible;
}

impl OutputPin for SimCe {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut radio = self.0.borrow_mut();
        radio.ce = false;
        radio.settle();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut radio = self.0.borrow_mut();
        radio.ce = true;
        radio.settle();
        Ok(())
    }
}

/// A delay that only records what it was asked to wait, in nanoseconds.
#[derive(Clone, Default)]
pub struct CountingDelay(Rc<RefCell<Vec<u32>>>);

impl CountingDelay {
    /// How many delays of exactly `ns` were requested.
    pub fn count(&self, ns: u32) -> usize {
        self.0.borrow().iter().filter(|&&d| d == ns).count()
    }
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().push(ns);
    }
}

pub type SimLink = Nrf24Link<SimSpi, SimCe, CountingDelay>;

/// A driver for `radio`, and a handle on the delays it requests.
pub fn sim_link(radio: &Shared, config: RadioConfig) -> (SimLink, CountingDelay) {
    let delay = CountingDelay::default();
    let link = Nrf24Link::new(
        SimCe(radio.clone()),
        SimSpi(radio.clone()),
        delay.clone(),
        config,
    );
    (link, delay)
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::{connect, sim_link, CountingDelay, SimCe, SimRadio, SimSpi};
    use crate::{
        irq::{self, PendingReceipt},
        radio::{mnemonics, prelude::*, registers, LinkError, Nrf24Link, RadioConfig},
        FifoState, OperatingState,
    };
    use core::cell::Cell;
    use embedded_hal::spi::{self, ErrorKind, Operation, SpiDevice};
    use std::{rc::Rc, vec};

    /// A bus that fails the first STATUS read once armed.
    struct FailingStatusRead {
        inner: SimSpi,
        armed: Rc<Cell<bool>>,
    }

    impl spi::ErrorType for FailingStatusRead {
        type Error = ErrorKind;
    }

    impl SpiDevice for FailingStatusRead {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
            if let [Operation::TransferInPlace(buf)] = operations {
                if self.armed.get() && buf.first() == Some(&registers::STATUS) {
                    self.armed.set(false);
                    return Err(ErrorKind::Other);
                }
            }
            match self.inner.transaction(operations) {
                Ok(()) => Ok(()),
                Err(never) => match never {},
            }
        }
    }

    #[test]
    fn init_programs_the_register_file() {
        let sim = SimRadio::shared();
        let (mut radio, delay) = sim_link(&sim, RadioConfig::default());
        radio.init().unwrap();
        let sim = sim.borrow();
        assert_eq!(sim.register(registers::CONFIG), 0x3F);
        assert_eq!(sim.register(registers::EN_AA), 0);
        assert_eq!(sim.register(registers::EN_RXADDR), 1);
        assert_eq!(sim.register(registers::SETUP_RETR), 0xF0);
        assert_eq!(sim.register(registers::RF_CH), 0x76);
        assert_eq!(sim.register(registers::RF_SETUP), 0x0E);
        assert_eq!(sim.register(registers::DYNPD), 0x3F);
        assert_eq!(sim.register(registers::FEATURE), 0x04);
        assert!(!sim.ce());
        assert_eq!(delay.count(100_000_000), 1);
    }

    #[test]
    fn register_round_trip() {
        let sim = SimRadio::shared();
        let (mut radio, _) = sim_link(&sim, RadioConfig::default());
        radio.write_register(registers::SETUP_RETR, &[0x5A]).unwrap();
        radio.write_register(registers::TX_ADDR, b"2Node").unwrap();
        let mut retr = [0u8];
        radio.read_register(registers::SETUP_RETR, &mut retr).unwrap();
        assert_eq!(retr, [0x5A]);
        let mut address = [0u8; 5];
        radio.read_register(registers::TX_ADDR, &mut address).unwrap();
        assert_eq!(&address, b"2Node");
    }

    #[test]
    fn power_up_waits_only_once() {
        let sim = SimRadio::shared();
        let (mut radio, delay) = sim_link(&sim, RadioConfig::default());
        radio.init().unwrap();
        radio.power_down().unwrap();
        radio.power_up().unwrap();
        radio.power_up().unwrap();
        assert_eq!(radio.state(), OperatingState::PowerUp);
        assert_eq!(delay.count(2_000_000), 1);
    }

    #[test]
    fn loopback() {
        let (sim_a, sim_b) = (SimRadio::shared(), SimRadio::shared());
        connect(&sim_a, &sim_b);
        let (mut a, _) = sim_link(&sim_a, RadioConfig::default());
        let (mut b, _) = sim_link(&sim_b, RadioConfig::default());
        for radio in [&mut a, &mut b] {
            radio.init().unwrap();
            radio.start_listening().unwrap();
        }

        for len in [1usize, 16, 32] {
            let message = vec![b'x'; len];
            a.send_message(&message).unwrap();
            assert!(b.available().unwrap());
            assert_eq!(b.read_message().unwrap(), Some(message.as_slice()));
            assert!(!b.available().unwrap());
        }
        assert_eq!(a.state(), OperatingState::Receiving);
        assert!(sim_a.borrow().ce());
    }

    #[test]
    fn irq_reaches_the_listener_only() {
        let (sim_a, sim_b) = (SimRadio::shared(), SimRadio::shared());
        connect(&sim_a, &sim_b);
        let (receipt_a, receipt_b) = (Rc::new(PendingReceipt::new()), Rc::new(PendingReceipt::new()));
        sim_a.borrow_mut().attach_irq(receipt_a.clone());
        sim_b.borrow_mut().attach_irq(receipt_b.clone());
        let (mut a, _) = sim_link(&sim_a, RadioConfig::default());
        let (mut b, _) = sim_link(&sim_b, RadioConfig::default());
        for radio in [&mut a, &mut b] {
            radio.init().unwrap();
            radio.start_listening().unwrap();
        }

        a.send_message(b"ping").unwrap();
        assert!(!receipt_a.take());
        assert!(receipt_b.take());

        assert_eq!(b.read_message().unwrap(), Some(&b"ping"[..]));
        // a second message raises a fresh edge once RX_DR was cleared
        a.send_message(b"pong").unwrap();
        assert!(receipt_b.take());
    }

    #[test]
    fn unanswered_send_with_auto_ack() {
        let sim = SimRadio::shared();
        let config = RadioConfig::default()
            .with_auto_ack(true)
            .with_auto_retries(15, 3);
        let (mut radio, _) = sim_link(&sim, config);
        radio.init().unwrap();
        radio.start_listening().unwrap();
        assert_eq!(
            radio.send_message(b"anyone?"),
            Err(LinkError::MaxRetransmitExceeded)
        );
        assert_eq!(radio.state(), OperatingState::Receiving);
        let sim = sim.borrow();
        assert!(sim.ce());
        assert_eq!(sim.tx_fifo_len(), 0);
        assert_eq!(sim.register(registers::STATUS) & 0x70, 0);
        assert_eq!(sim.register(registers::OBSERVE_TX), 0x13);
    }

    #[test]
    fn unanswered_send_without_auto_ack() {
        let sim = SimRadio::shared();
        let (mut radio, _) = sim_link(&sim, RadioConfig::default());
        radio.init().unwrap();
        radio.start_listening().unwrap();
        radio.send_message(b"anyone?").unwrap();
        assert_eq!(radio.get_fifo_state(true).unwrap(), FifoState::Empty);
    }

    #[test]
    fn read_queues_ack_payload() {
        let sim = SimRadio::shared();
        let config = RadioConfig::default().with_auto_ack(true);
        let (mut radio, _) = sim_link(&sim, config);
        radio.init().unwrap();
        radio.start_listening().unwrap();
        sim.borrow_mut().inject(b"hi\0");
        assert_eq!(radio.read_message().unwrap(), Some(&b"hi"[..]));
        assert_eq!(sim.borrow().ack_payloads(), &[b"A".to_vec()]);
    }

    #[test]
    fn read_drops_corrupt_payload() {
        let sim = SimRadio::shared();
        let (mut radio, _) = sim_link(&sim, RadioConfig::default());
        radio.init().unwrap();
        radio.start_listening().unwrap();
        sim.borrow_mut().inject(&[b'z'; 33]);
        sim.borrow_mut().inject(b"next");
        assert_eq!(radio.read_message().unwrap(), None);
        assert_eq!(sim.borrow().rx_fifo_len(), 0);
        // STATUS is clocked out before the clearing write takes effect
        assert!(radio.get_status_flags().rx_dr());
        radio.update().unwrap();
        assert!(!radio.get_status_flags().rx_dr());
    }

    #[test]
    fn read_from_empty_fifo() {
        let sim = SimRadio::shared();
        let (mut radio, _) = sim_link(&sim, RadioConfig::default());
        radio.init().unwrap();
        radio.start_listening().unwrap();
        assert_eq!(radio.read_message().unwrap(), None);
        assert_eq!(radio.get_fifo_state(false).unwrap(), FifoState::Empty);
    }

    #[test]
    fn details_from_register_file() {
        let sim = SimRadio::shared();
        let (mut radio, _) = sim_link(&sim, RadioConfig::default());
        radio.init().unwrap();
        radio.start_listening().unwrap();
        let details = radio.details().unwrap();
        assert_eq!(details.state, OperatingState::Receiving);
        assert_eq!(details.channel, 0x76);
        assert!(details.powered && details.primary_rx);
        assert_eq!(details.open_pipes, 1);
        assert_eq!(details.address_width, 5);
        assert_eq!(details.rx_address, [0xE7; 5]);
        assert_eq!(details.rx_fifo, FifoState::Empty);
    }

    #[test]
    fn irq_edge_stays_off_the_bus() {
        let sim = SimRadio::shared();
        let (mut radio, _) = sim_link(&sim, RadioConfig::default());
        radio.init().unwrap();
        radio.start_listening().unwrap();

        let receipt = PendingReceipt::new();
        let before = sim.borrow().transactions();
        irq::on_irq_edge(&receipt);
        assert!(receipt.is_pending());
        assert_eq!(sim.borrow().transactions(), before);
        assert!(receipt.take());
        assert_eq!(sim.borrow().transactions(), before);
    }

    #[test]
    fn failed_send_resumes_listening() {
        let sim = SimRadio::shared();
        let receipt = Rc::new(PendingReceipt::new());
        sim.borrow_mut().attach_irq(receipt.clone());
        let armed = Rc::new(Cell::new(false));
        let spi = FailingStatusRead {
            inner: SimSpi(sim.clone()),
            armed: armed.clone(),
        };
        let mut radio = Nrf24Link::new(
            SimCe(sim.clone()),
            spi,
            CountingDelay::default(),
            RadioConfig::default(),
        );
        radio.init().unwrap();
        radio.start_listening().unwrap();

        armed.set(true);
        assert_eq!(
            radio.send_message(b"lost"),
            Err(LinkError::Spi(ErrorKind::Other))
        );
        assert!(!armed.get());
        assert_eq!(radio.state(), OperatingState::Receiving);
        {
            let sim = sim.borrow();
            assert!(sim.ce());
            let config = sim.register(registers::CONFIG);
            assert_eq!(config & mnemonics::MASK_RX_DR, 0);
            assert_eq!(config & 1, 1);
        }

        // still hears the next message
        sim.borrow_mut().inject(b"x\0");
        assert!(receipt.take());
        assert_eq!(radio.read_message().unwrap(), Some(&b"x"[..]));
    }
}
