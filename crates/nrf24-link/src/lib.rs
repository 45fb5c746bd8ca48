#![doc = include_str!("../README.md")]
//!
//! ## Radio API
//!
//! - [`Nrf24Link::new()`](fn@crate::radio::Nrf24Link::new)
//! - [`Nrf24Link::init()`](radio/struct.Nrf24Link.html#method.init)
//! - [`Nrf24Link::start_listening()`](radio/struct.Nrf24Link.html#method.start_listening)
//! - [`Nrf24Link::send_message()`](radio/struct.Nrf24Link.html#method.send_message)
//! - [`Nrf24Link::read_message()`](radio/struct.Nrf24Link.html#method.read_message)
//! - [`Nrf24Link::available()`](radio/struct.Nrf24Link.html#method.available)
//! - [`Nrf24Link::details()`](radio/struct.Nrf24Link.html#method.details)
//!
//! ## State API
//!
//! - [`Nrf24Link::state()`](radio/struct.Nrf24Link.html#method.state)
//! - [`Nrf24Link::apply_state()`](radio/struct.Nrf24Link.html#method.apply_state)
//! - [`Nrf24Link::power_up()`](radio/struct.Nrf24Link.html#method.power_up)
//! - [`Nrf24Link::power_down()`](radio/struct.Nrf24Link.html#method.power_down)
//!
//! ## Advanced API
//!
//! - [`Nrf24Link::flush_rx()`](radio/struct.Nrf24Link.html#method.flush_rx)
//! - [`Nrf24Link::flush_tx()`](radio/struct.Nrf24Link.html#method.flush_tx)
//! - [`Nrf24Link::get_fifo_state()`](radio/struct.Nrf24Link.html#method.get_fifo_state)
//! - [`Nrf24Link::clear_status_flags()`](radio/struct.Nrf24Link.html#method.clear_status_flags)
//! - [`Nrf24Link::update()`](radio/struct.Nrf24Link.html#method.update)
//! - [`Nrf24Link::get_status_flags()`](radio/struct.Nrf24Link.html#method.get_status_flags)
//! - [`Nrf24Link::read_register()`](fn@crate::radio::Nrf24Link::read_register)
//! - [`Nrf24Link::write_register()`](fn@crate::radio::Nrf24Link::write_register)
//!
#![no_std]
#![cfg_attr(feature = "atmega328p", feature(abi_avr_interrupt))]

mod types;
pub use types::{DataRate, FifoState, OperatingState, PaLevel, StatusFlags};
pub mod board;
pub mod console;
pub mod hw;
pub mod irq;
pub mod node;
pub mod radio;

#[cfg(test)]
mod sim;
