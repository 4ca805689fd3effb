//! I2C transport used by the 24Cxx driver.
//!
//! A transfer addresses a 7-bit device, sends the memory address (one or two
//! bytes, most significant first) and then reads or writes the payload.
//! Transfers report how many payload bytes actually went over the bus; a
//! device that doesn't acknowledge shows up as a short count, not as an
//! error.

use std::io;

mod linux;
pub mod mock;

pub use self::linux::{
	I2cDev,
	open_bus,
	bus_path,
};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Write,
	Read,
}

impl Direction {
	// R/W bit following the 7-bit address
	pub fn bit(self) -> u8 {
		match self {
			Direction::Write => 0,
			Direction::Read => 1,
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum AddressWidth {
	One,
	Two,
}

impl AddressWidth {
	pub fn bytes(self) -> usize {
		match self {
			AddressWidth::One => 1,
			AddressWidth::Two => 2,
		}
	}

	/// Memory address as sent on the wire; only the first `bytes()` entries
	/// are valid.
	pub fn encode(self, memory_address: u16) -> [u8; 2] {
		match self {
			AddressWidth::One => [memory_address as u8, 0],
			AddressWidth::Two => [(memory_address >> 8) as u8, memory_address as u8],
		}
	}

	pub fn decode(self, bytes: &[u8]) -> Option<u16> {
		match (self, bytes) {
			(AddressWidth::One, &[lo]) => Some(lo as u16),
			(AddressWidth::Two, &[hi, lo]) => Some((hi as u16) << 8 | lo as u16),
			_ => None,
		}
	}
}

pub trait I2cBus {
	// one-time bus setup; repeated calls must be harmless
	fn init(&mut self) -> io::Result<()> {
		Ok(())
	}

	/// Random read: returns the number of bytes read into `buffer`.
	fn read(
		&mut self,
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		buffer: &mut [u8],
	) -> io::Result<usize>;

	/// Returns the number of payload bytes the device acknowledged.
	fn write(
		&mut self,
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		data: &[u8],
	) -> io::Result<usize>;

	/// START + address byte; `true` if the device acknowledged.
	fn start(&mut self, device_address: u8, direction: Direction) -> bool;

	fn stop(&mut self);
}

impl<'a, B: I2cBus + ?Sized> I2cBus for &'a mut B {
	fn init(&mut self) -> io::Result<()> {
		B::init(*self)
	}

	fn read(
		&mut self,
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		buffer: &mut [u8],
	) -> io::Result<usize> {
		B::read(*self, device_address, memory_address, address_width, buffer)
	}

	fn write(
		&mut self,
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		data: &[u8],
	) -> io::Result<usize> {
		B::write(*self, device_address, memory_address, address_width, data)
	}

	fn start(&mut self, device_address: u8, direction: Direction) -> bool {
		B::start(*self, device_address, direction)
	}

	fn stop(&mut self) {
		B::stop(*self)
	}
}
