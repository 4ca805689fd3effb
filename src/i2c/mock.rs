//! In-memory 24Cxx device behind a fake I2C bus.
//!
//! Behaves like the real parts where the driver can observe it: writes wrap
//! around inside their page, the device ignores its bus address while it is
//! committing a write, and the address bits above bit 7 of single address
//! byte parts are taken from the device address. Every call is recorded.

use std::io;

use crate::eeprom::DeviceVariant;
use crate::i2c::{
	AddressWidth,
	Direction,
	I2cBus,
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Event {
	Init,
	Read {
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		len: usize,
	},
	Write {
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		data: Vec<u8>,
	},
	Start {
		device_address: u8,
		direction: Direction,
	},
	Stop,
}

impl Event {
	pub fn is_transfer(&self) -> bool {
		match self {
			Event::Read { .. } | Event::Write { .. } => true,
			_ => false,
		}
	}
}

#[derive(Clone, Debug)]
pub struct SimulatedEeprom {
	memory: Vec<u8>,
	page_size: usize,
	base_address: u8,
	address_width: AddressWidth,
	// NACKed probes after each completed write
	write_cycle: u32,
	busy: u32,
	always_busy: bool,
	fail_next: Option<usize>,
	events: Vec<Event>,
}

impl SimulatedEeprom {
	pub fn new(size: usize, page_size: usize, base_address: u8, address_width: AddressWidth) -> Self {
		assert!(size > 0 && page_size > 0 && size % page_size == 0);
		SimulatedEeprom {
			memory: vec![0xff; size],
			page_size,
			base_address,
			address_width,
			write_cycle: 0,
			busy: 0,
			always_busy: false,
			fail_next: None,
			events: Vec::new(),
		}
	}

	pub fn for_variant(variant: DeviceVariant, base_address: u8) -> Self {
		Self::new(variant.size(), variant.page_size(), base_address, variant.address_width())
	}

	pub fn memory(&self) -> &[u8] {
		&self.memory
	}

	pub fn memory_mut(&mut self) -> &mut [u8] {
		&mut self.memory
	}

	pub fn events(&self) -> &[Event] {
		&self.events
	}

	pub fn clear_events(&mut self) {
		self.events.clear();
	}

	pub fn transfers(&self) -> Vec<&Event> {
		self.events.iter().filter(|e| e.is_transfer()).collect()
	}

	pub fn probes(&self) -> usize {
		self.events.iter().filter(|e| match e {
			Event::Start { .. } => true,
			_ => false,
		}).count()
	}

	/// Number of probes NACKed after every write before the device answers again.
	pub fn set_write_cycle(&mut self, polls: u32) {
		self.write_cycle = polls;
	}

	pub fn set_always_busy(&mut self, always_busy: bool) {
		self.always_busy = always_busy;
	}

	/// Next read or write reports `transferred` bytes and has no effect.
	pub fn fail_next_transfer(&mut self, transferred: usize) {
		self.fail_next = Some(transferred);
	}

	fn is_busy(&self) -> bool {
		self.always_busy || self.busy > 0
	}

	fn blocks(&self) -> usize {
		match self.address_width {
			AddressWidth::One => std::cmp::max(1, self.memory.len() / 256),
			AddressWidth::Two => 1,
		}
	}

	fn selects(&self, device_address: u8) -> bool {
		((device_address ^ self.base_address) as usize) < self.blocks()
	}

	fn linear_address(&self, device_address: u8, memory_address: u16, address_width: AddressWidth) -> Option<usize> {
		if address_width != self.address_width || !self.selects(device_address) {
			return None;
		}
		let block = (device_address ^ self.base_address) as usize;
		let linear = match self.address_width {
			AddressWidth::One => block << 8 | (memory_address as usize & 0xff),
			AddressWidth::Two => memory_address as usize,
		};
		// address bits above the device size are ignored
		Some(linear % self.memory.len())
	}
}

impl I2cBus for SimulatedEeprom {
	fn init(&mut self) -> io::Result<()> {
		self.events.push(Event::Init);
		Ok(())
	}

	fn read(
		&mut self,
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		buffer: &mut [u8],
	) -> io::Result<usize> {
		self.events.push(Event::Read {
			device_address,
			memory_address,
			address_width,
			len: buffer.len(),
		});

		if let Some(transferred) = self.fail_next.take() {
			return Ok(std::cmp::min(transferred, buffer.len()));
		}
		if self.is_busy() {
			return Ok(0);
		}
		let start = match self.linear_address(device_address, memory_address, address_width) {
			None => return Ok(0),
			Some(a) => a,
		};

		let size = self.memory.len();
		for (i, b) in buffer.iter_mut().enumerate() {
			*b = self.memory[(start + i) % size];
		}
		Ok(buffer.len())
	}

	fn write(
		&mut self,
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		data: &[u8],
	) -> io::Result<usize> {
		self.events.push(Event::Write {
			device_address,
			memory_address,
			address_width,
			data: data.to_vec(),
		});

		if let Some(transferred) = self.fail_next.take() {
			return Ok(std::cmp::min(transferred, data.len()));
		}
		if self.is_busy() {
			return Ok(0);
		}
		let start = match self.linear_address(device_address, memory_address, address_width) {
			None => return Ok(0),
			Some(a) => a,
		};

		// page write: the address counter wraps inside the page
		let page_start = start - start % self.page_size;
		for (i, b) in data.iter().enumerate() {
			let offset = (start % self.page_size + i) % self.page_size;
			self.memory[page_start + offset] = *b;
		}
		if !data.is_empty() {
			self.busy = self.write_cycle;
		}
		Ok(data.len())
	}

	fn start(&mut self, device_address: u8, direction: Direction) -> bool {
		self.events.push(Event::Start {
			device_address,
			direction,
		});

		if self.is_busy() {
			self.busy = self.busy.saturating_sub(1);
			return false;
		}
		self.selects(device_address)
	}

	fn stop(&mut self) {
		self.events.push(Event::Stop);
	}
}
