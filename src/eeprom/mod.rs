//! Driver for 24Cxx serial EEPROMs (24C01 .. 24C256).
//!
//! Reads are plain random reads. Writes go out as page writes that never
//! cross a page boundary (the device would wrap around inside the page), and
//! after each one the device is "ACK polled" until it finished its internal
//! write cycle: it doesn't acknowledge its own address while busy.

use std::time::Duration;

use crate::clock::{
	Clock,
	SystemClock,
};
use crate::i2c::{
	AddressWidth,
	Direction,
	I2cBus,
};

mod config;
mod error;
mod selftest;
mod variant;

pub use self::config::DeviceConfig;
pub use self::error::{
	EepromError,
	ErrorKind,
};
pub use self::selftest::{
	read_image,
	test_device,
	test_read_write,
	write_image,
};
pub use self::variant::DeviceVariant;

pub type Result<T> = std::result::Result<T, EepromError>;

/// How long to wait for the end of a write cycle.
///
/// Polling stops after `max_attempts` probes or once `timeout` has passed,
/// whichever comes first; `interval` is slept between probes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ReadyPoll {
	pub max_attempts: u32,
	pub interval: Duration,
	pub timeout: Duration,
}

impl Default for ReadyPoll {
	// 24Cxx datasheets give 5 or 10ms maximum write cycle time
	fn default() -> Self {
		ReadyPoll {
			max_attempts: 100,
			interval: Duration::from_micros(200),
			timeout: Duration::from_millis(20),
		}
	}
}

pub struct Eeprom<B: I2cBus, C: Clock = SystemClock> {
	bus: B,
	clock: C,
	config: DeviceConfig,
	poll: ReadyPoll,
}

impl<B: I2cBus> Eeprom<B> {
	pub fn init(bus: B, variant: DeviceVariant, i2c_address: u8) -> Result<Self> {
		Eeprom::with_clock(bus, SystemClock, variant, i2c_address)
	}
}

impl<B: I2cBus, C: Clock> Eeprom<B, C> {
	pub fn with_clock(bus: B, clock: C, variant: DeviceVariant, i2c_address: u8) -> Result<Self> {
		let mut eeprom = Eeprom {
			bus,
			clock,
			config: DeviceConfig::new(variant, i2c_address),
			poll: ReadyPoll::default(),
		};
		eeprom.reinit(variant, i2c_address)?;
		Ok(eeprom)
	}

	/// Switch to another device (or variant) on the same bus.
	pub fn reinit(&mut self, variant: DeviceVariant, i2c_address: u8) -> Result<()> {
		self.config = DeviceConfig::new(variant, i2c_address);
		debug!(
			"EEPROM {} at 0x{:02x}: {} bytes, {} byte pages, {} address byte(s)",
			variant, i2c_address, self.config.size(), self.config.page_size(), self.config.address_width().bytes(),
		);
		self.bus.init()?;
		Ok(())
	}

	pub fn config(&self) -> &DeviceConfig {
		&self.config
	}

	pub fn variant(&self) -> DeviceVariant {
		self.config.variant()
	}

	pub fn i2c_address(&self) -> u8 {
		self.config.i2c_address()
	}

	pub fn size(&self) -> usize {
		self.config.size()
	}

	pub fn page_size(&self) -> usize {
		self.config.page_size()
	}

	pub fn address_width(&self) -> AddressWidth {
		self.config.address_width()
	}

	pub fn ready_poll(&self) -> ReadyPoll {
		self.poll
	}

	pub fn set_ready_poll(&mut self, poll: ReadyPoll) {
		self.poll = poll;
	}

	pub fn bus(&self) -> &B {
		&self.bus
	}

	pub fn bus_mut(&mut self) -> &mut B {
		&mut self.bus
	}

	pub fn clock(&self) -> &C {
		&self.clock
	}

	pub fn into_bus(self) -> B {
		self.bus
	}

	fn check_address(&self, address: u16) -> Result<()> {
		if !self.config.contains(address) {
			return Err(EepromError::Address {
				address,
				size: self.config.size(),
			});
		}
		Ok(())
	}

	// only call after `check_address`
	fn check_length(&self, address: u16, length: usize) -> Result<()> {
		if length > self.config.size() - address as usize {
			return Err(EepromError::Size {
				address,
				length,
				size: self.config.size(),
			});
		}
		Ok(())
	}

	fn check_transferred(expected: usize, transferred: usize) -> Result<()> {
		if transferred != expected {
			return Err(EepromError::I2c {
				expected,
				transferred,
			});
		}
		Ok(())
	}

	fn transfer_read(&mut self, address: u16, buffer: &mut [u8]) -> Result<()> {
		let (device_address, memory_address) = self.config.bus_target(address);
		let width = self.config.address_width();
		debug!("read {} byte(s) at 0x{:04x} (device 0x{:02x})", buffer.len(), address, device_address);
		let transferred = self.bus.read(device_address, memory_address, width, buffer)?;
		Self::check_transferred(buffer.len(), transferred)
	}

	fn transfer_write(&mut self, address: u16, data: &[u8]) -> Result<()> {
		let (device_address, memory_address) = self.config.bus_target(address);
		let width = self.config.address_width();
		debug!("write {} byte(s) at 0x{:04x} (device 0x{:02x})", data.len(), address, device_address);
		let transferred = self.bus.write(device_address, memory_address, width, data)?;
		Self::check_transferred(data.len(), transferred)
	}

	pub fn read_byte(&mut self, address: u16) -> Result<u8> {
		self.check_address(address)?;
		let mut data = [0u8; 1];
		self.transfer_read(address, &mut data)?;
		Ok(data[0])
	}

	pub fn write_byte(&mut self, address: u16, data: u8) -> Result<()> {
		self.check_address(address)?;
		self.transfer_write(address, &[data])?;
		self.wait_ready()?;
		Ok(())
	}

	/// Sequential read of `buffer.len()` bytes in a single transfer.
	pub fn read_bytes(&mut self, address: u16, buffer: &mut [u8]) -> Result<()> {
		self.check_address(address)?;
		self.check_length(address, buffer.len())?;
		if buffer.is_empty() {
			return Ok(());
		}
		self.transfer_read(address, buffer)
	}

	/// One page write transaction; `data` must not cross a page boundary.
	pub fn write_page(&mut self, address: u16, data: &[u8]) -> Result<()> {
		self.check_address(address)?;
		let page_size = self.config.page_size();
		if data.len() > self.config.page_remaining(address) {
			return Err(EepromError::PageSize {
				address,
				length: data.len(),
				page_size,
			});
		}
		self.check_length(address, data.len())?;
		if data.is_empty() {
			return Ok(());
		}
		self.transfer_write(address, data)?;
		self.wait_ready()?;
		Ok(())
	}

	/// Write any amount of data, split into page writes.
	pub fn write_bytes(&mut self, address: u16, data: &[u8]) -> Result<()> {
		self.check_address(address)?;
		self.check_length(address, data.len())?;

		let mut address = address;
		let mut remaining = data;
		while !remaining.is_empty() {
			let chunk_len = std::cmp::min(remaining.len(), self.config.page_remaining(address));
			let (chunk, rest) = remaining.split_at(chunk_len);
			self.transfer_write(address, chunk)?;
			// device won't accept anything before the page is committed
			self.wait_ready()?;
			remaining = rest;
			// can't overflow: checked against the device size above
			address += chunk_len as u16;
		}
		Ok(())
	}

	/// ACK poll: true if the device answers to its address, i.e. isn't busy
	/// with a write cycle.
	pub fn is_ready(&mut self) -> bool {
		let ready = self.bus.start(self.config.i2c_address(), Direction::Write);
		self.bus.stop();
		ready
	}

	/// Poll until the device is ready; returns the number of probes needed.
	pub fn wait_ready(&mut self) -> Result<u32> {
		let poll = self.poll;
		let start = self.clock.now();
		let mut attempts = 0u32;

		while attempts < poll.max_attempts {
			attempts += 1;
			if self.is_ready() {
				trace!("device ready after {} poll(s)", attempts);
				return Ok(attempts);
			}
			if attempts == poll.max_attempts
				|| self.clock.elapsed_since(start) + poll.interval > poll.timeout
			{
				break;
			}
			self.clock.sleep(poll.interval);
		}

		warn!(
			"EEPROM at 0x{:02x} still busy after {} poll(s) ({:?})",
			self.config.i2c_address(), attempts, self.clock.elapsed_since(start),
		);
		Err(EepromError::NotReady { attempts })
	}
}
