use std::fs;
use std::io;
use std::os::unix::io::AsRawFd;
use std::ptr;

use libc::{
	EIO,
	ENXIO,
	EREMOTEIO,
	c_ulong,
	ioctl,
};

use crate::i2c::{
	AddressWidth,
	Direction,
	I2cBus,
};

/* from <linux/i2c-dev.h> and <linux/i2c.h> */
const I2C_RDWR: c_ulong = 0x0707;
const I2C_M_RD: u16 = 0x0001;

// i2c-dev refuses messages longer than this
const MAX_MESSAGE_LEN: usize = 8192;

#[repr(C)]
struct I2cMsg {
	addr: u16,
	flags: u16,
	len: u16,
	buf: *mut u8,
}

#[repr(C)]
struct I2cRdwrIoctlData {
	msgs: *mut I2cMsg,
	nmsgs: u32,
}

// errno values the bus drivers use when the address or a data byte wasn't acknowledged
fn is_nack(e: &io::Error) -> bool {
	match e.raw_os_error() {
		Some(ENXIO) | Some(EREMOTEIO) | Some(EIO) => true,
		_ => false,
	}
}

fn check_device_address(device_address: u8) -> io::Result<()> {
	if device_address > 0x7f {
		return Err(io::Error::new(
			io::ErrorKind::InvalidInput,
			format!("I2C address must be 7-bit, got 0x{:02x}", device_address),
		));
	}
	Ok(())
}

/// Adapter node of the Linux `i2c-dev` interface.
#[derive(Debug)]
pub struct I2cDev {
	file: fs::File,
	path: String,
}

impl I2cDev {
	pub fn path(&self) -> &str {
		&self.path
	}

	// all messages are sent as one combined transaction (repeated START
	// between messages, STOP at the end)
	fn transfer(&self, msgs: &mut [I2cMsg]) -> io::Result<()> {
		let mut data = I2cRdwrIoctlData {
			msgs: msgs.as_mut_ptr(),
			nmsgs: msgs.len() as u32,
		};
		let res = unsafe {
			ioctl(self.file.as_raw_fd(), I2C_RDWR as _, &mut data as *mut I2cRdwrIoctlData)
		};
		if res < 0 {
			Err(io::Error::last_os_error())
		} else {
			Ok(())
		}
	}
}

impl I2cBus for I2cDev {
	fn read(
		&mut self,
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		buffer: &mut [u8],
	) -> io::Result<usize> {
		check_device_address(device_address)?;

		let mut done = 0usize;
		for chunk in buffer.chunks_mut(MAX_MESSAGE_LEN) {
			let mut address = address_width.encode(memory_address.wrapping_add(done as u16));
			let mut msgs = [
				I2cMsg {
					addr: device_address as u16,
					flags: 0,
					len: address_width.bytes() as u16,
					buf: address.as_mut_ptr(),
				},
				I2cMsg {
					addr: device_address as u16,
					flags: I2C_M_RD,
					len: chunk.len() as u16,
					buf: chunk.as_mut_ptr(),
				},
			];
			match self.transfer(&mut msgs) {
				Ok(()) => done += chunk.len(),
				Err(ref e) if is_nack(e) => {
					debug!("{}: read from 0x{:02x} not acknowledged: {}", self.path, device_address, e);
					break;
				},
				Err(e) => return Err(e),
			}
		}

		Ok(done)
	}

	fn write(
		&mut self,
		device_address: u8,
		memory_address: u16,
		address_width: AddressWidth,
		data: &[u8],
	) -> io::Result<usize> {
		check_device_address(device_address)?;

		let address_len = address_width.bytes();
		if address_len + data.len() > MAX_MESSAGE_LEN {
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				format!("I2C write of {} bytes too long", data.len()),
			));
		}

		let mut message = Vec::with_capacity(address_len + data.len());
		message.extend_from_slice(&address_width.encode(memory_address)[..address_len]);
		message.extend_from_slice(data);

		let mut msgs = [
			I2cMsg {
				addr: device_address as u16,
				flags: 0,
				len: message.len() as u16,
				buf: message.as_mut_ptr(),
			},
		];
		match self.transfer(&mut msgs) {
			Ok(()) => Ok(data.len()),
			Err(ref e) if is_nack(e) => {
				debug!("{}: write to 0x{:02x} not acknowledged: {}", self.path, device_address, e);
				Ok(0)
			},
			Err(e) => Err(e),
		}
	}

	fn start(&mut self, device_address: u8, direction: Direction) -> bool {
		if check_device_address(device_address).is_err() {
			return false;
		}

		// i2c-dev has no bare START; a zero-length write (or a single byte
		// read) is the smallest transaction that still needs the address ACK
		let mut byte = 0u8;
		let mut msgs = [
			match direction {
				Direction::Write => I2cMsg {
					addr: device_address as u16,
					flags: 0,
					len: 0,
					buf: ptr::null_mut(),
				},
				Direction::Read => I2cMsg {
					addr: device_address as u16,
					flags: I2C_M_RD,
					len: 1,
					buf: &mut byte,
				},
			},
		];
		match self.transfer(&mut msgs) {
			Ok(()) => true,
			Err(e) => {
				trace!("{}: probe of 0x{:02x} ({:?}) failed: {}", self.path, device_address, direction, e);
				false
			},
		}
	}

	fn stop(&mut self) {
		// the kernel already finished the probe transaction with a STOP
	}
}

// TODO: exclusive open / file locking?
pub fn inner_open(path: String) -> io::Result<I2cDev> {
	let file = fs::OpenOptions::new()
		.read(true)
		.write(true)
		.open(&path)?;

	debug!("opened I2C adapter {}", path);

	Ok(I2cDev {
		file,
		path,
	})
}
