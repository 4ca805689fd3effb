use std::io;

use failure::Fail;

/// Failure classes with the status codes the 24Cxx tools have always used.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ErrorKind {
	I2c = 0x10,
	Address = 0x11,
	Size = 0x12,
	PageSize = 0x13,
	NotReady = 0x14,
}

impl ErrorKind {
	pub fn code(self) -> u8 {
		self as u8
	}
}

#[derive(Debug, Fail)]
pub enum EepromError {
	#[fail(display = "I2C transfer incomplete: {} of {} bytes", transferred, expected)]
	I2c {
		expected: usize,
		transferred: usize,
	},

	#[fail(display = "I2C bus error: {}", _0)]
	Bus(#[cause] io::Error),

	#[fail(display = "address 0x{:04x} out of range (device has {} bytes)", address, size)]
	Address {
		address: u16,
		size: usize,
	},

	#[fail(display = "{} bytes at 0x{:04x} exceed device size of {} bytes", length, address, size)]
	Size {
		address: u16,
		length: usize,
		size: usize,
	},

	#[fail(display = "{} bytes at 0x{:04x} don't fit into a {} byte page", length, address, page_size)]
	PageSize {
		address: u16,
		length: usize,
		page_size: usize,
	},

	#[fail(display = "device still busy after {} polls", attempts)]
	NotReady {
		attempts: u32,
	},
}

impl EepromError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			EepromError::I2c { .. } | EepromError::Bus(_) => ErrorKind::I2c,
			EepromError::Address { .. } => ErrorKind::Address,
			EepromError::Size { .. } => ErrorKind::Size,
			EepromError::PageSize { .. } => ErrorKind::PageSize,
			EepromError::NotReady { .. } => ErrorKind::NotReady,
		}
	}
}

impl From<io::Error> for EepromError {
	fn from(e: io::Error) -> Self {
		EepromError::Bus(e)
	}
}
