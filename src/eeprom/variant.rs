use std::fmt;
use std::str;

use crate::i2c::AddressWidth;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DeviceVariant {
	Eeprom24C01,
	Eeprom24C02,
	Eeprom24C04,
	Eeprom24C08,
	Eeprom24C16,
	Eeprom24C32,
	Eeprom24C64,
	Eeprom24C128,
	Eeprom24C256,
}

use self::DeviceVariant::*;

impl DeviceVariant {
	pub const ALL: [DeviceVariant; 9] = [
		Eeprom24C01, Eeprom24C02, Eeprom24C04,
		Eeprom24C08, Eeprom24C16, Eeprom24C32,
		Eeprom24C64, Eeprom24C128, Eeprom24C256,
	];

	// total bytes
	pub fn size(self) -> usize {
		match self {
			Eeprom24C01 => 128,
			Eeprom24C02 => 256,
			Eeprom24C04 => 512,
			Eeprom24C08 => 1024,
			Eeprom24C16 => 2048,
			Eeprom24C32 => 4096,
			Eeprom24C64 => 8192,
			Eeprom24C128 => 16384,
			Eeprom24C256 => 32768,
		}
	}

	// largest single page write
	pub fn page_size(self) -> usize {
		match self {
			Eeprom24C01 | Eeprom24C02 => 8,
			Eeprom24C04 | Eeprom24C08 | Eeprom24C16 => 16,
			Eeprom24C32 | Eeprom24C64 => 32,
			Eeprom24C128 | Eeprom24C256 => 64,
		}
	}

	/// Parts up to 2 KiB take a single address byte (plus block select bits
	/// in the device address), bigger ones two.
	pub fn address_width(self) -> AddressWidth {
		if self.size() <= 2048 {
			AddressWidth::One
		} else {
			AddressWidth::Two
		}
	}

	fn name(self) -> &'static str {
		match self {
			Eeprom24C01 => "24C01",
			Eeprom24C02 => "24C02",
			Eeprom24C04 => "24C04",
			Eeprom24C08 => "24C08",
			Eeprom24C16 => "24C16",
			Eeprom24C32 => "24C32",
			Eeprom24C64 => "24C64",
			Eeprom24C128 => "24C128",
			Eeprom24C256 => "24C256",
		}
	}
}

impl fmt::Display for DeviceVariant {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl str::FromStr for DeviceVariant {
	type Err = ::failure::Error;

	// "24c32", "24C32", "AT24C32", "at24c32"
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let upper = s.trim().to_ascii_uppercase();
		let name = if upper.starts_with("AT") { &upper[2..] } else { &upper[..] };

		match DeviceVariant::ALL.iter().find(|v| v.name() == name) {
			Some(v) => Ok(*v),
			None => bail!("unknown EEPROM type {:?} (expected 24C01 .. 24C256)", s),
		}
	}
}
