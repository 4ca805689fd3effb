use crate::i2c::AddressWidth;

use super::DeviceVariant;

/// Geometry and bus address of one attached device.
///
/// Everything but the bus address is derived from the variant.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DeviceConfig {
	variant: DeviceVariant,
	i2c_address: u8,
	size: usize,
	page_size: usize,
	address_width: AddressWidth,
}

impl DeviceConfig {
	pub fn new(variant: DeviceVariant, i2c_address: u8) -> Self {
		DeviceConfig {
			variant,
			i2c_address,
			size: variant.size(),
			page_size: variant.page_size(),
			address_width: variant.address_width(),
		}
	}

	pub fn variant(&self) -> DeviceVariant {
		self.variant
	}

	pub fn i2c_address(&self) -> u8 {
		self.i2c_address
	}

	pub fn size(&self) -> usize {
		self.size
	}

	pub fn page_size(&self) -> usize {
		self.page_size
	}

	pub fn address_width(&self) -> AddressWidth {
		self.address_width
	}

	pub fn contains(&self, address: u16) -> bool {
		(address as usize) < self.size
	}

	// bytes from `address` up to the end of its page
	pub fn page_remaining(&self, address: u16) -> usize {
		self.page_size - (address as usize % self.page_size)
	}

	/// Device and memory address for a transfer starting at `address`.
	///
	/// Single address byte parts above 256 bytes take the upper address bits
	/// in the low bits of the device address ("block select").
	pub fn bus_target(&self, address: u16) -> (u8, u16) {
		match self.address_width {
			AddressWidth::One => (self.i2c_address | (address >> 8) as u8, address & 0xff),
			AddressWidth::Two => (self.i2c_address, address),
		}
	}
}
