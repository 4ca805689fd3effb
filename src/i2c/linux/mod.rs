use std::io;

mod dev;

pub use self::dev::I2cDev;

use crate::i2c::I2cBus;

// "1" -> "/dev/i2c-1"; anything else is taken as a path
pub fn bus_path(bus: &str) -> String {
	match bus.parse::<u32>() {
		Ok(number) => format!("/dev/i2c-{}", number),
		Err(_) => bus.into(),
	}
}

pub fn open_bus(bus: &str) -> io::Result<impl I2cBus> {
	dev::inner_open(bus_path(bus))
}
